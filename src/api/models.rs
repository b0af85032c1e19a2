use serde::{Deserialize, Serialize};

/// The part of a Bot API `Update` the bot cares about.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl Update {
    /// Text and chat id of the carried message, if it has any text.
    pub fn text_and_chat(&self) -> Option<(&str, i64)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        Some((text, message.chat.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_ignores_unknown_fields() {
        let raw = r#"{
            "update_id": 10,
            "message": {
                "message_id": 3,
                "date": 1700000000,
                "from": {"id": 5, "is_bot": false, "first_name": "A"},
                "chat": {"id": 42, "type": "private"},
                "text": "weather today"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        assert_eq!(update.text_and_chat(), Some(("weather today", 42)));
    }

    #[test]
    fn test_update_without_message() {
        let update: Update =
            serde_json::from_str(r#"{"update_id": 1, "edited_message": {}}"#).unwrap();
        assert!(update.message.is_none());
        assert_eq!(update.text_and_chat(), None);
    }
}
