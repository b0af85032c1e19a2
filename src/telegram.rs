use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::models::{Message, Update, User};
use crate::error::{BotError, Result};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
}

/// Body of a `sendMessage` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
}

impl SendMessage {
    pub fn new(chat_id: i64, text: impl Into<String>) -> SendMessage {
        SendMessage {
            chat_id,
            text: text.into(),
            parse_mode: None,
            disable_web_page_preview: None,
        }
    }

    pub fn html(chat_id: i64, text: impl Into<String>) -> SendMessage {
        SendMessage {
            parse_mode: Some(ParseMode::Html),
            ..SendMessage::new(chat_id, text)
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WebhookInfo {
    pub url: String,
    #[serde(default)]
    pub pending_update_count: i64,
    #[serde(default)]
    pub last_error_message: Option<String>,
}

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// What the bot needs from a chat platform.
///
/// Kept narrow so the pipeline can run against an in-memory fake.
/// Implementations must be safe to share between workers.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Identity of the bot; used at startup to validate the token.
    async fn get_me(&self) -> Result<User>;

    async fn send_message(&self, message: &SendMessage) -> Result<Message>;

    /// Long poll for updates with `update_id >= offset`.
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>>;

    async fn set_webhook(&self, url: &str) -> Result<()>;

    async fn delete_webhook(&self) -> Result<()>;

    async fn get_webhook_info(&self) -> Result<WebhookInfo>;
}

/// Bot API client over HTTPS.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<TelegramClient> {
        Self::with_api_url(token, DEFAULT_API_URL)
    }

    pub fn with_api_url(token: &str, api_url: &str) -> Result<TelegramClient> {
        if token.trim().is_empty() {
            return Err(BotError::Config("telegram token is empty".to_string()));
        }
        Url::parse(api_url)
            .map_err(|e| BotError::Config(format!("invalid telegram api url {api_url}: {e}")))?;
        Ok(TelegramClient {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> Result<Url> {
        let raw = format!("{}/bot{}/{}", self.api_url, self.token, method);
        Url::parse(&raw).map_err(|e| BotError::Config(format!("cannot build url for {method}: {e}")))
    }

    async fn call<T, B>(&self, method: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.method_url(method)?;
        let res = self.http.post(url).json(body).send().await?;
        // The Bot API reports failures in the body with a non-2xx status, so
        // the envelope is decoded regardless of status.
        let envelope: ApiResponse<T> = res.json().await?;
        if !envelope.ok {
            return Err(BotError::Api {
                code: envelope.error_code.unwrap_or_default(),
                description: envelope.description.unwrap_or_default(),
            });
        }
        envelope
            .result
            .ok_or_else(|| BotError::Parse(format!("{method}: response has no result")))
    }
}

#[async_trait]
impl ChatClient for TelegramClient {
    async fn get_me(&self) -> Result<User> {
        self.call("getMe", &json!({})).await
    }

    async fn send_message(&self, message: &SendMessage) -> Result<Message> {
        self.call("sendMessage", message)
            .await
            .map_err(|e| match e {
                BotError::Transport(msg) => BotError::Send(msg),
                other => other,
            })
    }

    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({ "offset": offset, "timeout": timeout_secs, "allowed_updates": ["message"] }),
        )
        .await
    }

    async fn set_webhook(&self, url: &str) -> Result<()> {
        let _: bool = self.call("setWebhook", &json!({ "url": url })).await?;
        Ok(())
    }

    async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self.call("deleteWebhook", &json!({})).await?;
        Ok(())
    }

    async fn get_webhook_info(&self) -> Result<WebhookInfo> {
        self.call("getWebhookInfo", &json!({})).await
    }
}
