use crate::data_models::SearchResult;
use crate::telegram::{ChatClient, SendMessage};

/// Escapes text for Telegram's HTML parse mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn format_result(result: &SearchResult) -> String {
    format!(
        "<a href=\"{}\">{}</a>\n\n",
        html_escape(&result.url),
        html_escape(&result.name)
    )
}

/// Sends one message per result. A failed send is logged and the rest still go
/// out. Returns how many were delivered.
pub async fn send_results(client: &dyn ChatClient, chat_id: i64, results: &[SearchResult]) -> usize {
    let mut delivered = 0;
    for result in results {
        let message = SendMessage::html(chat_id, format_result(result));
        match client.send_message(&message).await {
            Ok(sent) => {
                delivered += 1;
                tracing::debug!(chat_id, message_id = sent.message_id, "sent result");
            }
            Err(e) => {
                tracing::error!(chat_id, url = %result.url, "error sending result: {:#}", e);
            }
        }
    }
    delivered
}
