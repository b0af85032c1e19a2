#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use searchbot::api::models::{Chat, Message, Update, User};
use searchbot::error::{BotError, Result};
use searchbot::telegram::{ChatClient, SendMessage, WebhookInfo};

pub const RESULTS_HTML: &str = include_str!("../fixtures/results.html");

/// In-memory chat platform that records everything the bot sends.
#[derive(Default)]
pub struct FakeChatClient {
    sent: Mutex<Vec<SendMessage>>,
    failing_sends: Mutex<HashSet<usize>>,
    send_calls: AtomicUsize,
    update_batches: Mutex<VecDeque<Result<Vec<Update>>>>,
    requested_offsets: Mutex<Vec<i64>>,
    webhook: Mutex<Option<String>>,
}

impl FakeChatClient {
    pub fn new() -> FakeChatClient {
        FakeChatClient::default()
    }

    /// Makes the `n`-th send (0-based) fail.
    pub fn fail_send(&self, n: usize) {
        self.failing_sends.lock().unwrap().insert(n);
    }

    pub fn push_updates(&self, batch: Result<Vec<Update>>) {
        self.update_batches.lock().unwrap().push_back(batch);
    }

    pub fn sent(&self) -> Vec<SendMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn requested_offsets(&self) -> Vec<i64> {
        self.requested_offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn get_me(&self) -> Result<User> {
        Ok(User {
            id: 1,
            is_bot: true,
            first_name: "search".to_string(),
            username: Some("search_bot".to_string()),
        })
    }

    async fn send_message(&self, message: &SendMessage) -> Result<Message> {
        let n = self.send_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_sends.lock().unwrap().contains(&n) {
            return Err(BotError::Send(format!("send #{n} refused")));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(Message {
            message_id: n as i64 + 100,
            chat: Chat { id: message.chat_id },
            text: Some(message.text.clone()),
        })
    }

    async fn get_updates(&self, offset: i64, _timeout_secs: u64) -> Result<Vec<Update>> {
        self.requested_offsets.lock().unwrap().push(offset);
        let next = self.update_batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok(vec![])
            }
        }
    }

    async fn set_webhook(&self, url: &str) -> Result<()> {
        *self.webhook.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn delete_webhook(&self) -> Result<()> {
        *self.webhook.lock().unwrap() = None;
        Ok(())
    }

    async fn get_webhook_info(&self) -> Result<WebhookInfo> {
        Ok(WebhookInfo {
            url: self.webhook.lock().unwrap().clone().unwrap_or_default(),
            pending_update_count: 0,
            last_error_message: None,
        })
    }
}

pub fn text_update(update_id: i64, chat_id: i64, text: &str) -> Update {
    Update {
        update_id,
        message: Some(Message {
            message_id: update_id * 10,
            chat: Chat { id: chat_id },
            text: Some(text.to_string()),
        }),
    }
}

/// Search url template pointing at a mock server.
pub fn search_template(base: &str) -> String {
    format!("{base}/search?q=&oe=utf-8&ie=utf-8")
}
