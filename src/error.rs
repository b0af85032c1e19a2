/// Everything that can go wrong between receiving a message and replying to it.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Missing or invalid startup configuration. Fatal.
    #[error("config error: {0}")]
    Config(String),

    /// The search request could not be built or completed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The fetched document could not be read or parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A reply could not be delivered to the chat platform.
    #[error("send error: {0}")]
    Send(String),

    /// The Bot API answered with `ok: false`.
    #[error("telegram api error {code}: {description}")]
    Api { code: i64, description: String },
}

pub type Result<T> = std::result::Result<T, BotError>;

impl From<reqwest::Error> for BotError {
    fn from(e: reqwest::Error) -> Self {
        BotError::Transport(e.to_string())
    }
}
