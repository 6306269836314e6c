/// Errors produced while setting up the Telegram client.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("invalid Bot API url {url}: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("no bot token configured")]
    NoToken,
}
