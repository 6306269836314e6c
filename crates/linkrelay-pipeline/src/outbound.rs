use async_trait::async_trait;
use thiserror::Error;

use linkrelay_core::types::MediaAttachment;

/// Errors produced when a reply cannot be delivered.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("send timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Outbound side of the messaging platform.
///
/// Both operations are fire-and-forget for the pipeline: a failure is logged
/// by the caller and never retried.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a plain text message to `chat_id`.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError>;

    /// Resend an attachment by file id, optionally with a caption.
    async fn send_media(
        &self,
        chat_id: i64,
        media: &MediaAttachment,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError>;
}
