//! Telegram Bot API glue: webhook payload parsing and outbound delivery.

pub mod error;
pub mod send;
pub mod wire;

pub use error::TelegramError;
pub use send::TelegramMessenger;
pub use wire::WebhookUpdate;
