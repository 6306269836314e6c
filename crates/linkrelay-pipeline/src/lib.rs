//! Message-processing pipeline: command dispatch, link extraction,
//! shortening and caption composition.
//!
//! Hosts (the webhook gateway, tests) provide a [`PipelineContext`] and call
//! [`process_message`] once per inbound message.

pub mod command;
pub mod compose;
pub mod context;
pub mod dispatch;
pub mod extract;
pub mod outbound;
pub mod shortener;

pub use command::Command;
pub use compose::compose;
pub use context::PipelineContext;
pub use dispatch::{process_message, Outcome};
pub use extract::extract_urls;
pub use outbound::{DeliveryError, Messenger};
pub use shortener::{HttpShortener, ShortenError, Shortener};
