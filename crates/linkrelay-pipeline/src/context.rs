//! Host interface for the pipeline.
//!
//! Implemented by the gateway's shared state and by test fixtures. Each
//! accessor hands out a port trait object so the pipeline never names a
//! concrete store, HTTP client or bot type.

use linkrelay_core::{LinkLog, SettingsStore};

use crate::outbound::Messenger;
use crate::shortener::Shortener;

pub trait PipelineContext: Send + Sync {
    fn settings(&self) -> &dyn SettingsStore;
    fn links(&self) -> &dyn LinkLog;
    fn shortener(&self) -> &dyn Shortener;
    fn messenger(&self) -> &dyn Messenger;
}
