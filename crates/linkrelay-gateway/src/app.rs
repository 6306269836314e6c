use std::sync::Arc;

use axum::{routing::post, Router};
use tokio::sync::mpsc;

use linkrelay_core::types::InboundMessage;
use linkrelay_core::{ActivityStats, LinkLog, SettingsStore};
use linkrelay_pipeline::{HttpShortener, Messenger, PipelineContext, Shortener};
use linkrelay_store::{SqliteLinkLog, SqliteSettingsStore};
use linkrelay_telegram::TelegramMessenger;

use crate::dedup::RecentUpdates;

/// Shared state for the HTTP handlers, passed as `Arc<AppState>`.
pub struct AppState {
    pub webhook_secret: String,
    pub activity: ActivityStats,
    pub recent: RecentUpdates,
    /// Hand-off to the worker pool. Bounded; a full queue is answered with 503.
    pub queue: mpsc::Sender<InboundMessage>,
}

impl AppState {
    pub fn new(
        webhook_secret: impl Into<String>,
        queue: mpsc::Sender<InboundMessage>,
        dedup_window: usize,
    ) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            activity: ActivityStats::new(),
            recent: RecentUpdates::new(dedup_window),
            queue,
        }
    }
}

/// Everything a worker needs to process one message.
pub struct Services {
    pub settings: SqliteSettingsStore,
    pub links: SqliteLinkLog,
    pub shortener: HttpShortener,
    pub messenger: TelegramMessenger,
}

impl PipelineContext for Services {
    fn settings(&self) -> &dyn SettingsStore {
        &self.settings
    }

    fn links(&self) -> &dyn LinkLog {
        &self.links
    }

    fn shortener(&self) -> &dyn Shortener {
        &self.shortener
    }

    fn messenger(&self) -> &dyn Messenger {
        &self.messenger
    }
}

/// Assemble the Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/webhook/{secret}",
            post(crate::http::webhooks::webhook_handler),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
