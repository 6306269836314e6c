//! Storage ports consumed by the message pipeline.
//!
//! Implementations own their own consistency: every write is a single-row
//! upsert or append, so no in-process locking is needed across tasks.
//!
//! Read failures degrade to "nothing configured" in the provided methods;
//! write failures are returned so the caller can tell the user the change
//! did not take effect.

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::types::{CaptionSettings, LinkRecord, SettingField, SettingUpdate, UserSettings};

/// Per-user API credential and caption settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Raw credential lookup. Prefer [`SettingsStore::get_api_key`].
    async fn api_key(&self, user_id: i64) -> Result<Option<String>>;

    /// Upsert the user's shortening API key.
    async fn set_api_key(&self, user_id: i64, key: &str) -> Result<()>;

    /// Raw settings document lookup. Prefer [`SettingsStore::get_settings`].
    async fn settings_document(&self, user_id: i64) -> Result<Option<UserSettings>>;

    /// Upsert one field; the others are left untouched.
    async fn set_field(&self, user_id: i64, update: &SettingUpdate) -> Result<()>;

    /// Remove one field so it reads back as its default.
    async fn unset_field(&self, user_id: i64, field: SettingField) -> Result<()>;

    /// Stored API key, or `None` when absent or unreadable.
    async fn get_api_key(&self, user_id: i64) -> Option<String> {
        match self.api_key(user_id).await {
            Ok(key) => key,
            Err(e) => {
                warn!(user_id, error = %e, "api key read failed; treating as absent");
                None
            }
        }
    }

    /// Settings with defaults applied. Unreadable documents yield the defaults.
    async fn get_settings(&self, user_id: i64) -> CaptionSettings {
        match self.settings_document(user_id).await {
            Ok(doc) => CaptionSettings::resolve(doc),
            Err(e) => {
                warn!(user_id, error = %e, "settings read failed; using defaults");
                CaptionSettings::default()
            }
        }
    }
}

/// Append-only log of successful shortenings.
#[async_trait]
pub trait LinkLog: Send + Sync {
    async fn record(&self, record: &LinkRecord) -> Result<()>;

    /// Number of records written so far.
    async fn count(&self) -> Result<u64>;
}
