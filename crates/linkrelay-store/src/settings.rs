use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, warn};

use linkrelay_core::types::{CaptionMode, SettingField, SettingUpdate, UserSettings};
use linkrelay_core::SettingsStore;

use crate::error::{Result, StoreError};

/// SQLite-backed credential and settings store.
///
/// Every write is a single-row upsert keyed by `user_id`; concurrent writers
/// to different fields of the same user never clobber each other.
pub struct SqliteSettingsStore {
    db: Mutex<Connection>,
}

fn column(field: SettingField) -> &'static str {
    match field {
        SettingField::Header => "header",
        SettingField::Footer => "footer",
        SettingField::CaptionMode => "caption_mode",
    }
}

impl SqliteSettingsStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn load_api_key(&self, user_id: i64) -> Result<Option<String>> {
        let db = self.conn()?;
        let key = db
            .query_row(
                "SELECT api_key FROM user_api_keys WHERE user_id = ?1",
                rusqlite::params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(key)
    }

    pub fn store_api_key(&self, user_id: i64, key: &str) -> Result<()> {
        let db = self.conn()?;
        let now = chrono::Utc::now().to_rfc3339();
        db.execute(
            "INSERT INTO user_api_keys (user_id, api_key, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                api_key = excluded.api_key,
                updated_at = excluded.updated_at",
            rusqlite::params![user_id, key, now],
        )?;
        debug!(user_id, "api key stored");
        Ok(())
    }

    pub fn load_settings(&self, user_id: i64) -> Result<Option<UserSettings>> {
        let db = self.conn()?;
        let row: Option<(Option<String>, Option<String>, Option<String>)> = db
            .query_row(
                "SELECT header, footer, caption_mode FROM user_settings WHERE user_id = ?1",
                rusqlite::params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        Ok(row.map(|(header, footer, mode)| {
            let caption_mode = mode.and_then(|m| match m.parse::<CaptionMode>() {
                Ok(mode) => Some(mode),
                Err(e) => {
                    warn!(user_id, error = %e, "ignoring unreadable caption_mode");
                    None
                }
            });
            UserSettings {
                header,
                footer,
                caption_mode,
            }
        }))
    }

    pub fn store_field(&self, user_id: i64, update: &SettingUpdate) -> Result<()> {
        let col = column(update.field());
        let db = self.conn()?;
        let now = chrono::Utc::now().to_rfc3339();
        db.execute(
            &format!(
                "INSERT INTO user_settings (user_id, {col}, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                    {col} = excluded.{col},
                    updated_at = excluded.updated_at"
            ),
            rusqlite::params![user_id, update.value(), now],
        )?;
        debug!(user_id, field = col, "setting stored");
        Ok(())
    }

    pub fn clear_field(&self, user_id: i64, field: SettingField) -> Result<()> {
        let col = column(field);
        let db = self.conn()?;
        let now = chrono::Utc::now().to_rfc3339();
        db.execute(
            &format!("UPDATE user_settings SET {col} = NULL, updated_at = ?2 WHERE user_id = ?1"),
            rusqlite::params![user_id, now],
        )?;
        debug!(user_id, field = col, "setting cleared");
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn api_key(&self, user_id: i64) -> linkrelay_core::Result<Option<String>> {
        Ok(self.load_api_key(user_id)?)
    }

    async fn set_api_key(&self, user_id: i64, key: &str) -> linkrelay_core::Result<()> {
        Ok(self.store_api_key(user_id, key)?)
    }

    async fn settings_document(
        &self,
        user_id: i64,
    ) -> linkrelay_core::Result<Option<UserSettings>> {
        Ok(self.load_settings(user_id)?)
    }

    async fn set_field(&self, user_id: i64, update: &SettingUpdate) -> linkrelay_core::Result<()> {
        Ok(self.store_field(user_id, update)?)
    }

    async fn unset_field(&self, user_id: i64, field: SettingField) -> linkrelay_core::Result<()> {
        Ok(self.clear_field(user_id, field)?)
    }
}
