use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::Connection;

use linkrelay_core::types::LinkRecord;
use linkrelay_core::LinkLog;

use crate::error::{Result, StoreError};

/// Append-only shortening log. Rows are never updated or deleted.
pub struct SqliteLinkLog {
    db: Mutex<Connection>,
}

impl SqliteLinkLog {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn append(&self, record: &LinkRecord) -> Result<i64> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO links (long_url, short_url, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                record.long_url,
                record.short_url,
                record.created_at.to_rfc3339()
            ],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn total(&self) -> Result<u64> {
        let db = self.conn()?;
        let n: i64 = db.query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    /// Most recent records, newest first.
    #[cfg(test)]
    fn recent(&self, limit: usize) -> Result<Vec<LinkRecord>> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT long_url, short_url, created_at FROM links ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![limit as i64], |row| {
                let created: String = row.get(2)?;
                let created_at = chrono::DateTime::parse_from_rfc3339(&created)
                    .map(|t| t.with_timezone(&chrono::Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            2,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                Ok(LinkRecord {
                    long_url: row.get(0)?,
                    short_url: row.get(1)?,
                    created_at,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[async_trait]
impl LinkLog for SqliteLinkLog {
    async fn record(&self, record: &LinkRecord) -> linkrelay_core::Result<()> {
        self.append(record)?;
        Ok(())
    }

    async fn count(&self) -> linkrelay_core::Result<u64> {
        Ok(self.total()?)
    }
}
