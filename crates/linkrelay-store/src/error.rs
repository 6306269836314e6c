use thiserror::Error;

use linkrelay_core::LinkrelayError;

/// Storage-layer errors. Converted to `LinkrelayError::Database` at the
/// port boundary so the pipeline never sees rusqlite types.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A previous holder of the connection panicked mid-statement.
    #[error("connection lock poisoned")]
    Poisoned,
}

impl From<StoreError> for LinkrelayError {
    fn from(e: StoreError) -> Self {
        LinkrelayError::Database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
