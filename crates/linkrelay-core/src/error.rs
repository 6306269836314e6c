use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkrelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type Result<T> = std::result::Result<T, LinkrelayError>;
