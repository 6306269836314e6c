pub mod db;
pub mod error;
pub mod links;
pub mod settings;

pub use error::StoreError;
pub use links::SqliteLinkLog;
pub use settings::SqliteSettingsStore;
