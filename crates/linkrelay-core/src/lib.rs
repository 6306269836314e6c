pub mod activity;
pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use activity::ActivityStats;
pub use config::LinkrelayConfig;
pub use error::{LinkrelayError, Result};
pub use store::{LinkLog, SettingsStore};
