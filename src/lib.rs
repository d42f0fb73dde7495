pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::http::{router, AppState};
pub use adapters::storage::SqliteStore;
pub use config::{toml_config::TomlConfig, CliConfig, ServiceSettings};
pub use core::{server::WebhookServer, tracker::ConversationTracker};
pub use utils::error::{Result, WebhookError};
