pub mod server;
pub mod signature;
pub mod summary;
pub mod tracker;
pub mod verification;

pub use crate::domain::model::{ConversationRecord, ConversationSummary, MessageOutcome, WebhookPayload};
pub use crate::domain::ports::{ConfigProvider, ConversationStore};
pub use crate::utils::error::Result;
