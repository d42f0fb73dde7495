use crate::domain::model::{ConversationRecord, ConversationSummary, MessageOutcome};
use crate::utils::error::Result;
use std::collections::BTreeMap;

pub trait ConversationStore: Send + Sync {
    /// Registers an inbound message and reports whether it opened a new
    /// conversation. The status change and counter increment are atomic.
    fn record_message(&self, sender_id: &str, timestamp: i64) -> Result<MessageOutcome>;

    /// Returns `false` when the sender has never been seen.
    fn close_conversation(&self, sender_id: &str) -> Result<bool>;

    fn new_conversation_count(&self) -> Result<i64>;

    fn conversations(&self) -> Result<BTreeMap<String, ConversationRecord>>;

    fn summary(&self) -> Result<ConversationSummary>;
}

pub trait ConfigProvider: Send + Sync {
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    fn database_path(&self) -> &str;
    fn verify_token(&self) -> Option<&str>;
    fn app_secret(&self) -> Option<&str>;
    fn max_body_bytes(&self) -> usize;
}
