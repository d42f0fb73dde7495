use crate::core::ConversationStore;
use crate::domain::model::{MessageOutcome, WebhookPayload};
use crate::utils::error::Result;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub messages_seen: usize,
    pub new_conversations: usize,
    pub skipped: usize,
}

/// Applies webhook notifications to a [`ConversationStore`].
pub struct ConversationTracker<S: ConversationStore> {
    store: Arc<S>,
}

impl<S: ConversationStore> Clone for ConversationTracker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ConversationStore> ConversationTracker<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn process(&self, payload: &WebhookPayload) -> Result<ProcessReport> {
        let mut report = ProcessReport::default();

        if !payload.is_whatsapp() {
            tracing::debug!(object = ?payload.object, "Ignoring non-WhatsApp notification");
            return Ok(report);
        }

        let messages = payload
            .entry
            .iter()
            .flat_map(|entry| entry.changes.iter())
            .flat_map(|change| change.value.messages.iter());

        for message in messages {
            let Some(sender_id) = message.from.as_deref() else {
                continue;
            };
            let Some(message_type) = message.message_type.as_deref().filter(|t| !t.is_empty())
            else {
                continue;
            };

            report.messages_seen += 1;

            let Some(timestamp) = message.parsed_timestamp() else {
                tracing::warn!(sender_id, timestamp = ?message.timestamp, "Skipping message with unparseable timestamp");
                report.skipped += 1;
                continue;
            };

            tracing::info!(sender_id, message_type, "Message received");

            if self.record(sender_id, timestamp)?.is_new_conversation() {
                report.new_conversations += 1;
            }
        }

        Ok(report)
    }

    fn record(&self, sender_id: &str, timestamp: i64) -> Result<MessageOutcome> {
        let outcome = self.store.record_message(sender_id, timestamp)?;

        match outcome {
            MessageOutcome::FirstContact => {
                tracing::info!(sender_id, "First message from sender, conversation opened")
            }
            MessageOutcome::Reopened => {
                tracing::info!(sender_id, "Sender wrote after close, conversation reopened")
            }
            MessageOutcome::Continued => {
                tracing::debug!(sender_id, "Message in open conversation")
            }
        }

        if outcome.is_new_conversation() {
            let total = self.store.new_conversation_count()?;
            tracing::info!(new_conversation_count = total, "New conversation counted");
        }

        Ok(outcome)
    }

    pub fn close(&self, sender_id: &str) -> Result<bool> {
        let closed = self.store.close_conversation(sender_id)?;
        if closed {
            tracing::info!(sender_id, "Conversation closed manually");
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ConversationRecord, ConversationStatus, ConversationSummary};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        conversations: Mutex<BTreeMap<String, ConversationRecord>>,
        counter: Mutex<i64>,
    }

    impl ConversationStore for MemoryStore {
        fn record_message(&self, sender_id: &str, timestamp: i64) -> Result<MessageOutcome> {
            let mut conversations = self.conversations.lock().unwrap();
            let outcome = match conversations.get(sender_id).map(|r| r.status) {
                None => MessageOutcome::FirstContact,
                Some(ConversationStatus::Closed) => MessageOutcome::Reopened,
                Some(ConversationStatus::Open) => MessageOutcome::Continued,
            };
            if outcome.is_new_conversation() {
                *self.counter.lock().unwrap() += 1;
            }
            conversations.insert(
                sender_id.to_string(),
                ConversationRecord {
                    status: ConversationStatus::Open,
                    last_update: timestamp,
                },
            );
            Ok(outcome)
        }

        fn close_conversation(&self, sender_id: &str) -> Result<bool> {
            let mut conversations = self.conversations.lock().unwrap();
            Ok(match conversations.get_mut(sender_id) {
                Some(record) => {
                    record.status = ConversationStatus::Closed;
                    true
                }
                None => false,
            })
        }

        fn new_conversation_count(&self) -> Result<i64> {
            Ok(*self.counter.lock().unwrap())
        }

        fn conversations(&self) -> Result<BTreeMap<String, ConversationRecord>> {
            Ok(self.conversations.lock().unwrap().clone())
        }

        fn summary(&self) -> Result<ConversationSummary> {
            unimplemented!("not used by tracker tests")
        }
    }

    fn payload(messages: serde_json::Value) -> WebhookPayload {
        serde_json::from_value(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [{"value": {"messages": messages}}]}]
        }))
        .unwrap()
    }

    #[test]
    fn test_first_message_opens_conversation() {
        let tracker = ConversationTracker::new(MemoryStore::default());

        let report = tracker
            .process(&payload(serde_json::json!([
                {"from": "551100", "type": "text", "timestamp": "1700000000"}
            ])))
            .unwrap();

        assert_eq!(report.messages_seen, 1);
        assert_eq!(report.new_conversations, 1);
        assert_eq!(tracker.store().new_conversation_count().unwrap(), 1);
        let conversations = tracker.store().conversations().unwrap();
        let record = &conversations["551100"];
        assert_eq!(record.status, ConversationStatus::Open);
        assert_eq!(record.last_update, 1_700_000_000);
    }

    #[test]
    fn test_follow_up_only_updates_timestamp() {
        let tracker = ConversationTracker::new(MemoryStore::default());
        let report = tracker
            .process(&payload(serde_json::json!([
                {"from": "551100", "type": "text", "timestamp": "100"},
                {"from": "551100", "type": "image", "timestamp": "200"}
            ])))
            .unwrap();

        assert_eq!(report.new_conversations, 1);
        assert_eq!(tracker.store().conversations().unwrap()["551100"].last_update, 200);
    }

    #[test]
    fn test_message_after_close_reopens() {
        let tracker = ConversationTracker::new(MemoryStore::default());
        let first = payload(serde_json::json!([{"from": "a", "type": "text", "timestamp": "1"}]));

        tracker.process(&first).unwrap();
        assert!(tracker.close("a").unwrap());
        let report = tracker.process(&first).unwrap();

        assert_eq!(report.new_conversations, 1);
        assert_eq!(tracker.store().new_conversation_count().unwrap(), 2);
    }

    #[test]
    fn test_skips_incomplete_and_bad_messages() {
        let tracker = ConversationTracker::new(MemoryStore::default());
        let report = tracker
            .process(&payload(serde_json::json!([
                {"type": "text", "timestamp": "1"},
                {"from": "a", "timestamp": "1"},
                {"from": "b", "type": "", "timestamp": "1"},
                {"from": "c", "type": "text", "timestamp": "soon"},
                {"from": "d", "type": "text", "timestamp": "5"}
            ])))
            .unwrap();

        assert_eq!(report.messages_seen, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.new_conversations, 1);
        let conversations = tracker.store().conversations().unwrap();
        assert_eq!(conversations.keys().collect::<Vec<_>>(), vec!["d"]);
    }

    #[test]
    fn test_ignores_other_objects() {
        let tracker = ConversationTracker::new(MemoryStore::default());
        let other: WebhookPayload = serde_json::from_value(serde_json::json!({
            "object": "page",
            "entry": [{"changes": [{"value": {"messages": [
                {"from": "a", "type": "text", "timestamp": "1"}
            ]}}]}]
        }))
        .unwrap();

        assert_eq!(tracker.process(&other).unwrap(), ProcessReport::default());
        assert!(tracker.store().conversations().unwrap().is_empty());
    }

    #[test]
    fn test_close_unknown_sender() {
        let tracker = ConversationTracker::new(MemoryStore::default());
        assert!(!tracker.close("ghost").unwrap());
    }
}
