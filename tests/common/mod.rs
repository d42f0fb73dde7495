#![allow(dead_code)]

use axum::Router;
use wa_webhook::core::ConversationStore;
use wa_webhook::{router, AppState, ConversationTracker, SqliteStore};

pub const VERIFY_TOKEN: &str = "test-verify-token";
pub const APP_SECRET: &str = "test-app-secret";

pub fn test_router(max_body_bytes: usize) -> Router {
    router_with_store(SqliteStore::open_in_memory().unwrap(), max_body_bytes)
}

pub fn router_with_store<S: ConversationStore + 'static>(store: S, max_body_bytes: usize) -> Router {
    let state = AppState::new(ConversationTracker::new(store), VERIFY_TOKEN, APP_SECRET);
    router(state, max_body_bytes)
}

/// A notification in the shape WhatsApp Cloud API delivers text messages.
pub fn message_payload(messages: &[(&str, &str, &str)]) -> Vec<u8> {
    let messages: Vec<serde_json::Value> = messages
        .iter()
        .map(|(from, kind, timestamp)| {
            serde_json::json!({
                "from": from,
                "id": format!("wamid.{}.{}", from, timestamp),
                "timestamp": timestamp,
                "type": kind,
                "text": {"body": "hello"}
            })
        })
        .collect();

    serde_json::to_vec(&serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "102290129340398",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {"phone_number_id": "106540352242922"},
                    "messages": messages
                }
            }]
        }]
    }))
    .unwrap()
}
