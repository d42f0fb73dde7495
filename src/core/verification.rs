use crate::utils::error::{Result, WebhookError};
use serde::Deserialize;

/// Query string of the GET subscription handshake.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Returns the challenge to echo back, or `VerificationFailed`.
pub fn verify_subscription(query: &SubscriptionQuery, expected_token: &str) -> Result<String> {
    let subscribed = query.mode.as_deref() == Some("subscribe")
        && query.verify_token.as_deref() == Some(expected_token);

    if !subscribed {
        tracing::warn!(mode = ?query.mode, "Webhook verification failed");
        return Err(WebhookError::VerificationFailed);
    }

    tracing::info!("Webhook verified");
    Ok(query.challenge.clone().unwrap_or_default())
}
