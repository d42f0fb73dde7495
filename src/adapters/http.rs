//! HTTP surface of the webhook service.

use crate::core::signature::{verify_signature, SIGNATURE_HEADER};
use crate::core::tracker::ConversationTracker;
use crate::core::verification::{verify_subscription, SubscriptionQuery};
use crate::core::ConversationStore;
use crate::domain::model::{WebhookPayload, WHATSAPP_OBJECT};
use crate::utils::error::{Result, WebhookError};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub struct AppState<S: ConversationStore> {
    tracker: ConversationTracker<S>,
    verify_token: Arc<str>,
    app_secret: Arc<str>,
}

impl<S: ConversationStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            tracker: self.tracker.clone(),
            verify_token: Arc::clone(&self.verify_token),
            app_secret: Arc::clone(&self.app_secret),
        }
    }
}

impl<S: ConversationStore> AppState<S> {
    pub fn new(
        tracker: ConversationTracker<S>,
        verify_token: impl Into<Arc<str>>,
        app_secret: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            tracker,
            verify_token: verify_token.into(),
            app_secret: app_secret.into(),
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidSignature { .. } | Self::VerificationFailed => StatusCode::FORBIDDEN,
            Self::PayloadError { .. } | Self::SerializationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status.is_server_error() {
            tracing::error!(error = %self, category = ?self.category(), "Request failed");
            "internal error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router<S: ConversationStore + 'static>(state: AppState<S>, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            "/webhook",
            get(verify_webhook::<S>).post(receive_notification::<S>),
        )
        .route("/count", get(new_conversation_count::<S>))
        .route("/status", get(conversation_statuses::<S>))
        .route("/close/:sender_id", post(close_conversation::<S>))
        .route("/summary", get(summary::<S>))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// SQLite calls block, so they run off the async workers.
async fn with_tracker<S, T, F>(state: &AppState<S>, f: F) -> Result<T>
where
    S: ConversationStore + 'static,
    T: Send + 'static,
    F: FnOnce(&ConversationTracker<S>) -> Result<T> + Send + 'static,
{
    let tracker = state.tracker.clone();
    tokio::task::spawn_blocking(move || f(&tracker)).await?
}

async fn verify_webhook<S: ConversationStore + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<SubscriptionQuery>,
) -> Result<String> {
    tracing::info!(mode = ?query.mode, "Webhook verification request");
    verify_subscription(&query, &state.verify_token)
}

async fn receive_notification<S: ConversationStore + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Err(e) = verify_signature(&state.app_secret, signature, &body) {
        tracing::warn!(error = %e, "Rejected webhook notification");
        return Err(e);
    }

    let document: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| WebhookError::payload(format!("body is not valid JSON: {}", e)))?;

    // WhatsApp retries anything but 200, so from here on failures are only logged.
    let object = document.get("object").and_then(serde_json::Value::as_str);
    if object != Some(WHATSAPP_OBJECT) {
        tracing::debug!(?object, "Ignoring non-WhatsApp notification");
        return Ok(StatusCode::OK);
    }

    let payload: WebhookPayload = match serde_json::from_value(document) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable webhook payload");
            return Ok(StatusCode::OK);
        }
    };

    match with_tracker(&state, move |tracker| tracker.process(&payload)).await {
        Ok(report) => tracing::debug!(
            messages = report.messages_seen,
            new_conversations = report.new_conversations,
            skipped = report.skipped,
            "Notification processed"
        ),
        Err(e) => tracing::error!(error = %e, "Failed to process webhook payload"),
    }

    Ok(StatusCode::OK)
}

async fn new_conversation_count<S: ConversationStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<serde_json::Value>> {
    let count = with_tracker(&state, |tracker| tracker.store().new_conversation_count()).await?;
    Ok(Json(json!({ "new_conversation_count": count })))
}

async fn conversation_statuses<S: ConversationStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse> {
    let conversations = with_tracker(&state, |tracker| tracker.store().conversations()).await?;
    Ok(Json(conversations))
}

async fn close_conversation<S: ConversationStore + 'static>(
    State(state): State<AppState<S>>,
    Path(sender_id): Path<String>,
) -> Result<Response> {
    let closed = with_tracker(&state, move |tracker| tracker.close(&sender_id)).await?;

    Ok(if closed {
        (StatusCode::OK, Json(json!({ "status": "closed" }))).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "status": "not_found" }))).into_response()
    })
}

async fn summary<S: ConversationStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse> {
    let summary = with_tracker(&state, |tracker| tracker.store().summary()).await?;
    Ok(Json(summary))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
