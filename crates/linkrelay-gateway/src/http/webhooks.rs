//! Webhook ingress endpoint: POST /webhook/{secret}.
//!
//! Telegram posts one `Update` per request. The handler only validates and
//! enqueues; processing happens on the worker pool so the platform gets its
//! answer quickly. Any non-2xx answer makes Telegram retry the delivery.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use linkrelay_telegram::WebhookUpdate;

use crate::app::AppState;

type HandlerResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// POST /webhook/{secret}
///
/// 404 on a wrong secret, 400 on an unreadable body, 503 when the worker
/// queue is full, otherwise 200.
pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    Path(secret): Path<String>,
    body: Bytes,
) -> HandlerResult {
    if !secret_matches(&secret, &state.webhook_secret) {
        warn!("webhook called with an unknown secret");
        return Err((StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))));
    }

    state.activity.record_request();

    let update: WebhookUpdate = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, bytes = body.len(), "invalid JSON in webhook body");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid JSON body"})),
        )
    })?;

    let update_id = update.update_id;
    if let Some(id) = update_id {
        if !state.recent.insert(id) {
            debug!(update_id = id, "duplicate delivery ignored");
            return Ok(Json(json!({"ok": true})));
        }
    }

    let Some(msg) = update.into_inbound() else {
        debug!(?update_id, "update carries nothing to process");
        return Ok(Json(json!({"ok": true})));
    };

    match state.queue.try_send(msg) {
        Ok(()) => Ok(Json(json!({"ok": true}))),
        Err(e) => {
            if let Some(id) = update_id {
                state.recent.forget(id);
            }
            let reason = match e {
                TrySendError::Full(_) => "worker queue full",
                TrySendError::Closed(_) => "worker pool stopped",
            };
            warn!(?update_id, reason, "webhook rejected; platform will retry");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": reason})),
            ))
        }
    }
}

/// Constant-time comparison of the path secret.
fn secret_matches(given: &str, expected: &str) -> bool {
    use subtle::ConstantTimeEq;
    given.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use linkrelay_core::types::InboundMessage;

    use crate::app::{build_router, AppState};

    use super::*;

    const SECRET: &str = "s3cret";

    fn state(capacity: usize) -> (Arc<AppState>, mpsc::Receiver<InboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Arc::new(AppState::new(SECRET, tx, 16)), rx)
    }

    async fn post(state: &Arc<AppState>, path: &str, body: &str) -> (StatusCode, Value) {
        let resp = build_router(Arc::clone(state))
            .oneshot(
                Request::post(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn text_update(update_id: i64, text: &str) -> String {
        json!({
            "update_id": update_id,
            "message": {
                "chat": { "id": 42 },
                "from": { "id": 7, "is_bot": false, "first_name": "Asha" },
                "text": text
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn valid_update_is_queued() {
        let (state, mut rx) = state(4);
        let (status, body) = post(&state, "/webhook/s3cret", &text_update(1, "https://a.com")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
        let msg = rx.try_recv().unwrap();
        assert_eq!(msg.chat_id, 42);
        assert_eq!(msg.user_id, 7);
        assert_eq!(msg.text.as_deref(), Some("https://a.com"));
        assert_eq!(state.activity.request_count(), 1);
        assert!(state.activity.last_activity().is_some());
    }

    #[tokio::test]
    async fn wrong_secret_is_not_found_and_not_counted() {
        let (state, mut rx) = state(4);
        let (status, _) = post(&state, "/webhook/guess", &text_update(1, "x")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(rx.try_recv().is_err());
        assert_eq!(state.activity.request_count(), 0);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (state, _rx) = state(4);
        let (status, body) = post(&state, "/webhook/s3cret", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid JSON body");
        assert_eq!(state.activity.request_count(), 1);
    }

    #[tokio::test]
    async fn update_without_message_is_acknowledged() {
        let (state, mut rx) = state(4);
        let (status, _) = post(&state, "/webhook/s3cret", r#"{"update_id": 9}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn redelivered_update_is_processed_once() {
        let (state, mut rx) = state(4);
        let body = text_update(77, "https://a.com");
        assert_eq!(post(&state, "/webhook/s3cret", &body).await.0, StatusCode::OK);
        assert_eq!(post(&state, "/webhook/s3cret", &body).await.0, StatusCode::OK);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        assert_eq!(state.activity.request_count(), 2);
    }

    #[tokio::test]
    async fn full_queue_asks_for_a_retry_that_is_then_accepted() {
        let (state, mut rx) = state(1);
        assert_eq!(
            post(&state, "/webhook/s3cret", &text_update(1, "a")).await.0,
            StatusCode::OK
        );

        let (status, body) = post(&state, "/webhook/s3cret", &text_update(2, "b")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "worker queue full");

        // Drain, then the redelivery of update 2 goes through.
        rx.try_recv().unwrap();
        assert_eq!(
            post(&state, "/webhook/s3cret", &text_update(2, "b")).await.0,
            StatusCode::OK
        );
        assert_eq!(rx.try_recv().unwrap().text.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn stopped_worker_pool_is_unavailable() {
        let (state, rx) = state(4);
        drop(rx);
        let (status, _) = post(&state, "/webhook/s3cret", &text_update(1, "a")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn secret_comparison_requires_an_exact_match() {
        assert!(secret_matches("s3cret", "s3cret"));
        assert!(!secret_matches("s3cre", "s3cret"));
        assert!(!secret_matches("s3cret!", "s3cret"));
        assert!(!secret_matches("", "s3cret"));
    }

    #[tokio::test]
    async fn get_is_not_allowed() {
        let (state, _rx) = state(4);
        let resp = build_router(state)
            .oneshot(Request::get("/webhook/s3cret").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
