//! Client for the external link-shortening service.
//!
//! One GET per URL: `{base_url}/api?api={key}&url={url}`, answered with
//! `{"status": "success", "shortenedUrl": "..."}` on success. Any other status,
//! a transport error, a timeout or an unreadable body is a failure. The
//! pipeline treats every variant of [`ShortenError`] the same way; the
//! variants only exist for logs.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ShortenError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("service rejected the request: {status} {message}")]
    Rejected { status: String, message: String },

    #[error("unreadable response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait Shortener: Send + Sync {
    /// Shorten one URL with the caller's API key. No retries.
    async fn shorten(&self, url: &str, api_key: &str) -> Result<String, ShortenError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: Option<String>,
    #[serde(rename = "shortenedUrl")]
    shortened_url: Option<String>,
    #[serde(default)]
    message: Option<serde_json::Value>,
}

pub struct HttpShortener {
    client: reqwest::Client,
    base_url: String,
}

impl HttpShortener {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ShortenError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl Shortener for HttpShortener {
    async fn shorten(&self, url: &str, api_key: &str) -> Result<String, ShortenError> {
        let endpoint = format!("{}/api", self.base_url);

        let resp = self
            .client
            .get(&endpoint)
            .query(&[("api", api_key), ("url", url)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ShortenError::Timeout
                } else {
                    ShortenError::Http(e)
                }
            })?;

        let http_status = resp.status().as_u16();
        let body: ApiResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                ShortenError::Timeout
            } else {
                ShortenError::Malformed(e.to_string())
            }
        })?;
        debug!(http_status, status = ?body.status, "shortener responded");

        match body.status.as_deref() {
            Some("success") => match body.shortened_url {
                Some(short) if !short.is_empty() => Ok(short),
                _ => Err(ShortenError::Malformed(
                    "success without shortenedUrl".to_string(),
                )),
            },
            other => Err(ShortenError::Rejected {
                status: other.unwrap_or("missing").to_string(),
                message: render_message(body.message),
            }),
        }
    }
}

/// The service reports errors as a string or a list of strings.
fn render_message(message: Option<serde_json::Value>) -> String {
    match message {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::SocketAddr;

    use axum::{extract::Query, response::IntoResponse, routing::get, Json, Router};
    use serde_json::json;

    use super::*;

    async fn fake_api(Query(params): Query<HashMap<String, String>>) -> axum::response::Response {
        let url = params.get("url").cloned().unwrap_or_default();
        match params.get("api").map(String::as_str) {
            Some("good") => Json(json!({
                "status": "success",
                "shortenedUrl": format!("short:{url}"),
            }))
            .into_response(),
            Some("empty") => Json(json!({ "status": "success" })).into_response(),
            Some("garbage") => "<html>oops</html>".into_response(),
            Some("slow") => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({ "status": "success", "shortenedUrl": "late" })).into_response()
            }
            _ => Json(json!({ "status": "error", "message": ["Invalid API token"] }))
                .into_response(),
        }
    }

    async fn spawn_fake() -> SocketAddr {
        let app = Router::new().route("/api", get(fake_api));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client(addr: SocketAddr, timeout: Duration) -> HttpShortener {
        HttpShortener::new(format!("http://{addr}/"), timeout).unwrap()
    }

    #[tokio::test]
    async fn success_returns_short_url_and_url_arrives_intact() {
        let addr = spawn_fake().await;
        let s = client(addr, Duration::from_secs(5));
        let long = "https://example.com/path?q=a b&x=1#frag";
        let short = s.shorten(long, "good").await.unwrap();
        assert_eq!(short, format!("short:{long}"));
    }

    #[tokio::test]
    async fn rejected_status_is_a_failure() {
        let addr = spawn_fake().await;
        let s = client(addr, Duration::from_secs(5));
        let err = s.shorten("https://a.com", "wrong").await.unwrap_err();
        match err {
            ShortenError::Rejected { status, message } => {
                assert_eq!(status, "error");
                assert_eq!(message, "Invalid API token");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_without_url_is_malformed() {
        let addr = spawn_fake().await;
        let s = client(addr, Duration::from_secs(5));
        let err = s.shorten("https://a.com", "empty").await.unwrap_err();
        assert!(matches!(err, ShortenError::Malformed(_)));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let addr = spawn_fake().await;
        let s = client(addr, Duration::from_secs(5));
        let err = s.shorten("https://a.com", "garbage").await.unwrap_err();
        assert!(matches!(err, ShortenError::Malformed(_)));
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let addr = spawn_fake().await;
        let s = client(addr, Duration::from_millis(200));
        let err = s.shorten("https://a.com", "slow").await.unwrap_err();
        assert!(matches!(err, ShortenError::Timeout), "got {err:?}");
    }

    #[tokio::test]
    async fn unreachable_service_is_an_http_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let s = client(addr, Duration::from_secs(2));
        assert!(s.shorten("https://a.com", "good").await.is_err());
    }

    #[test]
    fn render_message_handles_shapes() {
        assert_eq!(render_message(None), "");
        assert_eq!(render_message(Some(json!("bad"))), "bad");
        assert_eq!(render_message(Some(json!(["a", "b"]))), "a; b");
        assert_eq!(render_message(Some(json!(3))), "3");
    }
}
