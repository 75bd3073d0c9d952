//! Pass-through relay to the football-data API.
//!
//! The browser cannot hold the API token, so it sends the full upstream URL
//! here and the relay forwards it with `X-Auth-Token` attached. Status and
//! JSON body are mirrored verbatim. No retries and no rate limiting.

use anyhow::Context;
use axum::http::StatusCode;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::football_data::client::AUTH_HEADER;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Missing url param")]
    MissingParameter,

    #[error("Proxy error: {0}")]
    Transport(String),

    #[error("Proxy error: upstream body is not JSON: {0}")]
    InvalidBody(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingParameter => StatusCode::BAD_REQUEST,
            ProxyError::Transport(_) | ProxyError::InvalidBody(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Clone)]
pub struct ProxyRelay {
    http: Client,
    token: String,
}

impl ProxyRelay {
    pub fn new(token: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ProxyRelay {
            http,
            token: token.to_string(),
        })
    }

    /// Forward one GET to `target` and return the upstream status and body.
    pub async fn relay(
        &self,
        target: Option<&str>,
    ) -> Result<(StatusCode, serde_json::Value), ProxyError> {
        let target = match target {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Err(ProxyError::MissingParameter),
        };

        debug!("Relaying {}", target);
        let resp = self
            .http
            .get(target)
            .header(AUTH_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| {
                warn!("Relay to {} failed: {}", target, e);
                ProxyError::Transport(e.to_string())
            })?;

        let status = StatusCode::from_u16(resp.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let body = resp.json::<serde_json::Value>().await.map_err(|e| {
            warn!("Relay to {} returned a non-JSON body: {}", target, e);
            ProxyError::InvalidBody(e.to_string())
        })?;

        Ok((status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port_url, spawn_upstream};
    use axum::{http::HeaderMap, routing::get, Json, Router};
    use serde_json::json;

    fn relay() -> ProxyRelay {
        ProxyRelay::new("token-123", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_missing_url_is_client_error() {
        let err = relay().relay(None).await.unwrap_err();
        assert!(matches!(err, ProxyError::MissingParameter));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing url param");

        let err = relay().relay(Some("  ")).await.unwrap_err();
        assert!(matches!(err, ProxyError::MissingParameter));
    }

    #[tokio::test]
    async fn test_mirrors_upstream_status_and_body() {
        let app = Router::new()
            .route(
                "/ok",
                get(|headers: HeaderMap| async move {
                    let token = headers
                        .get(AUTH_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    Json(json!({ "token": token, "matches": [] }))
                }),
            )
            .route(
                "/limited",
                get(|| async {
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        Json(json!({ "message": "rate limited", "errorCode": 429 })),
                    )
                }),
            );
        let base = spawn_upstream(app).await;

        let (status, body) = relay().relay(Some(&format!("{}/ok", base))).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "token": "token-123", "matches": [] }));

        let (status, body) = relay()
            .relay(Some(&format!("{}/limited", base)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["errorCode"], 429);
    }

    #[tokio::test]
    async fn test_transport_failure_is_internal_error() {
        let target = format!("{}/never", closed_port_url().await);
        let err = relay().relay(Some(&target)).await.unwrap_err();
        assert!(matches!(err, ProxyError::Transport(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_non_json_body_is_internal_error() {
        let app = Router::new().route("/html", get(|| async { "<html></html>" }));
        let base = spawn_upstream(app).await;
        let err = relay()
            .relay(Some(&format!("{}/html", base)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::InvalidBody(_)));
    }
}
