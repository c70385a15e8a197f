use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use studio_core::{ConversionGateway, StudioResult};
use tracing::debug;

use crate::http::{build_client, map_send_error, read_json, string_field};

/// MJML → HTML conversion over HTTP.
///
/// Speaks `{ "mjml": ... }` → `{ "html": ... }`, which both the hosted
/// render API and the application's own conversion endpoint accept.
/// Credentials, when present, are sent as Basic auth (`app_id:api_key`).
pub struct MjmlGateway {
    client: Client,
    endpoint: String,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl MjmlGateway {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> StudioResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
            credentials: None,
            timeout,
        })
    }

    pub fn with_credentials(mut self, app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.credentials = Some((app_id.into(), api_key.into()));
        self
    }
}

#[derive(Serialize)]
struct RenderRequest<'a> {
    mjml: &'a str,
}

#[async_trait]
impl ConversionGateway for MjmlGateway {
    fn name(&self) -> &str {
        "mjml"
    }

    async fn convert(&self, mjml: &str) -> StudioResult<String> {
        let start = Instant::now();
        debug!(endpoint = %self.endpoint, bytes = mjml.len(), "Sending MJML for conversion");

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&RenderRequest { mjml });
        if let Some((app_id, api_key)) = &self.credentials {
            request = request.basic_auth(app_id, Some(api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout))?;
        let body = read_json(response, self.timeout).await?;

        if let Some(warnings) = body.get("errors").and_then(|e| e.as_array()) {
            if !warnings.is_empty() {
                debug!(count = warnings.len(), "MJML compiled with validation warnings");
            }
        }

        let html = string_field(&body, "html")?;
        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            bytes = html.len(),
            "MJML conversion succeeded"
        );
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use studio_core::StudioError;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn converts_and_sends_basic_auth() {
        let router = Router::new().route(
            "/v1/render",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if auth != "Basic YXBwOmtleQ==" {
                    return (StatusCode::UNAUTHORIZED, Json(json!({"message": "bad auth"})));
                }
                let mjml = body["mjml"].as_str().unwrap_or_default().to_string();
                (
                    StatusCode::OK,
                    Json(json!({"html": format!("<table>{}</table>", mjml.len()), "errors": []})),
                )
            }),
        );
        let base = test_server::spawn(router).await;

        let gateway = MjmlGateway::new(format!("{base}/v1/render"), TIMEOUT)
            .unwrap()
            .with_credentials("app", "key");
        let html = gateway.convert("<mjml></mjml>").await.unwrap();
        assert_eq!(html, "<table>13</table>");
    }

    #[tokio::test]
    async fn structured_error_is_verbatim() {
        let router = Router::new().route(
            "/api/mjml",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Malformed MJML: unclosed <mj-body>"})),
                )
            }),
        );
        let base = test_server::spawn(router).await;

        let gateway = MjmlGateway::new(format!("{base}/api/mjml"), TIMEOUT).unwrap();
        let err = gateway.convert("<mjml>").await.unwrap_err();
        assert!(matches!(err, StudioError::Status { status: 500, .. }));
        assert_eq!(err.user_message(), "Malformed MJML: unclosed <mj-body>");
    }

    #[tokio::test]
    async fn unauthorized_status_carries_payload_message() {
        let router = Router::new().route(
            "/v1/render",
            post(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"}))) }),
        );
        let base = test_server::spawn(router).await;

        let gateway = MjmlGateway::new(format!("{base}/v1/render"), TIMEOUT).unwrap();
        let err = gateway.convert("<mjml/>").await.unwrap_err();
        assert!(matches!(
            err,
            StudioError::Status { status: 401, ref message } if message == "Unauthorized"
        ));
        assert_eq!(err.user_message(), "Unauthorized");
    }

    #[tokio::test]
    async fn bare_error_status() {
        let router = Router::new().route("/render", post(|| async { StatusCode::BAD_GATEWAY }));
        let base = test_server::spawn(router).await;

        let gateway = MjmlGateway::new(format!("{base}/render"), TIMEOUT).unwrap();
        let err = gateway.convert("<mjml/>").await.unwrap_err();
        assert!(matches!(err, StudioError::Status { status: 502, .. }));
        assert_eq!(err.user_message(), "request failed with status 502 (Bad Gateway)");
    }

    #[tokio::test]
    async fn error_payload_on_success_status_wins_over_html() {
        let router = Router::new().route(
            "/render",
            post(|| async { Json(json!({"html": "<p>stale</p>", "error": "compile failed"})) }),
        );
        let base = test_server::spawn(router).await;

        let gateway = MjmlGateway::new(format!("{base}/render"), TIMEOUT).unwrap();
        let err = gateway.convert("<mjml/>").await.unwrap_err();
        assert_eq!(err.user_message(), "compile failed");
    }

    #[tokio::test]
    async fn non_json_success_is_malformed() {
        let router = Router::new().route("/render", post(|| async { "<html>not json</html>" }));
        let base = test_server::spawn(router).await;

        let gateway = MjmlGateway::new(format!("{base}/render"), TIMEOUT).unwrap();
        let err = gateway.convert("<mjml/>").await.unwrap_err();
        assert!(matches!(err, StudioError::Malformed(_)));
    }

    #[tokio::test]
    async fn slow_gateway_times_out() {
        let router = Router::new().route(
            "/render",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"html": "<p>late</p>"}))
            }),
        );
        let base = test_server::spawn(router).await;

        let timeout = Duration::from_millis(100);
        let gateway = MjmlGateway::new(format!("{base}/render"), timeout).unwrap();
        let err = gateway.convert("<mjml/>").await.unwrap_err();
        assert!(matches!(err, StudioError::Timeout(t) if t == timeout));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gateway = MjmlGateway::new(format!("http://{addr}/render"), TIMEOUT).unwrap();
        let err = gateway.convert("<mjml/>").await.unwrap_err();
        assert!(err.is_transport());
    }
}
