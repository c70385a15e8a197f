use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use studio_core::{
    CopyRequest, CopyWriter, GeneratedCopy, GeneratedHtml, HtmlComposer, HtmlRequest,
    StudioResult,
};
use tracing::debug;

use crate::http::{build_client, map_send_error, read_json, string_field};

/// Generation stages served by JSON endpoints:
/// `{prompt, files}` → `{copy}` and `{emailCopy}` → `{html}`.
pub struct EndpointWriter {
    client: Client,
    copy_url: String,
    html_url: String,
    timeout: Duration,
}

impl EndpointWriter {
    pub fn new(
        copy_url: impl Into<String>,
        html_url: impl Into<String>,
        timeout: Duration,
    ) -> StudioResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            copy_url: copy_url.into(),
            html_url: html_url.into(),
            timeout,
        })
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        field: &str,
    ) -> StudioResult<String> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout))?;
        let body = read_json(response, self.timeout).await?;
        string_field(&body, field)
    }
}

#[async_trait]
impl CopyWriter for EndpointWriter {
    fn name(&self) -> &str {
        "endpoint"
    }

    async fn write_copy(&self, request: &CopyRequest) -> StudioResult<GeneratedCopy> {
        let start = Instant::now();
        debug!(url = %self.copy_url, files = request.files.len(), "Requesting email copy");
        let copy = self.post(&self.copy_url, request, "copy").await?;
        Ok(GeneratedCopy {
            copy,
            provider: "endpoint".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl HtmlComposer for EndpointWriter {
    fn name(&self) -> &str {
        "endpoint"
    }

    async fn compose_html(&self, request: &HtmlRequest) -> StudioResult<GeneratedHtml> {
        let start = Instant::now();
        debug!(url = %self.html_url, bytes = request.email_copy.len(), "Requesting email HTML");
        let html = self.post(&self.html_url, request, "html").await?;
        Ok(GeneratedHtml {
            html,
            provider: "endpoint".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    fn router() -> Router {
        Router::new()
            .route(
                "/api/generate-copy",
                post(|Json(body): Json<Value>| async move {
                    let files: Vec<String> = body["files"]
                        .as_array()
                        .map(|a| a.iter().filter_map(|f| f.as_str().map(String::from)).collect())
                        .unwrap_or_default();
                    Json(json!({
                        "copy": format!("{} [{}]", body["prompt"].as_str().unwrap_or(""), files.join(","))
                    }))
                }),
            )
            .route(
                "/api/generate-html",
                post(|Json(body): Json<Value>| async move {
                    match body["emailCopy"].as_str() {
                        Some(copy) => (
                            StatusCode::OK,
                            Json(json!({ "html": format!("<html><body>{copy}</body></html>") })),
                        ),
                        None => (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(json!({ "error": "Failed to generate HTML" })),
                        ),
                    }
                }),
            )
    }

    #[tokio::test]
    async fn copy_stage_sends_prompt_and_file_names() {
        let base = test_server::spawn(router()).await;
        let writer = EndpointWriter::new(
            format!("{base}/api/generate-copy"),
            format!("{base}/api/generate-html"),
            Duration::from_secs(5),
        )
        .unwrap();

        let copy = writer
            .write_copy(&CopyRequest {
                prompt: "Spring sale".into(),
                files: vec!["brief.pdf".into(), "logo.png".into()],
            })
            .await
            .unwrap();
        assert_eq!(copy.copy, "Spring sale [brief.pdf,logo.png]");
        assert_eq!(copy.provider, "endpoint");
    }

    #[tokio::test]
    async fn html_stage_round_trip() {
        let base = test_server::spawn(router()).await;
        let writer = EndpointWriter::new(
            format!("{base}/api/generate-copy"),
            format!("{base}/api/generate-html"),
            Duration::from_secs(5),
        )
        .unwrap();

        let html = writer
            .compose_html(&HtmlRequest {
                email_copy: "Hello".into(),
            })
            .await
            .unwrap();
        assert_eq!(html.html, "<html><body>Hello</body></html>");
    }

    #[tokio::test]
    async fn html_stage_error_payload() {
        let router = Router::new().route(
            "/html",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to generate HTML" })),
                )
            }),
        );
        let base = test_server::spawn(router).await;
        let writer = EndpointWriter::new(
            format!("{base}/copy"),
            format!("{base}/html"),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = writer
            .compose_html(&HtmlRequest {
                email_copy: "Hello".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Failed to generate HTML");
    }
}
