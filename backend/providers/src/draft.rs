use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use studio_core::{DraftRequest, DraftWriter, StudioError, StudioResult};
use tracing::debug;

use crate::http::{build_client, map_send_error, read_json};

/// Starter drafts from a generation endpoint that takes a multipart
/// `prompt` / `pdfFile` form and answers with a Gemini-style
/// `generateContent` reply.
pub struct DraftEndpoint {
    client: Client,
    url: String,
    timeout: Duration,
}

impl DraftEndpoint {
    pub fn new(url: impl Into<String>, timeout: Duration) -> StudioResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
            timeout,
        })
    }

    fn form(request: &DraftRequest) -> StudioResult<Form> {
        let mut form = Form::new().text("prompt", request.prompt.clone());
        if let Some(pdf) = &request.pdf {
            let part = Part::bytes(pdf.bytes.clone())
                .file_name(pdf.file_name.clone())
                .mime_str("application/pdf")
                .map_err(|e| StudioError::Other(e.into()))?;
            form = form.part("pdfFile", part);
        }
        Ok(form)
    }
}

/// Text of the first candidate: `candidates[0].content.parts[0].text`.
pub fn candidate_text(body: &Value) -> StudioResult<String> {
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StudioError::Malformed("No response text found".into()))
}

#[async_trait]
impl DraftWriter for DraftEndpoint {
    fn name(&self) -> &str {
        "endpoint"
    }

    async fn write_draft(&self, request: &DraftRequest) -> StudioResult<String> {
        if request.is_empty() {
            return Err(StudioError::Input(
                "enter a prompt or attach a PDF file".into(),
            ));
        }
        let start = Instant::now();
        debug!(
            url = %self.url,
            pdf = request.pdf.as_ref().map(|p| p.file_name.as_str()),
            "Requesting MJML draft"
        );

        let response = self
            .client
            .post(&self.url)
            .multipart(Self::form(request)?)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout))?;
        let body = read_json(response, self.timeout).await?;
        let text = candidate_text(&body)?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            bytes = text.len(),
            "MJML draft received"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;
    use axum::{extract::Multipart, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use studio_core::Attachment;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn reply(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    /// Echoes the prompt and the uploaded file name and size back as MJML.
    fn echo_router() -> Router {
        Router::new().route(
            "/api/generate",
            post(|mut multipart: Multipart| async move {
                let mut prompt = String::new();
                let mut upload = String::from("none");
                while let Some(field) = multipart.next_field().await.unwrap() {
                    let name = field.name().map(str::to_string);
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    match name.as_deref() {
                        Some("prompt") => prompt = field.text().await.unwrap(),
                        Some("pdfFile") => {
                            let bytes = field.bytes().await.unwrap();
                            upload = format!(
                                "{}:{}:{}",
                                file_name.unwrap_or_default(),
                                content_type.unwrap_or_default(),
                                bytes.len()
                            );
                        }
                        _ => {}
                    }
                }
                Json(reply(&format!("<mjml>{prompt}|{upload}</mjml>")))
            }),
        )
    }

    #[tokio::test]
    async fn sends_prompt_and_pdf_as_multipart() {
        let base = test_server::spawn(echo_router()).await;
        let writer = DraftEndpoint::new(format!("{base}/api/generate"), TIMEOUT).unwrap();

        let draft = writer
            .write_draft(&DraftRequest {
                prompt: "Quarterly newsletter".into(),
                pdf: Some(Attachment {
                    file_name: "report.pdf".into(),
                    bytes: b"%PDF-1.4 test".to_vec(),
                }),
            })
            .await
            .unwrap();
        assert_eq!(
            draft,
            "<mjml>Quarterly newsletter|report.pdf:application/pdf:13</mjml>"
        );
    }

    #[tokio::test]
    async fn prompt_only_sends_no_file_part() {
        let base = test_server::spawn(echo_router()).await;
        let writer = DraftEndpoint::new(format!("{base}/api/generate"), TIMEOUT).unwrap();

        let draft = writer
            .write_draft(&DraftRequest {
                prompt: "Welcome email".into(),
                pdf: None,
            })
            .await
            .unwrap();
        assert_eq!(draft, "<mjml>Welcome email|none</mjml>");
    }

    #[tokio::test]
    async fn empty_request_is_rejected_before_sending() {
        // Nothing listens here; an attempted send would be a transport error.
        let writer = DraftEndpoint::new("http://127.0.0.1:1/api/generate", TIMEOUT).unwrap();
        let err = writer.write_draft(&DraftRequest::default()).await.unwrap_err();
        assert!(matches!(err, StudioError::Input(_)));
    }

    #[tokio::test]
    async fn error_field_is_surfaced() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "No prompt or PDF file provided." })),
                )
            }),
        );
        let base = test_server::spawn(router).await;
        let writer = DraftEndpoint::new(format!("{base}/api/generate"), TIMEOUT).unwrap();

        let err = writer
            .write_draft(&DraftRequest {
                prompt: "x".into(),
                pdf: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Status { status: 400, .. }));
        assert_eq!(err.user_message(), "No prompt or PDF file provided.");
    }

    #[test]
    fn missing_candidate_is_malformed() {
        assert_eq!(candidate_text(&reply("<mjml/>")).unwrap(), "<mjml/>");
        assert!(matches!(
            candidate_text(&json!({ "candidates": [] })),
            Err(StudioError::Malformed(_))
        ));
    }
}
