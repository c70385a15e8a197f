use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use studio_core::{
    CopyRequest, CopyWriter, GeneratedCopy, GeneratedHtml, HtmlComposer, HtmlRequest,
    StudioError, StudioResult,
};
use tracing::debug;

use crate::http::{build_client, map_send_error, read_json};

const COPY_SYSTEM_PROMPT: &str = "You are an expert email copywriter. Create compelling, \
professional email copy based on the user's prompt.";

const HTML_SYSTEM_PROMPT: &str = "You are an expert email HTML developer. Create responsive, \
well-structured HTML email templates based on the provided copy.";

/// Both generation stages against an OpenAI-compatible chat completions API.
pub struct OpenAiWriter {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiWriter {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> StudioResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn complete(&self, system: &str, user: String) -> StudioResult<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
        };

        debug!(model = %self.model, "Sending request to OpenAI");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout))?;
        let value = read_json(response, self.timeout).await?;

        let chat: ChatResponse =
            serde_json::from_value(value).map_err(|e| StudioError::Malformed(e.to_string()))?;
        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| StudioError::Malformed("completion has no content".into()))
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

fn copy_prompt(request: &CopyRequest) -> String {
    let mut prompt = format!(
        "Create email copy based on the following prompt:\n{}\n",
        request.prompt.trim()
    );
    if !request.files.is_empty() {
        prompt.push_str(&format!(
            "\nConsider the following files: {}\n",
            request.files.join(", ")
        ));
    }
    prompt.push_str("\nThe copy should be professional, engaging, and optimized for email marketing.");
    prompt
}

fn html_prompt(request: &HtmlRequest) -> String {
    format!(
        "Convert the following email copy into a responsive HTML email template:\n\n{}\n\n\
The HTML should:\n\
1. Be responsive and work well on mobile devices\n\
2. Use a clean, professional design\n\
3. Include proper email HTML best practices (tables, inline CSS, etc.)\n\
4. Have a header, content section, and footer\n\
5. Include unsubscribe link in the footer\n\n\
Return only the complete HTML code.",
        request.email_copy.trim()
    )
}

/// Strip a surrounding Markdown code fence (```html ... ```), if any.
pub fn unwrap_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "html") on the opening fence line.
    match body.split_once('\n') {
        Some((_info, code)) => code.trim(),
        None => body.trim(),
    }
}

#[async_trait]
impl CopyWriter for OpenAiWriter {
    fn name(&self) -> &str {
        "openai"
    }

    async fn write_copy(&self, request: &CopyRequest) -> StudioResult<GeneratedCopy> {
        let start = Instant::now();
        let copy = self.complete(COPY_SYSTEM_PROMPT, copy_prompt(request)).await?;
        Ok(GeneratedCopy {
            copy: copy.trim().to_string(),
            provider: "openai".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl HtmlComposer for OpenAiWriter {
    fn name(&self) -> &str {
        "openai"
    }

    async fn compose_html(&self, request: &HtmlRequest) -> StudioResult<GeneratedHtml> {
        let start = Instant::now();
        let content = self.complete(HTML_SYSTEM_PROMPT, html_prompt(request)).await?;
        Ok(GeneratedHtml {
            html: unwrap_code_fence(&content).to_string(),
            provider: "openai".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn copy_prompt_lists_file_names_only() {
        let prompt = copy_prompt(&CopyRequest {
            prompt: "Launch our app".into(),
            files: vec!["deck.pdf".into(), "notes.txt".into()],
        });
        assert!(prompt.contains("Launch our app"));
        assert!(prompt.contains("Consider the following files: deck.pdf, notes.txt"));

        let prompt = copy_prompt(&CopyRequest {
            prompt: "Launch".into(),
            files: vec![],
        });
        assert!(!prompt.contains("Consider the following files"));
    }

    #[test]
    fn html_prompt_requests_unsubscribe_footer() {
        let prompt = html_prompt(&HtmlRequest {
            email_copy: "Hi there".into(),
        });
        assert!(prompt.contains("Hi there"));
        assert!(prompt.contains("unsubscribe link"));
    }

    #[test]
    fn unwraps_fenced_html() {
        assert_eq!(
            unwrap_code_fence("```html\n<!DOCTYPE html><p>x</p>\n```"),
            "<!DOCTYPE html><p>x</p>"
        );
        assert_eq!(unwrap_code_fence("  <p>plain</p>\n"), "<p>plain</p>");
        assert_eq!(unwrap_code_fence("```\n<p>x</p>```"), "<p>x</p>");
    }

    #[tokio::test]
    async fn completes_through_chat_api() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer sk-test");
                if !authorized {
                    return (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}})),
                    );
                }
                let system = body["messages"][0]["content"].as_str().unwrap_or_default();
                let content = if system.contains("HTML developer") {
                    "```html\n<html>ok</html>\n```"
                } else {
                    "Spring is here!"
                };
                (
                    StatusCode::OK,
                    Json(json!({"choices": [{"message": {"role": "assistant", "content": content}}]})),
                )
            }),
        );
        let base = test_server::spawn(router).await;

        let writer = OpenAiWriter::new("sk-test", "gpt-4o", Duration::from_secs(5))
            .unwrap()
            .with_base_url(format!("{base}/v1/"));
        let copy = writer
            .write_copy(&CopyRequest {
                prompt: "Spring sale".into(),
                files: vec![],
            })
            .await
            .unwrap();
        assert_eq!(copy.copy, "Spring is here!");

        let html = writer
            .compose_html(&HtmlRequest {
                email_copy: copy.copy,
            })
            .await
            .unwrap();
        assert_eq!(html.html, "<html>ok</html>");

        let bad = OpenAiWriter::new("sk-wrong", "gpt-4o", Duration::from_secs(5))
            .unwrap()
            .with_base_url(format!("{base}/v1"));
        let err = bad
            .write_copy(&CopyRequest {
                prompt: "x".into(),
                files: vec![],
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Incorrect API key provided");
    }
}
