//! Scripted in-process services for tests and offline runs.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use studio_core::{
    ConversionGateway, CopyRequest, CopyWriter, DraftRequest, DraftWriter, GeneratedCopy,
    GeneratedHtml, HtmlComposer, HtmlRequest, StudioError, StudioResult,
};
use tokio::sync::Mutex;

const MOCK_DRAFT: &str = "<mjml><mj-body><mj-section><mj-column><mj-text>Mock draft</mj-text></mj-column></mj-section></mj-body></mjml>";

/// One scripted gateway reply: an outcome delivered after `delay`.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub delay: Duration,
    pub outcome: Result<String, String>,
}

impl MockReply {
    pub fn ok(html: impl Into<String>) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Ok(html.into()),
        }
    }

    /// Fails with an upstream-reported error carrying `message`.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Err(message.into()),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A conversion gateway that replays scripted replies in call order and
/// records every MJML document it receives.
///
/// Once the script runs out it echoes the input wrapped in `<html>`.
/// Delays use the tokio clock, so paused-time tests control them.
pub struct MockGateway {
    script: Mutex<VecDeque<MockReply>>,
    /// `None` for long-running offline use, where nothing reads the log.
    calls: Option<Mutex<Vec<String>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::with_replies([])
    }

    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            calls: Some(Mutex::new(Vec::new())),
        }
    }

    /// An echoing gateway that keeps no call log, for `--offline` sessions.
    pub fn offline() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: None,
        }
    }

    /// Every document sent so far, in issuance order.
    pub async fn calls(&self) -> Vec<String> {
        match &self.calls {
            Some(calls) => calls.lock().await.clone(),
            None => Vec::new(),
        }
    }

    pub async fn call_count(&self) -> usize {
        match &self.calls {
            Some(calls) => calls.lock().await.len(),
            None => 0,
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversionGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, mjml: &str) -> StudioResult<String> {
        if let Some(calls) = &self.calls {
            calls.lock().await.push(mjml.to_string());
        }
        let reply = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::ok(format!("<html>{mjml}</html>")));
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.outcome.map_err(StudioError::Upstream)
    }
}

/// Canned copy/html/draft generation with request recording.
pub struct MockWriter {
    copy: Result<String, String>,
    html: Result<String, String>,
    draft: Result<String, String>,
    delay: Duration,
    copy_requests: Mutex<Vec<CopyRequest>>,
    html_requests: Mutex<Vec<HtmlRequest>>,
}

impl MockWriter {
    pub fn new() -> Self {
        Self {
            copy: Ok("Mock email copy".to_string()),
            html: Ok("<!DOCTYPE html><html><body>Mock</body></html>".to_string()),
            draft: Ok(MOCK_DRAFT.to_string()),
            delay: Duration::ZERO,
            copy_requests: Mutex::new(Vec::new()),
            html_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_copy(mut self, copy: impl Into<String>) -> Self {
        self.copy = Ok(copy.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Ok(html.into());
        self
    }

    pub fn with_draft(mut self, draft: impl Into<String>) -> Self {
        self.draft = Ok(draft.into());
        self
    }

    pub fn failing_draft(mut self, message: impl Into<String>) -> Self {
        self.draft = Err(message.into());
        self
    }

    pub fn failing_copy(mut self, message: impl Into<String>) -> Self {
        self.copy = Err(message.into());
        self
    }

    pub fn failing_html(mut self, message: impl Into<String>) -> Self {
        self.html = Err(message.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn copy_requests(&self) -> Vec<CopyRequest> {
        self.copy_requests.lock().await.clone()
    }

    pub async fn html_requests(&self) -> Vec<HtmlRequest> {
        self.html_requests.lock().await.clone()
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for MockWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CopyWriter for MockWriter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn write_copy(&self, request: &CopyRequest) -> StudioResult<GeneratedCopy> {
        self.copy_requests.lock().await.push(request.clone());
        self.pause().await;
        let copy = self.copy.clone().map_err(StudioError::Upstream)?;
        Ok(GeneratedCopy {
            copy,
            provider: "mock".to_string(),
            latency_ms: self.delay.as_millis() as u64,
        })
    }
}

#[async_trait]
impl HtmlComposer for MockWriter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn compose_html(&self, request: &HtmlRequest) -> StudioResult<GeneratedHtml> {
        self.html_requests.lock().await.push(request.clone());
        self.pause().await;
        let html = self.html.clone().map_err(StudioError::Upstream)?;
        Ok(GeneratedHtml {
            html,
            provider: "mock".to_string(),
            latency_ms: self.delay.as_millis() as u64,
        })
    }
}

#[async_trait]
impl DraftWriter for MockWriter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn write_draft(&self, request: &DraftRequest) -> StudioResult<String> {
        if request.is_empty() {
            return Err(StudioError::Input("enter a prompt or attach a PDF file".into()));
        }
        self.pause().await;
        self.draft.clone().map_err(StudioError::Upstream)
    }
}
