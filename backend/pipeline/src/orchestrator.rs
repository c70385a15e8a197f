//! Pipeline orchestrator: prompt → email copy → HTML document.
//!
//! Each stage is one request/response round trip with its own loading
//! flag. A successful copy stage advances to the html stage; failures are
//! recorded as errors and leave the stage where it was.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use logging::{EventLogger, StudioEvent};
use serde::Serialize;
use studio_core::{
    CopyRequest, CopyWriter, HtmlComposer, HtmlRequest, PipelineStage, StudioError, StudioResult,
};
use tokio::sync::watch;
use tracing::{info, warn};

const EVENT_SOURCE: &str = "pipeline";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears a stage's loading flag if its request future is dropped before
/// the outcome is recorded.
struct LoadingGuard<'a> {
    pipeline: &'a Pipeline,
    stage: Option<PipelineStage>,
}

impl<'a> LoadingGuard<'a> {
    fn new(pipeline: &'a Pipeline, stage: PipelineStage) -> Self {
        Self {
            pipeline,
            stage: Some(stage),
        }
    }

    fn disarm(mut self) {
        self.stage = None;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Some(stage) = self.stage.take() {
            warn!(%stage, "Generation request cancelled");
            self.pipeline.update(|s| s.set_loading(stage, false));
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineState {
    pub stage: PipelineStage,
    pub prompt: String,
    /// Names of attached files. Contents are never read or sent.
    pub files: Vec<String>,
    pub copy: String,
    pub html: Option<String>,
    pub copy_loading: bool,
    pub html_loading: bool,
    pub error: Option<String>,
}

impl PipelineState {
    fn set_loading(&mut self, stage: PipelineStage, loading: bool) {
        match stage {
            PipelineStage::Copy => self.copy_loading = loading,
            PipelineStage::Html => self.html_loading = loading,
        }
    }
}

pub struct Pipeline {
    copy_writer: Arc<dyn CopyWriter>,
    html_composer: Arc<dyn HtmlComposer>,
    state: Mutex<PipelineState>,
    tx: watch::Sender<PipelineState>,
}

impl Pipeline {
    pub fn new(copy_writer: Arc<dyn CopyWriter>, html_composer: Arc<dyn HtmlComposer>) -> Self {
        let (tx, _rx) = watch::channel(PipelineState::default());
        Self {
            copy_writer,
            html_composer,
            state: Mutex::new(PipelineState::default()),
            tx,
        }
    }

    pub fn state(&self) -> PipelineState {
        lock(&self.state).clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.tx.subscribe()
    }

    fn update<R>(&self, f: impl FnOnce(&mut PipelineState) -> R) -> R {
        let mut state = lock(&self.state);
        let out = f(&mut state);
        self.tx.send_replace(state.clone());
        out
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        self.update(|s| s.prompt = prompt);
    }

    /// Attach a file by path; only its file name is kept.
    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        self.update(|s| s.files.push(name));
    }

    pub fn remove_file(&self, index: usize) -> Option<String> {
        self.update(|s| (index < s.files.len()).then(|| s.files.remove(index)))
    }

    /// Replace the copy, e.g. after the user edits the generated text.
    pub fn set_copy(&self, copy: impl Into<String>) {
        let copy = copy.into();
        self.update(|s| s.copy = copy);
    }

    /// Return to the copy stage, keeping everything generated so far.
    pub fn back(&self) {
        self.update(|s| s.stage = PipelineStage::Copy);
    }

    /// Stage one. On success stores the copy and advances to the html stage.
    pub async fn generate_copy(&self) -> StudioResult<String> {
        let request = self.update(|s| {
            if s.copy_loading {
                return Err(StudioError::Input("copy generation already in progress".into()));
            }
            if s.prompt.trim().is_empty() && s.files.is_empty() {
                let err = StudioError::Input("enter a prompt or attach a file".into());
                s.error = Some(err.user_message());
                return Err(err);
            }
            s.copy_loading = true;
            s.error = None;
            Ok(CopyRequest {
                prompt: s.prompt.clone(),
                files: s.files.clone(),
            })
        })?;

        info!(
            provider = %self.copy_writer.name(),
            files = request.files.len(),
            "Generating email copy"
        );
        let guard = LoadingGuard::new(self, PipelineStage::Copy);
        let outcome = self.copy_writer.write_copy(&request).await;
        guard.disarm();

        match outcome {
            Ok(generated) => {
                EventLogger::log_event(
                    EVENT_SOURCE,
                    StudioEvent::StageCompleted {
                        stage: PipelineStage::Copy.to_string(),
                        provider: generated.provider.clone(),
                        latency_ms: generated.latency_ms,
                    },
                );
                let copy = generated.copy;
                self.update(|s| {
                    s.copy_loading = false;
                    s.copy = copy.clone();
                    s.stage = PipelineStage::Html;
                });
                Ok(copy)
            }
            Err(err) => {
                self.fail(PipelineStage::Copy, &err);
                Err(err)
            }
        }
    }

    /// Stage two: turn the current copy into a complete HTML document.
    pub async fn generate_html(&self) -> StudioResult<String> {
        let request = self.update(|s| {
            if s.html_loading {
                return Err(StudioError::Input("HTML generation already in progress".into()));
            }
            if s.copy.trim().is_empty() {
                let err = StudioError::Input("generate or enter email copy first".into());
                s.error = Some(err.user_message());
                return Err(err);
            }
            s.html_loading = true;
            s.error = None;
            Ok(HtmlRequest {
                email_copy: s.copy.clone(),
            })
        })?;

        info!(provider = %self.html_composer.name(), "Generating email HTML");
        let guard = LoadingGuard::new(self, PipelineStage::Html);
        let outcome = self.html_composer.compose_html(&request).await;
        guard.disarm();

        match outcome {
            Ok(generated) => {
                EventLogger::log_event(
                    EVENT_SOURCE,
                    StudioEvent::StageCompleted {
                        stage: PipelineStage::Html.to_string(),
                        provider: generated.provider.clone(),
                        latency_ms: generated.latency_ms,
                    },
                );
                let html = generated.html;
                self.update(|s| {
                    s.html_loading = false;
                    s.html = Some(html.clone());
                });
                Ok(html)
            }
            Err(err) => {
                self.fail(PipelineStage::Html, &err);
                Err(err)
            }
        }
    }

    /// Run both stages back to back and return the HTML document.
    pub async fn run(&self) -> StudioResult<String> {
        self.generate_copy().await?;
        self.generate_html().await
    }

    fn fail(&self, stage: PipelineStage, err: &StudioError) {
        EventLogger::log_event(
            EVENT_SOURCE,
            StudioEvent::StageFailed {
                stage: stage.to_string(),
                error: err.to_string(),
            },
        );
        let message = err.user_message();
        self.update(|s| {
            s.set_loading(stage, false);
            s.error = Some(message);
        });
    }
}
