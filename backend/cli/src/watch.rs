//! Feed on-disk edits of an MJML file into an editor.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use studio_editor::EditorController;

/// Keeps the file watch alive; dropping it stops watching.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for SourceWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Watch `path` and push every new version of it into `editor`.
///
/// The parent directory is watched so that editors which save by
/// replacing the file are still picked up.
pub fn watch_source(path: &Path, editor: EditorController) -> Result<SourceWatcher> {
    let target = path
        .canonicalize()
        .with_context(|| format!("Cannot watch {}", path.display()))?;
    let dir = target
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let (tx, mut rx) = mpsc::channel(100);
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Err(e) = tx.blocking_send(res) {
            error!("Failed to send file event: {:?}", e);
        }
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    info!(file = %target.display(), "Watching MJML source for changes");

    let task = tokio::spawn(async move {
        while let Some(res) = rx.recv().await {
            match res {
                Ok(event) if touches(&event, &target) => reload(&target, &editor).await,
                Ok(_) => {}
                Err(e) => warn!("Watch error: {:?}", e),
            }
        }
    });

    Ok(SourceWatcher {
        _watcher: watcher,
        task,
    })
}

/// A content change (write, create or rename) involving `target`.
fn touches(event: &Event, target: &Path) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p == target || p.file_name() == target.file_name())
}

async fn reload(path: &Path, editor: &EditorController) {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            // Mid-save the file can briefly be missing.
            debug!(error = %e, "Source not readable yet");
            return;
        }
    };
    if editor.snapshot().source.as_str() == text {
        return;
    }
    info!(bytes = text.len(), "Source changed on disk");
    editor.text_changed(text);
}
