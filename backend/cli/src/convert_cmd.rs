//! `mjml-studio convert`: one-shot conversion.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::AsyncReadExt;

use studio_core::{ConversionGateway, RenderResult, ViewMode};
use studio_editor::{render_page, EditorController};

use crate::terminal_output::{note_success, note_warn};

pub async fn run(
    gateway: Arc<dyn ConversionGateway>,
    input: &str,
    out: Option<&Path>,
    page: Option<ViewMode>,
) -> Result<()> {
    let mjml = read_input(input).await?;

    // Same reconciliation as the live editor, minus the quiet period.
    let editor = EditorController::new(gateway, Duration::ZERO, mjml.clone());
    editor.convert(&mjml);
    let snapshot = editor.settled().await;
    editor.shutdown();

    let output = match (&snapshot.result, page) {
        (RenderResult::Empty, _) => {
            note_warn("Input is empty; nothing to convert");
            return Ok(());
        }
        (RenderResult::Error { message }, _) => bail!("{message}"),
        (RenderResult::Html { .. }, Some(mode)) => render_page(&snapshot, mode),
        (RenderResult::Html { html }, None) => html.clone(),
    };

    match out {
        Some(path) => {
            tokio::fs::write(path, &output)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            note_success(&format!("Wrote {} bytes to {}", output.len(), path.display()));
        }
        None => println!("{output}"),
    }
    Ok(())
}

async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read MJML from stdin")?;
        return Ok(buf);
    }
    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {input}"))
}
