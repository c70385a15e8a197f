//! Seed the editor with an MJML draft generated from a prompt and an
//! optional PDF brief.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tracing::{error, info};

use studio_core::{Attachment, DraftRequest, DraftWriter};
use studio_editor::EditorController;

/// Build a draft request, reading the PDF (if any) into memory.
pub async fn load_request(prompt: Option<String>, pdf: Option<&Path>) -> Result<DraftRequest> {
    let pdf = match pdf {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.pdf".to_string());
            Some(Attachment { file_name, bytes })
        }
        None => None,
    };
    let request = DraftRequest {
        prompt: prompt.unwrap_or_default(),
        pdf,
    };
    if request.is_empty() {
        bail!("--from-prompt needs a prompt or a --pdf brief");
    }
    Ok(request)
}

/// Generate the draft in the background and hand it to the editor as a
/// regular edit. A failed draft leaves the editor untouched.
pub fn spawn_seed(
    writer: Arc<dyn DraftWriter>,
    request: DraftRequest,
    editor: EditorController,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            provider = %writer.name(),
            pdf = request.pdf.as_ref().map(|a| a.file_name.as_str()),
            "Generating MJML draft"
        );
        match writer.write_draft(&request).await {
            Ok(mjml) => {
                info!(bytes = mjml.len(), "MJML draft ready");
                editor.text_changed(mjml);
            }
            Err(e) => error!(error = %e, "Failed to generate MJML draft"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use studio_core::RenderResult;
    use studio_providers::{MockGateway, MockWriter};

    fn editor(gateway: Arc<MockGateway>) -> EditorController {
        EditorController::new(gateway, Duration::from_millis(10), "")
    }

    #[tokio::test]
    async fn pdf_is_read_with_its_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brief.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let request = load_request(None, Some(&path)).await.unwrap();
        let pdf = request.pdf.unwrap();
        assert_eq!(pdf.file_name, "brief.pdf");
        assert_eq!(pdf.bytes, b"%PDF-1.4");
        assert!(request.prompt.is_empty());
    }

    #[tokio::test]
    async fn missing_pdf_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.pdf");
        let err = load_request(Some("hi".into()), Some(&path)).await.unwrap_err();
        assert!(format!("{err:#}").contains("absent.pdf"));
    }

    #[tokio::test]
    async fn blank_request_is_rejected() {
        assert!(load_request(Some(String::new()), None).await.is_err());
    }

    #[tokio::test]
    async fn draft_is_converted_like_an_edit() {
        let gateway = Arc::new(MockGateway::new());
        let controller = editor(gateway.clone());
        let writer = Arc::new(MockWriter::new().with_draft("<mjml>draft</mjml>"));
        let request = load_request(Some("Spring sale".into()), None).await.unwrap();

        spawn_seed(writer, request, controller.clone()).await.unwrap();
        let snapshot = controller.settled().await;

        assert_eq!(snapshot.result, RenderResult::html("<html><mjml>draft</mjml></html>"));
        assert_eq!(gateway.calls().await, vec!["<mjml>draft</mjml>"]);
    }

    #[tokio::test]
    async fn failed_draft_leaves_editor_empty() {
        let gateway = Arc::new(MockGateway::new());
        let controller = editor(gateway.clone());
        let writer = Arc::new(MockWriter::new().failing_draft("No response text found"));
        let request = load_request(Some("Spring sale".into()), None).await.unwrap();

        spawn_seed(writer, request, controller.clone()).await.unwrap();

        assert_eq!(controller.snapshot().result, RenderResult::Empty);
        assert_eq!(gateway.call_count().await, 0);
    }
}
