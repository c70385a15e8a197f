use std::future::pending;

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use studio_core::{EditorSnapshot, ViewMode};
use studio_editor::preview::CONTENT_SECURITY_POLICY;
use studio_editor::{render_page, EditorController};

/// Shared application state for preview handlers.
#[derive(Clone)]
pub struct AppState {
    pub editor: EditorController,
}

/// Build the preview router. Every response forbids script execution.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page))
        .route("/api/health", get(health))
        .route("/api/state", get(get_state))
        .route("/api/source", post(post_source))
        .route("/api/convert", post(post_convert))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Serve the preview until Ctrl-C, then shut the editor down.
pub async fn serve(addr: &str, editor: EditorController) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Preview server listening");

    let app = build_router(AppState { editor: editor.clone() });
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(editor))
        .await?;

    info!("Preview server stopped");
    Ok(())
}

async fn shutdown_signal(editor: EditorController) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; running until killed");
        pending::<()>().await;
    }
    info!("Shutting down");
    editor.shutdown();
}

#[derive(Debug, Deserialize)]
struct ViewQuery {
    view: Option<String>,
}

/// The preview page for the current result.
async fn page(State(state): State<AppState>, Query(query): Query<ViewQuery>) -> Response {
    let mode = match query.view.as_deref().map(str::parse::<ViewMode>) {
        None => ViewMode::default(),
        Some(Ok(mode)) => mode,
        Some(Err(message)) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };
    Html(render_page(&state.editor.snapshot(), mode)).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "mjml-studio",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn get_state(State(state): State<AppState>) -> Json<EditorSnapshot> {
    Json(state.editor.snapshot())
}

#[derive(Debug, Deserialize)]
struct SourceBody {
    mjml: String,
}

/// Replace the document; conversion follows once typing pauses.
async fn post_source(
    State(state): State<AppState>,
    Json(body): Json<SourceBody>,
) -> (StatusCode, Json<Value>) {
    if state.editor.is_shut_down() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "editor is shut down" })),
        );
    }
    state.editor.text_changed(body.mjml);
    let snapshot = state.editor.snapshot();
    (
        StatusCode::ACCEPTED,
        Json(json!({ "pending": snapshot.pending, "seq": snapshot.seq })),
    )
}

#[derive(Debug, Default, Deserialize)]
struct ConvertBody {
    mjml: Option<String>,
}

/// Convert right away (the given document, or the current one) and return
/// the settled snapshot.
async fn post_convert(
    State(state): State<AppState>,
    Json(body): Json<ConvertBody>,
) -> Json<EditorSnapshot> {
    match body.mjml {
        Some(mjml) => state.editor.convert(&mjml),
        None => state.editor.convert_now(),
    }
    Json(state.editor.settled().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use studio_core::RenderResult;
    use studio_providers::{MockGateway, MockReply};

    async fn spawn(editor: EditorController) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(AppState { editor });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn editor(gateway: MockGateway) -> EditorController {
        EditorController::new(Arc::new(gateway), Duration::from_millis(20), "")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let base = spawn(editor(MockGateway::new())).await;
        let body: Value = reqwest::get(format!("{base}/api/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "mjml-studio");
    }

    #[tokio::test]
    async fn page_sets_csp_and_placeholder() {
        let base = spawn(editor(MockGateway::new())).await;
        let resp = reqwest::get(format!("{base}/")).await.unwrap();
        assert_eq!(
            resp.headers()[header::CONTENT_SECURITY_POLICY],
            CONTENT_SECURITY_POLICY
        );
        let text = resp.text().await.unwrap();
        assert!(text.contains(studio_editor::preview::PLACEHOLDER));
    }

    #[tokio::test]
    async fn unknown_view_is_rejected() {
        let base = spawn(editor(MockGateway::new())).await;
        let resp = reqwest::get(format!("{base}/?view=split")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn source_then_settle_renders_html() {
        let controller = editor(MockGateway::new());
        let base = spawn(controller.clone()).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/api/source"))
            .json(&json!({ "mjml": "<mjml>hi</mjml>" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::ACCEPTED);

        let snapshot = controller.settled().await;
        assert_eq!(snapshot.result, RenderResult::html("<html><mjml>hi</mjml></html>"));

        let code = reqwest::get(format!("{base}/?view=code"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(code.contains("&lt;html&gt;&lt;mjml&gt;hi"));
    }

    #[tokio::test]
    async fn convert_returns_settled_error() {
        let gateway = MockGateway::with_replies([MockReply::err("Invalid MJML")]);
        let base = spawn(editor(gateway)).await;
        let snapshot: EditorSnapshot = reqwest::Client::new()
            .post(format!("{base}/api/convert"))
            .json(&json!({ "mjml": "<mjml>" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(snapshot.result, RenderResult::error("Invalid MJML"));
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn switching_views_reuses_the_last_result() {
        let gateway = Arc::new(MockGateway::new());
        let controller = EditorController::new(gateway.clone(), Duration::from_millis(20), "");
        let base = spawn(controller).await;

        let snapshot: EditorSnapshot = reqwest::Client::new()
            .post(format!("{base}/api/convert"))
            .json(&json!({ "mjml": "<mjml>toggle</mjml>" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(snapshot.result, RenderResult::html("<html><mjml>toggle</mjml></html>"));
        assert_eq!(gateway.call_count().await, 1);

        for view in ["code", "preview", "code", "preview"] {
            let resp = reqwest::get(format!("{base}/?view={view}")).await.unwrap();
            assert_eq!(resp.status(), reqwest::StatusCode::OK);
        }
        assert_eq!(gateway.call_count().await, 1);
    }

    #[tokio::test]
    async fn source_after_shutdown_is_refused() {
        let controller = editor(MockGateway::new());
        let base = spawn(controller.clone()).await;
        controller.shutdown();
        let resp = reqwest::Client::new()
            .post(format!("{base}/api/source"))
            .json(&json!({ "mjml": "<mjml/>" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    }
}
