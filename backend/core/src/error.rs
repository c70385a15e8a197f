use std::time::Duration;

use thiserror::Error;

/// Error taxonomy for every remote round trip made by mjml-studio.
///
/// Blank input is not an error: callers map it to `RenderResult::Empty`
/// before any request is issued. `Input` covers the pipeline's "nothing
/// to send" case, which is reported to the user.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Structured `{ "error": ... }` payload reported by the service.
    #[error("{0}")]
    Upstream(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StudioError {
    /// The string shown to the user in place of a result.
    ///
    /// Messages reported by the service (error payloads, including those on
    /// a non-2xx status) are passed through verbatim; everything else gets
    /// the formatted variant message.
    pub fn user_message(&self) -> String {
        match self {
            StudioError::Upstream(message) | StudioError::Status { message, .. } => {
                message.clone()
            }
            StudioError::Malformed(_) => "Unexpected response from the server".to_string(),
            other => other.to_string(),
        }
    }

    /// True for failures that happened before a response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, StudioError::Transport(_) | StudioError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_is_verbatim() {
        let err = StudioError::Upstream("Invalid MJML: missing <mj-body>".into());
        assert_eq!(err.user_message(), "Invalid MJML: missing <mj-body>");
    }

    #[test]
    fn malformed_is_generic_for_users() {
        let err = StudioError::Malformed("expected value at line 1 column 1".into());
        assert_eq!(err.user_message(), "Unexpected response from the server");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn timeout_counts_as_transport() {
        let err = StudioError::Timeout(Duration::from_millis(1500));
        assert!(err.is_transport());
        assert_eq!(err.user_message(), "request timed out after 1500ms");
        assert!(!StudioError::Status { status: 500, message: "x".into() }.is_transport());
    }

    #[test]
    fn status_message_is_shown_but_logged_with_code() {
        let err = StudioError::Status {
            status: 401,
            message: "Unauthorized".into(),
        };
        assert_eq!(err.user_message(), "Unauthorized");
        assert_eq!(err.to_string(), "upstream returned 401: Unauthorized");
    }
}
