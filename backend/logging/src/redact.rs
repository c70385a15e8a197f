//! Log Redaction Layer
//!
//! Scrubs HTTP credentials and API keys from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static AUTH_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(Basic|Bearer)\s+[a-zA-Z0-9\-\._~+/]{12,}=*").expect("auth header pattern")
});
static API_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sk-[a-zA-Z0-9_\-]{16,}").expect("api key pattern"));

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = AUTH_HEADER_RE.replace_all(input, "$1 [REDACTED]");
    API_KEY_RE
        .replace_all(&redacted, "[REDACTED_KEY]")
        .into_owned()
}
