//! Preview rendering.
//!
//! The rendered email is only ever shown inside an `<iframe sandbox="">`
//! fed through `srcdoc`: no scripts, no forms, no same-origin access to the
//! hosting page. Source view and error messages are always escaped text.

use studio_core::{EditorSnapshot, RenderResult, ViewMode};

pub const PLACEHOLDER: &str = "Start typing MJML to see the rendered email.";

/// Policy for pages hosting a preview. The host page itself runs no script.
pub const CONTENT_SECURITY_POLICY: &str =
    "script-src 'none'; object-src 'none'; base-uri 'none'; form-action 'none'";

/// Escape text for use between tags.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for use inside a double- or single-quoted attribute.
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 4);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Show `html` rendered inside an isolated, non-scriptable frame.
pub fn render_preview(html: &str) -> String {
    format!(
        r#"<iframe class="preview-frame" title="Email preview" sandbox="" referrerpolicy="no-referrer" srcdoc="{}"></iframe>"#,
        escape_attr(html)
    )
}

/// Show `html` as literal source text.
pub fn render_source(html: &str) -> String {
    format!(r#"<pre class="source"><code>{}</code></pre>"#, escape_html(html))
}

/// Body fragment for `result` in `mode`.
///
/// Errors and the empty state look the same in both modes; only HTML
/// results depend on the mode.
pub fn render(result: &RenderResult, mode: ViewMode) -> String {
    match result {
        RenderResult::Empty => format!(r#"<div class="placeholder">{PLACEHOLDER}</div>"#),
        RenderResult::Error { message } => format!(
            r#"<pre class="source error" role="alert">{}</pre>"#,
            escape_html(message)
        ),
        RenderResult::Html { html } => match mode {
            ViewMode::Preview => render_preview(html),
            ViewMode::Code => render_source(html),
        },
    }
}

fn tab(mode: ViewMode, active: ViewMode) -> String {
    let label = match mode {
        ViewMode::Preview => "Preview",
        ViewMode::Code => "HTML Code",
    };
    let class = if mode == active { "tab active" } else { "tab" };
    format!(r#"<a class="{class}" href="?view={}">{label}</a>"#, mode.as_str())
}

const PAGE_STYLE: &str = "body{font-family:system-ui,sans-serif;margin:20px;color:#222}\
.tabs{display:flex;gap:8px;margin-bottom:12px}\
.tab{padding:6px 14px;border:1px solid #ccc;border-radius:4px;text-decoration:none;color:#0070f3}\
.tab.active{background:#0070f3;color:#fff}\
.status{font-size:12px;color:#666;margin-left:auto;align-self:center}\
.preview-frame{width:100%;min-height:600px;border:1px solid #ddd;background:#fff}\
.source{white-space:pre-wrap;background:#f6f8fa;padding:12px;border-radius:4px;overflow:auto}\
.error{color:#b00020}\
.placeholder{padding:40px;text-align:center;color:#888;border:1px dashed #ccc}";

/// A complete standalone page: view toggle, status line, and the body.
///
/// Pure in `(snapshot, mode)`: switching modes only re-renders.
pub fn render_page(snapshot: &EditorSnapshot, mode: ViewMode) -> String {
    let status = if snapshot.loading {
        "Converting…"
    } else if snapshot.pending {
        "Waiting for typing to pause…"
    } else {
        ""
    };
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta http-equiv=\"Content-Security-Policy\" content=\"{csp}\">\n\
<title>MJML Preview</title>\n<style>{PAGE_STYLE}</style>\n</head>\n<body>\n\
<nav class=\"tabs\">{preview}{code}<span class=\"status\">{status}</span></nav>\n\
<main data-view=\"{mode}\">{body}</main>\n</body>\n</html>\n",
        csp = CONTENT_SECURITY_POLICY,
        preview = tab(ViewMode::Preview, mode),
        code = tab(ViewMode::Code, mode),
        mode = mode.as_str(),
        body = render(&snapshot.result, mode),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use studio_core::SourceDocument;

    fn snapshot(result: RenderResult) -> EditorSnapshot {
        EditorSnapshot {
            source: SourceDocument::new("<mjml/>"),
            result,
            loading: false,
            pending: false,
            seq: 1,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn preview_is_sandboxed_srcdoc() {
        let out = render_preview(r#"<p class="x">Tom's <b>deal</b> & more</p>"#);
        assert!(out.contains(r#"sandbox="""#));
        assert!(out.contains("srcdoc=\"&lt;p class=&quot;x&quot;&gt;Tom&#39;s"));
        assert!(!out.contains("<p class"));
    }

    #[test]
    fn preview_neutralises_script_breakout() {
        let out = render_preview(r#""></iframe><script>alert(1)</script>"#);
        assert!(!out.contains("<script>"));
        assert!(!out.contains(r#""></iframe><"#));
    }

    #[test]
    fn code_mode_shows_literal_markup() {
        let html = "<table><tr><td>Hi</td></tr></table>";
        let out = render(&RenderResult::html(html), ViewMode::Code);
        assert_eq!(
            out,
            r#"<pre class="source"><code>&lt;table&gt;&lt;tr&gt;&lt;td&gt;Hi&lt;/td&gt;&lt;/tr&gt;&lt;/table&gt;</code></pre>"#
        );
    }

    #[test]
    fn errors_are_never_interpreted_as_markup() {
        let result = RenderResult::error("<mj-text> must be inside <mj-column>");
        for mode in [ViewMode::Preview, ViewMode::Code] {
            let out = render(&result, mode);
            assert!(out.contains("&lt;mj-text&gt;"));
            assert!(!out.contains("<iframe"));
        }
    }

    #[test]
    fn empty_shows_placeholder() {
        let out = render(&RenderResult::Empty, ViewMode::Preview);
        assert!(out.contains(PLACEHOLDER));
        assert_eq!(out, render(&RenderResult::Empty, ViewMode::Code));
    }

    #[test]
    fn page_toggle_reflects_mode() {
        let snap = snapshot(RenderResult::html("<table>Hi</table>"));
        let preview = render_page(&snap, ViewMode::Preview);
        let code = render_page(&snap, ViewMode::Code);

        assert!(preview.contains(r#"<a class="tab active" href="?view=preview">"#));
        assert!(preview.contains("srcdoc=\"&lt;table&gt;Hi&lt;/table&gt;\""));
        assert!(code.contains(r#"<a class="tab active" href="?view=code">"#));
        assert!(code.contains("<code>&lt;table&gt;Hi&lt;/table&gt;</code>"));
        assert!(preview.contains(CONTENT_SECURITY_POLICY));
    }

    #[test]
    fn page_shows_loading_status() {
        let mut snap = snapshot(RenderResult::Empty);
        snap.loading = true;
        assert!(render_page(&snap, ViewMode::Preview).contains("Converting…"));
    }
}
