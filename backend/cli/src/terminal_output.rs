//! Terminal notes for one-shot commands.
//!
//! Results go to stdout; notes about them go to stderr so output can be
//! piped.

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

fn note(color: &str, symbol: &str, tag: &str, msg: &str) -> String {
    if supports_color() {
        format!("{color}{BOLD}{symbol}{RESET} {msg}")
    } else {
        format!("{tag}: {msg}")
    }
}

pub fn note_info(msg: &str) {
    eprintln!("{}", note(CYAN, "ℹ", "INFO", msg));
}

pub fn note_warn(msg: &str) {
    eprintln!("{}", note(YELLOW, "⚠", "WARN", msg));
}

pub fn note_error(msg: &str) {
    eprintln!("{}", note(RED, "✗", "ERROR", msg));
}

pub fn note_success(msg: &str) {
    eprintln!("{}", note(GREEN, "✓", "OK", msg));
}

/// A section heading followed by a rule, for multi-part output.
pub fn heading(title: &str) -> String {
    let rule = "-".repeat(title.chars().count());
    if supports_color() {
        format!("{BOLD}{title}{RESET}\n{rule}")
    } else {
        format!("{title}\n{rule}")
    }
}
