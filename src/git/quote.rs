//! Shell quoting for values embedded in a git command line.
//!
//! git is always spawned without a shell, one argv entry per value. Quoting
//! is applied when a command is rendered as text (logs, error messages), so
//! that pasting the rendered line into a POSIX shell reproduces the exact
//! argv, including values with spaces, quotes, `;`, backticks or `$`.

use std::fmt;

/// Return `value` as a single POSIX-shell token.
///
/// Values made only of `[A-Za-z0-9_@%+=:,./-]` are returned unchanged. Anything
/// else is wrapped in single quotes, with embedded single quotes written as
/// `'"'"'`. The empty string becomes `''`.
pub fn quote(value: impl fmt::Display) -> String {
    let value = value.to_string();
    if value.is_empty() {
        return "''".to_owned();
    }
    if value.chars().all(is_safe) {
        return value;
    }
    format!("'{}'", value.replace('\'', r#"'"'"'"#))
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}
