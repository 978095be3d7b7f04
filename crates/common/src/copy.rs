//! Event copy printed on every pass unless a record carries its own.

pub const DEFAULT_MESSAGE: &str = "This is your moment. Step into it with open hands and a ready heart.";

pub const DEFAULT_VERSE_REFERENCE: &str = "Ecclesiastes 3:1";

pub const DEFAULT_VERSE_TEXT: &str =
    "To every thing there is a season, and a time to every purpose under the heaven.";

/// Returns `value` trimmed, or `fallback` when it is missing or blank.
pub fn or_default(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}
