//! crates/mneme/src/utils.rs
//! Small helpers shared across modules

use std::path::Path;

/// Truncate `s` to at most `max_bytes`, backing off to a char boundary.
pub fn truncate_at_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Lossy path to String conversion for connection strings and messages.
pub fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Trimmed, non-empty view of an optional string.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
