//! Shared utility functions.

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary.
///
/// Returns a sub-slice of the original string. If the string is shorter than
/// `max_bytes`, the entire string is returned unchanged.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Keep the head and tail of `s` within `max_bytes`, joined by a marker.
///
/// Falls back to a plain head cut when `max_bytes` cannot fit the marker.
pub fn truncate_head_tail(s: &str, max_bytes: usize) -> String {
    const MARKER: &str = "\n[...]\n";

    if s.len() <= max_bytes {
        return s.to_string();
    }
    if max_bytes <= MARKER.len() + 2 {
        return truncate_str(s, max_bytes).to_string();
    }

    let keep = max_bytes - MARKER.len();
    let head_len = keep / 2;
    let head = truncate_str(s, head_len);

    let mut tail_start = s.len() - (keep - head.len());
    while tail_start < s.len() && !s.is_char_boundary(tail_start) {
        tail_start += 1;
    }

    format!("{}{}{}", head, MARKER, &s[tail_start..])
}

/// Trim and collapse every whitespace run into a single space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
