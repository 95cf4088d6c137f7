/// Escape text for safe embedding in HTML element content or attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
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

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Render an elapsed time in minutes as "just now", "5m ago", "2h ago" or
/// "3d ago". Hours and days round to the nearest unit; negative input
/// (clock skew) reads as "just now".
pub fn format_age(minutes: i64) -> String {
    const HOUR: i64 = 60;
    const DAY: i64 = 24 * HOUR;

    match minutes {
        m if m < 1 => "just now".to_string(),
        m if m < HOUR => format!("{}m ago", m),
        m if m < DAY => format!("{}h ago", (m + HOUR / 2) / HOUR),
        m => format!("{}d ago", (m + DAY / 2) / DAY),
    }
}
