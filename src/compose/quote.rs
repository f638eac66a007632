//! POSIX shell quoting

/// Characters that never need quoting
fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}

/// Quote `s` so a POSIX shell parses it back to the same literal word.
///
/// Safe strings pass through unchanged; anything else is wrapped in single
/// quotes with embedded single quotes written as `'"'"'`.
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.chars().all(is_safe) {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', "'\"'\"'"))
}
