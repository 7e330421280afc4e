// Helper functions for safe logging and timestamp storage

use chrono::{DateTime, SecondsFormat, Utc};

/// Masks logins for safe logging
/// Keeps the first character so log lines can still be correlated
///
/// # Example
/// ```
/// use keeper_api::common::safe_login_log;
/// assert_eq!(safe_login_log("alice"), "a***");
/// ```
pub fn safe_login_log(login: &str) -> String {
    match login.chars().next() {
        Some(first) if login.chars().count() > 2 => format!("{}***", first),
        _ => "***".to_string(),
    }
}

/// Masks tokens for safe logging
/// Shows only first and last 4 characters
///
/// # Example
/// ```
/// use keeper_api::common::safe_token_log;
/// assert_eq!(safe_token_log("eyJhbGciOiJIUzI1NiJ9"), "eyJh...NiJ9");
/// ```
pub fn safe_token_log(token: &str) -> String {
    if token.len() > 8 && token.is_ascii() {
        format!("{}...{}", &token[..4], &token[token.len() - 4..])
    } else {
        "***".to_string()
    }
}

/// Fixed-width RFC 3339 rendering used for stored timestamps
///
/// Every value has the same shape, so text comparison in SQL orders rows
/// chronologically.
pub fn sortable_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
