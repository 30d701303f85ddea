//! Utility functions

/// Canonical form used for username lookups and throttling keys.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

pub fn mask_username(username: &str) -> String {
    let chars: Vec<char> = username.chars().collect();
    match chars.len() {
        0 => "***".to_string(),
        1 | 2 => format!("{}***", chars[0]),
        _ => format!("{}{}***", chars[0], chars[1]),
    }
}
