// src/config.rs

use std::env;

pub const DEFAULT_BASE_URL: &str = "https://www.pro-football-reference.com";

/// Environment variable that points the page clients at another host
/// (a mirror, or a local fixture server).
pub const BASE_URL_ENV: &str = "PFR_BASE_URL";

/// Site root without a trailing slash.
pub fn base_url() -> String {
    env::var(BASE_URL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}
