pub use luna_types::DEFAULT_SERVER_URL;

/// Chat streaming endpoint
pub const CHAT_PATH: &str = "/api/chat";

/// Login endpoint
pub const LOGIN_PATH: &str = "/api/auth/login";

/// Device log upload endpoint
pub const DEBUG_LOGS_PATH: &str = "/api/debug/logs";

/// Normalize a user-entered server address.
///
/// Whitespace and trailing slashes are removed and `http://` is assumed when
/// no scheme is given. An empty input falls back to the default server.
pub fn normalize_server_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_SERVER_URL.to_string();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// Join a normalized base URL and an absolute API path
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url, path)
}
