//! Backend base URL resolution.
//!
//! Resolution order: explicit value (flag or `ETUDE_BACKEND_URL`), then a
//! localhost default when running on a local host, then the hardcoded
//! production fallback. Explicit values tolerate copy-pasted quotes and
//! trailing slashes.
use std::env;

/// Env var holding an explicit backend base URL.
pub const BACKEND_URL_ENV: &str = "ETUDE_BACKEND_URL";

/// Env var holding the proxy upstream base.
pub const API_TARGET_BASE_ENV: &str = "API_TARGET_BASE";

const LOCAL_BACKEND: &str = "http://localhost:8001";
const PRODUCTION_BACKEND: &str = "https://etude8-bible-api-production.up.railway.app";

/// Resolve the backend base from an explicit value and the current hostname.
pub fn resolve_backend_url(explicit: Option<&str>, hostname: Option<&str>) -> String {
    if let Some(raw) = explicit {
        let cleaned = clean_base(raw);
        if !cleaned.is_empty() {
            return cleaned;
        }
    }
    match hostname {
        Some("localhost") | Some("127.0.0.1") => LOCAL_BACKEND.to_string(),
        _ => PRODUCTION_BACKEND.to_string(),
    }
}

/// Resolve the backend base for the current process environment.
pub fn backend_url(explicit: Option<&str>) -> String {
    let from_env = env::var(BACKEND_URL_ENV).ok();
    let explicit = explicit.or(from_env.as_deref());
    let hostname = env::var("HOSTNAME").ok();
    resolve_backend_url(explicit, hostname.as_deref())
}

/// The generation API lives under `/api` on the backend.
pub fn api_base(backend: &str) -> String {
    format!("{}/api", backend.trim_end_matches('/'))
}

fn clean_base(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim_end_matches('/')
        .to_string()
}
