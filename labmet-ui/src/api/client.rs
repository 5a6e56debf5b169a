//! HTTP API Client
//!
//! Functions for communicating with the LabMet REST API.

use gloo_net::http::Request;

const API_URL_KEY: &str = "labmet_api_url";

/// Get the API base URL from local storage, or derive it from the page origin
pub fn get_api_base() -> String {
    let window = match web_sys::window() {
        Some(window) => window,
        None => return "/api/v1".to_string(),
    };

    if let Ok(Some(storage)) = window.local_storage() {
        if let Ok(Some(url)) = storage.get_item(API_URL_KEY) {
            return normalize_base(&url);
        }
    }

    let origin = window.location().origin().unwrap_or_default();
    normalize_base(&format!("{}/api/v1", origin))
}

fn normalize_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Server root for the API base (`/health` lives outside `/api/v1`)
pub fn server_root(api_base: &str) -> &str {
    api_base.strip_suffix("/api/v1").unwrap_or(api_base)
}

// ============ Response Types ============

#[derive(Debug, Clone, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub mqtt: String,
    pub stations: usize,
    pub connections: usize,
    pub uptime_seconds: u64,
    #[serde(default)]
    pub version: Option<String>,
}

// ============ API Functions ============

/// Check API health
pub async fn check_health() -> Result<HealthResponse, String> {
    let api_base = get_api_base();
    let url = format!("{}/health", server_root(&api_base));

    let response = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(format!("Health check failed: {}", response.status()));
    }

    response
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))
}
