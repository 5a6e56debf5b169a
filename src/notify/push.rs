//! Push notification client
//!
//! REST client for the mobile push service: bearer API key, a profile
//! name, and the device tokens registered for the app.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::RwLock;

use super::{Notifier, NotifyError};
use crate::config::NotificationConfig;

/// Push service client
pub struct PushNotifier {
    client: Client,
    config: NotificationConfig,
    tokens: RwLock<Vec<String>>,
}

impl PushNotifier {
    pub fn new(config: NotificationConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config,
            tokens: RwLock::new(Vec::new()),
        })
    }

    /// Whether an API key is configured
    pub fn is_enabled(&self) -> bool {
        self.api_key().is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_deref().filter(|k| !k.is_empty())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn get(&self, path: &str) -> Result<reqwest::RequestBuilder, NotifyError> {
        let key = self.api_key().ok_or(NotifyError::Disabled)?;
        Ok(self.client.get(self.url(path)).bearer_auth(key))
    }

    /// Check the API key against the service
    pub async fn test_auth(&self) -> Result<(), NotifyError> {
        let response = self.get("/auth/test")?.send().await.map_err(map_request)?;
        let envelope: Envelope<serde_json::Value> = response.json().await?;

        if envelope.meta.status == 200 {
            Ok(())
        } else {
            Err(NotifyError::NotAuthorized)
        }
    }

    /// Registered device tokens, fetched once and cached
    pub async fn tokens(&self) -> Result<Vec<String>, NotifyError> {
        {
            let cached = self.tokens.read().await;
            if !cached.is_empty() {
                return Ok(cached.clone());
            }
        }

        let response = self.get("/push/tokens")?.send().await.map_err(map_request)?;
        let envelope: Envelope<Vec<DeviceToken>> = response.json().await?;
        if envelope.meta.status != 200 {
            return Err(NotifyError::Api {
                status: envelope.meta.status,
                message: "failed to list push tokens".to_string(),
            });
        }

        let tokens: Vec<String> = envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.token)
            .collect();
        tracing::debug!(count = tokens.len(), "Fetched push tokens");

        *self.tokens.write().await = tokens.clone();
        Ok(tokens)
    }

    /// Forget the cached tokens
    pub async fn clear_tokens(&self) {
        self.tokens.write().await.clear();
    }

    fn notification<'a>(&'a self, tokens: &'a [String], message: &'a str) -> PushRequest<'a> {
        PushRequest {
            tokens,
            profile: &self.config.profile,
            notification: PushMessage { message },
        }
    }
}

#[async_trait]
impl Notifier for PushNotifier {
    async fn send_all(&self, message: &str) -> Result<usize, NotifyError> {
        let Some(key) = self.api_key() else {
            tracing::debug!("Push notifications disabled, no API key");
            return Ok(0);
        };

        let tokens = self.tokens().await?;
        if tokens.is_empty() {
            tracing::info!("No push tokens registered");
            return Ok(0);
        }

        let response = self
            .client
            .post(self.url("/push/notifications"))
            .bearer_auth(key)
            .json(&self.notification(&tokens, message))
            .send()
            .await
            .map_err(map_request)?;

        let envelope: Envelope<serde_json::Value> = response.json().await?;
        if envelope.meta.status != 201 {
            return Err(NotifyError::Api {
                status: envelope.meta.status,
                message: "push notification rejected".to_string(),
            });
        }

        tracing::info!(devices = tokens.len(), "Push notification sent");
        Ok(tokens.len())
    }
}

fn map_request(e: reqwest::Error) -> NotifyError {
    if e.is_timeout() {
        NotifyError::Timeout
    } else if e.is_connect() {
        NotifyError::Unavailable
    } else {
        NotifyError::Request(e)
    }
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    meta: Meta,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    status: u16,
}

#[derive(Debug, Deserialize)]
struct DeviceToken {
    token: String,
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    tokens: &'a [String],
    profile: &'a str,
    notification: PushMessage<'a>,
}

#[derive(Debug, Serialize)]
struct PushMessage<'a> {
    message: &'a str,
}
