//! Mobile Notifications
//!
//! - **Notifier**: trait for anything that can broadcast a text alert
//! - **PushNotifier**: push service REST client
//! - **DryAlert**: dry soil policy with per-station cooldown

mod alert;
mod push;

use async_trait::async_trait;
use thiserror::Error;

pub use alert::{dry_soil_message, DryAlert};
pub use push::PushNotifier;

/// Sends a message to every registered device
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns the number of devices notified
    async fn send_all(&self, message: &str) -> Result<usize, NotifyError>;
}

/// Errors from the notification service
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notifications disabled: no API key configured")]
    Disabled,

    #[error("Notification service unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Incorrect API key")]
    NotAuthorized,

    #[error("Request timeout")]
    Timeout,
}
