//! Push notification delivery through the Expo push API.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Debug, Clone, Error)]
pub enum PushError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("json error: {0}")]
    Serde(String),
    #[error("push rejected: {0}")]
    Rejected(String),
}

impl PushError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// A single push message addressed to one device token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

/// Delivers push messages. Implemented by the Expo client and by test doubles.
#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError>;
}

/// Per-message ticket returned by Expo
#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: String,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpoResponse {
    data: ExpoTicket,
}

#[derive(Debug, Clone)]
pub struct ExpoPushClient {
    http: Client,
    access_token: Option<String>,
}

impl ExpoPushClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(access_token: Option<String>) -> Result<Self, PushError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("cooked-scheduler/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PushError::Transport(e.to_string()))?;

        Ok(Self { http, access_token })
    }

    async fn send_request(&self, message: &PushMessage) -> Result<(), PushError> {
        let mut request = self
            .http
            .post(EXPO_PUSH_URL)
            .header("accept", "application/json")
            .json(message);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let res = request.send().await.map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => {
                let body = res
                    .json::<ExpoResponse>()
                    .await
                    .map_err(|e| PushError::Serde(e.to_string()))?;
                if body.data.status == "ok" {
                    Ok(())
                } else {
                    Err(PushError::Rejected(
                        body.data.message.unwrap_or(body.data.status),
                    ))
                }
            }
            StatusCode::TOO_MANY_REQUESTS => Err(PushError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(PushError::Http { status, body })
            }
        }
    }
}

#[async_trait]
impl PushNotifier for ExpoPushClient {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        (|| async { self.send_request(message).await })
            .retry(
                &ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(500))
                    .with_max_delay(Duration::from_secs(10))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &PushError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "Push delivery failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }
}

fn map_reqwest_error(e: reqwest::Error) -> PushError {
    if e.is_timeout() {
        PushError::Timeout
    } else {
        PushError::Transport(e.to_string())
    }
}
