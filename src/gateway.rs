//! Request gateway
//!
//! Wraps the single outbound call to the chat backend and hides which
//! response shape the backend happened to use.

mod error;
mod http;
mod normalize;

pub use error::GatewayError;
pub use http::{GatewayConfig, HttpGateway, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
pub use normalize::{normalize, normalize_value};

use crate::store::{BotEntry, ConversationEntry};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Body of the outbound call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayRequest {
    pub message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_initial_greeting: bool,
}

impl GatewayRequest {
    pub fn greeting() -> Self {
        Self {
            message: String::new(),
            is_initial_greeting: true,
        }
    }

    pub fn turn(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_initial_greeting: false,
        }
    }
}

/// Canonical bot reply, whatever shape the backend answered in
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    pub summary_text: String,
    pub quick_replies: Vec<String>,
    pub raw_details: Option<Value>,
}

impl NormalizedResponse {
    pub fn into_entry(self) -> ConversationEntry {
        ConversationEntry::Bot(BotEntry {
            summary_text: self.summary_text,
            quick_replies: self.quick_replies,
            raw_details: self.raw_details,
        })
    }
}

/// One request/response exchange with the backend
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn send(&self, request: &GatewayRequest) -> Result<NormalizedResponse, GatewayError>;

    /// Identifies the backend in logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ChatGateway + ?Sized> ChatGateway for Arc<T> {
    async fn send(&self, request: &GatewayRequest) -> Result<NormalizedResponse, GatewayError> {
        (**self).send(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Logging wrapper for gateways
pub struct LoggingGateway<G> {
    inner: G,
}

impl<G: ChatGateway> LoggingGateway<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<G: ChatGateway> ChatGateway for LoggingGateway<G> {
    async fn send(&self, request: &GatewayRequest) -> Result<NormalizedResponse, GatewayError> {
        let start = std::time::Instant::now();
        let result = self.inner.send(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    backend = %self.inner.name(),
                    greeting = request.is_initial_greeting,
                    duration_ms = %duration.as_millis(),
                    quick_replies = response.quick_replies.len(),
                    "Chat request completed"
                );
            }
            // The failure itself is reported by the runtime; only timing here
            Err(e) => {
                tracing::debug!(
                    backend = %self.inner.name(),
                    greeting = request.is_initial_greeting,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind(),
                    "Chat request errored"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
