//! Response-shape normalization
//!
//! The backend has answered in several shapes over time. Each one is a variant
//! of [`WireResponse`], tried in declaration order; adding a shape means adding
//! a variant.

use super::{GatewayError, NormalizedResponse};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireResponse {
    /// `{ summary: { text, quick_replies | actions }, details }`
    Structured {
        summary: WireSummary,
        #[serde(default)]
        details: Option<Value>,
    },
    /// `{ response: text }`
    Flat { response: String },
    /// A bare JSON string
    Bare(String),
}

#[derive(Debug, Deserialize)]
struct WireSummary {
    text: String,
    #[serde(default)]
    quick_replies: Option<Vec<String>>,
    #[serde(default)]
    actions: Option<Vec<String>>,
}

/// Convert a raw response body into the canonical shape.
pub fn normalize(body: &str) -> Result<NormalizedResponse, GatewayError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::malformed(format!("invalid JSON: {e}")))?;
    normalize_value(value)
}

pub fn normalize_value(value: Value) -> Result<NormalizedResponse, GatewayError> {
    let wire: WireResponse = serde_json::from_value(value)
        .map_err(|_| GatewayError::malformed("unrecognized response shape"))?;

    match wire {
        WireResponse::Structured { summary, details } => Ok(NormalizedResponse {
            summary_text: summary.text,
            quick_replies: summary
                .quick_replies
                .or(summary.actions)
                .unwrap_or_default(),
            raw_details: details.filter(|d| !d.is_null()),
        }),
        WireResponse::Flat { response: text } | WireResponse::Bare(text) => {
            if text.trim().is_empty() {
                return Err(GatewayError::malformed("empty response text"));
            }
            Ok(NormalizedResponse {
                summary_text: text,
                quick_replies: vec![],
                raw_details: None,
            })
        }
    }
}
