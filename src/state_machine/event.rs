//! Events that can occur in a session

use crate::gateway::{GatewayError, NormalizedResponse};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Visibility. `request_id` is used if opening starts the greeting.
    Open {
        request_id: String,
    },
    Close,
    Toggle {
        request_id: String,
    },

    // Input
    SetDraft {
        text: String,
    },
    SendUserMessage {
        text: String,
        request_id: String,
    },
    SelectQuickReply {
        text: String,
        origin_index: usize,
        request_id: String,
    },

    // Gateway
    GatewayResolved {
        request_id: String,
        outcome: Result<NormalizedResponse, GatewayError>,
    },
}

impl Event {
    /// Short label for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::Open { .. } => "open",
            Event::Close => "close",
            Event::Toggle { .. } => "toggle",
            Event::SetDraft { .. } => "set_draft",
            Event::SendUserMessage { .. } => "send_user_message",
            Event::SelectQuickReply { .. } => "select_quick_reply",
            Event::GatewayResolved { .. } => "gateway_resolved",
        }
    }
}
