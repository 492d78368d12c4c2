//! Effects produced by state transitions

use crate::gateway::GatewayRequest;
use crate::store::ConversationEntry;

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append an entry to the message store
    AppendEntry(ConversationEntry),

    /// Replace the whole history (greeting only)
    ReplaceEntries(Vec<ConversationEntry>),

    /// Empty the quick replies of an existing entry
    ClearQuickReplies { index: usize },

    /// Dispatch the single in-flight request
    SendRequest {
        request_id: String,
        request: GatewayRequest,
    },

    /// Record a failure the user never sees
    LogFailure { message: String },
}

impl Effect {
    pub fn append_user(text: impl Into<String>) -> Self {
        Effect::AppendEntry(ConversationEntry::user(text))
    }
}
