//! Session state types

use serde::{Deserialize, Serialize};

/// Which flow the in-flight request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Initial greeting: replaces history on success, silent on failure
    Greeting,
    /// Ordinary user turn: always answered by exactly one bot entry
    Turn,
}

/// Request lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// No request in flight
    #[default]
    Idle,

    /// Exactly one request in flight
    Pending { request_id: String, kind: RequestKind },
}

/// All mutable UI state for one widget lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionState {
    pub is_open: bool,
    pub phase: Phase,
    /// One-shot latch; never reset once set
    pub has_greeted: bool,
    /// Set once the user has sent anything; a greeting never lands on top
    pub has_history: bool,
    pub draft_text: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.phase, Phase::Pending { .. })
    }

    /// Id of the in-flight request, if any
    pub fn pending_request_id(&self) -> Option<&str> {
        match &self.phase {
            Phase::Pending { request_id, .. } => Some(request_id),
            Phase::Idle => None,
        }
    }
}
