//! Pure state transition function
//!
//! Given the same state and event this always produces the same new state and
//! effects. No I/O happens here; the runtime executes the effects.

use super::state::{Phase, RequestKind, SessionState};
use super::{Effect, Event};
use crate::gateway::{GatewayError, GatewayRequest, NormalizedResponse};
use crate::store::ConversationEntry;
use thiserror::Error;

/// Bot text shown when an ordinary turn fails
pub const APOLOGY_TEXT: &str = "Sorry, there was an error processing your request.";

/// Suggestions offered with the apology
pub const FALLBACK_QUICK_REPLIES: [&str; 3] = [
    "What solar incentives are available?",
    "How much could I save with solar?",
    "Tell me about installation",
];

/// The synthetic bot entry appended when a turn fails
pub fn apology_entry() -> ConversationEntry {
    ConversationEntry::bot(
        APOLOGY_TEXT,
        FALLBACK_QUICK_REPLIES.iter().map(|s| (*s).to_string()).collect(),
    )
}

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Events the session refuses. None of these change state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A request is already in flight")]
    Busy,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("No pending request with id {0}")]
    StaleResolution(String),
}

pub fn transition(state: &SessionState, event: Event) -> Result<TransitionResult, TransitionError> {
    match event {
        Event::Open { request_id } => Ok(open(state, request_id)),

        Event::Close => Ok(close(state)),

        Event::Toggle { request_id } => {
            if state.is_open {
                Ok(close(state))
            } else {
                Ok(open(state, request_id))
            }
        }

        Event::SetDraft { text } => {
            let mut next = state.clone();
            next.draft_text = text;
            Ok(TransitionResult::new(next))
        }

        Event::SendUserMessage { text, request_id } => send_user_message(state, text, request_id),

        // Stage the reply as the draft, send it, then consume the origin's
        // replies. Clearing comes after dispatch and ignores the outcome.
        Event::SelectQuickReply {
            text,
            origin_index,
            request_id,
        } => {
            if state.is_pending() {
                return Err(TransitionError::Busy);
            }
            let mut staged = state.clone();
            staged.draft_text.clone_from(&text);
            let clear = Effect::ClearQuickReplies {
                index: origin_index,
            };

            // A blank reply sends nothing but is still consumed
            if text.trim().is_empty() {
                return Ok(TransitionResult::new(staged).with_effect(clear));
            }

            let result = send_user_message(&staged, text, request_id)?;
            Ok(result.with_effect(clear))
        }

        Event::GatewayResolved {
            request_id,
            outcome,
        } => match &state.phase {
            Phase::Pending {
                request_id: pending_id,
                kind,
            } if *pending_id == request_id => Ok(resolve(state, *kind, outcome)),
            _ => Err(TransitionError::StaleResolution(request_id)),
        },
    }
}

fn open(state: &SessionState, request_id: String) -> TransitionResult {
    let mut next = state.clone();
    next.is_open = true;

    if state.has_greeted {
        return TransitionResult::new(next);
    }

    // Latch before the flow starts so a second open can never greet again
    next.has_greeted = true;

    // The greeting replaces history, so it only runs on an empty, idle session
    if state.is_pending() || state.has_history {
        return TransitionResult::new(next);
    }

    next.phase = Phase::Pending {
        request_id: request_id.clone(),
        kind: RequestKind::Greeting,
    };
    TransitionResult::new(next).with_effect(Effect::SendRequest {
        request_id,
        request: GatewayRequest::greeting(),
    })
}

fn close(state: &SessionState) -> TransitionResult {
    let mut next = state.clone();
    next.is_open = false;
    TransitionResult::new(next)
}

fn send_user_message(
    state: &SessionState,
    text: String,
    request_id: String,
) -> Result<TransitionResult, TransitionError> {
    if state.is_pending() {
        return Err(TransitionError::Busy);
    }
    if text.trim().is_empty() {
        return Err(TransitionError::EmptyMessage);
    }

    let mut next = state.clone();
    next.draft_text.clear();
    next.has_history = true;
    next.phase = Phase::Pending {
        request_id: request_id.clone(),
        kind: RequestKind::Turn,
    };

    Ok(TransitionResult::new(next)
        .with_effect(Effect::append_user(text.clone()))
        .with_effect(Effect::SendRequest {
            request_id,
            request: GatewayRequest::turn(text),
        }))
}

fn resolve(
    state: &SessionState,
    kind: RequestKind,
    outcome: Result<NormalizedResponse, GatewayError>,
) -> TransitionResult {
    let mut next = state.clone();
    next.phase = Phase::Idle;
    let result = TransitionResult::new(next);

    match (kind, outcome) {
        // The greeting starts the conversation over instead of appending
        (RequestKind::Greeting, Ok(response)) => {
            result.with_effect(Effect::ReplaceEntries(vec![response.into_entry()]))
        }
        (RequestKind::Greeting, Err(e)) => result.with_effect(Effect::LogFailure {
            message: format!("Greeting failed: {e}"),
        }),
        (RequestKind::Turn, Ok(response)) => {
            result.with_effect(Effect::AppendEntry(response.into_entry()))
        }
        (RequestKind::Turn, Err(e)) => result
            .with_effect(Effect::AppendEntry(apology_entry()))
            .with_effect(Effect::LogFailure {
                message: format!("Turn failed, showing apology: {e}"),
            }),
    }
}
