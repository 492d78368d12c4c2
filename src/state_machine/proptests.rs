//! Property-based tests for the state machine
//!
//! Random action sequences are run through `transition` with effects applied
//! to a real `MessageStore`, and the conversation invariants are checked after
//! every step.

use super::*;
use crate::gateway::{GatewayError, NormalizedResponse};
use crate::store::{ConversationEntry, MessageStore};
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Actions
// ============================================================================

/// User or backend action; resolutions are bound to the pending id at run time
#[derive(Debug, Clone)]
enum Action {
    Open,
    Close,
    Toggle,
    SetDraft(String),
    Send(String),
    SelectQuickReply(usize),
    ResolveOk { text: String, replies: usize },
    ResolveErr(bool),
    ResolveStale,
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-zA-Z ?]{1,20}",
        1 => Just("   ".to_string()),
        1 => Just(String::new()),
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        2 => Just(Action::Open),
        1 => Just(Action::Close),
        1 => Just(Action::Toggle),
        1 => arb_text().prop_map(Action::SetDraft),
        4 => arb_text().prop_map(Action::Send),
        3 => (0usize..6).prop_map(Action::SelectQuickReply),
        4 => ("[a-zA-Z ]{1,20}", 0usize..4).prop_map(|(text, replies)| Action::ResolveOk { text, replies }),
        2 => any::<bool>().prop_map(Action::ResolveErr),
        1 => Just(Action::ResolveStale),
    ]
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    state: SessionState,
    store: MessageStore,
    next_id: u64,
    greeting_requests: usize,
    /// Indices whose quick replies have been consumed
    consumed: HashSet<usize>,
}

impl Harness {
    fn new() -> Self {
        Self {
            state: SessionState::new(),
            store: MessageStore::new(),
            next_id: 0,
            greeting_requests: 0,
            consumed: HashSet::new(),
        }
    }

    fn fresh_id(&mut self) -> String {
        self.next_id += 1;
        format!("req-{}", self.next_id)
    }

    fn to_event(&mut self, action: Action) -> Event {
        match action {
            Action::Open => Event::Open {
                request_id: self.fresh_id(),
            },
            Action::Close => Event::Close,
            Action::Toggle => Event::Toggle {
                request_id: self.fresh_id(),
            },
            Action::SetDraft(text) => Event::SetDraft { text },
            Action::Send(text) => Event::SendUserMessage {
                text,
                request_id: self.fresh_id(),
            },
            Action::SelectQuickReply(origin_index) => {
                let text = self
                    .store
                    .get(origin_index)
                    .and_then(|e| e.quick_replies().first().cloned())
                    .unwrap_or_else(|| "Tell me about installation".to_string());
                Event::SelectQuickReply {
                    text,
                    origin_index,
                    request_id: self.fresh_id(),
                }
            }
            Action::ResolveOk { text, replies } => Event::GatewayResolved {
                request_id: self.pending_or_stale(),
                outcome: Ok(NormalizedResponse {
                    summary_text: text,
                    quick_replies: (0..replies).map(|i| format!("reply {i}")).collect(),
                    raw_details: None,
                }),
            },
            Action::ResolveErr(network) => Event::GatewayResolved {
                request_id: self.pending_or_stale(),
                outcome: Err(if network {
                    GatewayError::network("unreachable")
                } else {
                    GatewayError::malformed("garbage")
                }),
            },
            Action::ResolveStale => Event::GatewayResolved {
                request_id: "stale".to_string(),
                outcome: Ok(NormalizedResponse {
                    summary_text: "late".to_string(),
                    quick_replies: vec![],
                    raw_details: None,
                }),
            },
        }
    }

    fn pending_or_stale(&self) -> String {
        self.state
            .pending_request_id()
            .map_or_else(|| "stale".to_string(), str::to_string)
    }

    fn apply(&mut self, result: TransitionResult) {
        self.state = result.new_state;
        for effect in result.effects {
            match effect {
                Effect::AppendEntry(entry) => self.store.append(entry),
                Effect::ReplaceEntries(entries) => {
                    self.store.replace_all(entries);
                    self.consumed.clear();
                }
                Effect::ClearQuickReplies { index } => {
                    if self.store.clear_quick_replies(index).is_ok() {
                        self.consumed.insert(index);
                    }
                }
                Effect::SendRequest { request, .. } => {
                    if request.is_initial_greeting {
                        self.greeting_requests += 1;
                    }
                }
                Effect::LogFailure { .. } => {}
            }
        }
    }
}

fn count_users(entries: &[ConversationEntry]) -> usize {
    entries.iter().filter(|e| e.is_user()).count()
}

fn count_bots(entries: &[ConversationEntry]) -> usize {
    entries.iter().filter(|e| e.is_bot()).count()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: the transcript never has two user entries in a row, bots
    // keep up with users, and an idle session always ends on a bot entry
    #[test]
    fn prop_transcript_alternates(actions in proptest::collection::vec(arb_action(), 0..40)) {
        let mut h = Harness::new();

        for action in actions {
            let event = h.to_event(action);
            if let Ok(result) = transition(&h.state, event) {
                h.apply(result);
            }

            let entries = h.store.entries();
            prop_assert!(count_bots(entries) + 1 >= count_users(entries));
            prop_assert!(
                entries.windows(2).all(|w| !(w[0].is_user() && w[1].is_user())),
                "consecutive user entries: {:?}", entries
            );
            if !h.state.is_pending() {
                prop_assert!(entries.last().is_none_or(ConversationEntry::is_bot));
            }
        }
    }

    // Invariant 2: at most one request is ever dispatched at a time
    #[test]
    fn prop_single_request_in_flight(actions in proptest::collection::vec(arb_action(), 0..40)) {
        let mut h = Harness::new();

        for action in actions {
            let was_pending = h.state.is_pending();
            let event = h.to_event(action);
            match transition(&h.state, event) {
                Ok(result) => {
                    let sends = result
                        .effects
                        .iter()
                        .filter(|e| matches!(e, Effect::SendRequest { .. }))
                        .count();
                    prop_assert!(sends <= 1);
                    if was_pending {
                        prop_assert_eq!(sends, 0, "dispatched while pending");
                    }
                    if sends == 1 {
                        prop_assert!(result.new_state.is_pending());
                    }
                    h.apply(result);
                }
                Err(TransitionError::Busy) => {
                    prop_assert!(was_pending);
                }
                Err(_) => {}
            }
        }
    }

    // Invariant 3: the greeting latch never resets and greets at most once
    #[test]
    fn prop_greeting_at_most_once(actions in proptest::collection::vec(arb_action(), 0..40)) {
        let mut h = Harness::new();
        let mut latched = false;

        for action in actions {
            let event = h.to_event(action);
            if let Ok(result) = transition(&h.state, event) {
                h.apply(result);
            }
            if latched {
                prop_assert!(h.state.has_greeted);
            }
            latched = h.state.has_greeted;
            prop_assert!(h.greeting_requests <= 1);
        }
    }

    // Invariant 4: consumed quick replies stay consumed
    #[test]
    fn prop_quick_replies_stay_consumed(actions in proptest::collection::vec(arb_action(), 0..40)) {
        let mut h = Harness::new();

        for action in actions {
            let event = h.to_event(action);
            if let Ok(result) = transition(&h.state, event) {
                h.apply(result);
            }
            for index in &h.consumed {
                let entry = h.store.get(*index);
                prop_assert!(entry.is_none_or(|e| e.quick_replies().is_empty()));
            }
        }
    }

    // Invariant 5: entries are never removed, including by a late greeting
    #[test]
    fn prop_history_never_shrinks(actions in proptest::collection::vec(arb_action(), 0..40)) {
        let mut h = Harness::new();

        for action in actions {
            let before = h.store.len();
            let event = h.to_event(action);
            if let Ok(result) = transition(&h.state, event) {
                h.apply(result);
            }
            prop_assert!(h.store.len() >= before, "history shrank from {} to {}", before, h.store.len());
        }
    }

    // Invariant 6: rejected events leave the state untouched
    #[test]
    fn prop_busy_session_ignores_input(
        text in "[a-zA-Z ]{1,20}",
        origin_index in 0usize..4,
        kind in prop_oneof![Just(RequestKind::Greeting), Just(RequestKind::Turn)],
    ) {
        let state = SessionState {
            is_open: true,
            phase: Phase::Pending { request_id: "req-1".to_string(), kind },
            has_greeted: true,
            has_history: true,
            draft_text: String::new(),
        };

        let send = transition(&state, Event::SendUserMessage {
            text: text.clone(),
            request_id: "req-2".to_string(),
        });
        prop_assert!(matches!(send, Err(TransitionError::Busy)));

        let select = transition(&state, Event::SelectQuickReply {
            text,
            origin_index,
            request_id: "req-3".to_string(),
        });
        prop_assert!(matches!(select, Err(TransitionError::Busy)));
    }
}
