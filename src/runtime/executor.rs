//! Conversation runtime executor

use super::Snapshot;
use crate::gateway::ChatGateway;
use crate::state_machine::{transition, Effect, Event, SessionState};
use crate::store::MessageStore;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Owns all conversation state and applies events one at a time
pub struct ConversationRuntime<G>
where
    G: ChatGateway + 'static,
{
    state: SessionState,
    store: MessageStore,
    gateway: Arc<G>,
    event_rx: mpsc::UnboundedReceiver<Event>,
    /// Weak so that dropping every handle ends the loop
    event_tx: mpsc::WeakUnboundedSender<Event>,
    snapshot_tx: watch::Sender<Snapshot>,
    /// Cancelled on shutdown; in-flight requests hold child tokens
    shutdown: CancellationToken,
}

impl<G> ConversationRuntime<G>
where
    G: ChatGateway + 'static,
{
    pub fn new(
        gateway: G,
        event_rx: mpsc::UnboundedReceiver<Event>,
        event_tx: mpsc::WeakUnboundedSender<Event>,
        snapshot_tx: watch::Sender<Snapshot>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            state: SessionState::new(),
            store: MessageStore::new(),
            gateway: Arc::new(gateway),
            event_rx,
            event_tx,
            snapshot_tx,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(backend = %self.gateway.name(), "Starting conversation runtime");
        self.publish();

        // Process events in a loop; gateway results come back as events
        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,

                event = self.event_rx.recv() => match event {
                    Some(event) => self.process_event(event),
                    None => break,
                },
            }
        }

        // Abandon anything still in flight
        self.shutdown.cancel();
        tracing::info!(entries = self.store.len(), "Conversation runtime stopped");
    }

    fn process_event(&mut self, event: Event) {
        let name = event.name();

        // Pure state transition
        let result = match transition(&self.state, event) {
            Ok(r) => r,
            Err(e) => {
                // Rejections are silent no-ops for the presentation layer
                tracing::debug!(event = name, reason = %e, "Event ignored");
                return;
            }
        };

        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }

        self.publish();
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendEntry(entry) => self.store.append(entry),

            Effect::ReplaceEntries(entries) => self.store.replace_all(entries),

            Effect::ClearQuickReplies { index } => {
                if let Err(e) = self.store.clear_quick_replies(index) {
                    tracing::error!(error = %e, "Failed to clear quick replies");
                }
            }

            Effect::SendRequest {
                request_id,
                request,
            } => {
                let Some(event_tx) = self.event_tx.upgrade() else {
                    tracing::warn!(request_id = %request_id, "No handles left, request not sent");
                    return;
                };
                let gateway = self.gateway.clone();
                let cancel = self.shutdown.child_token();

                tokio::spawn(async move {
                    tracing::debug!(
                        request_id = %request_id,
                        greeting = request.is_initial_greeting,
                        "Sending chat request (background)"
                    );

                    // Race the request against shutdown
                    tokio::select! {
                        biased;

                        () = cancel.cancelled() => {
                            tracing::info!(request_id = %request_id, "Chat request abandoned");
                        }

                        outcome = gateway.send(&request) => {
                            let resolved = Event::GatewayResolved {
                                request_id: request_id.clone(),
                                outcome,
                            };
                            if event_tx.send(resolved).is_err() {
                                tracing::debug!(
                                    request_id = %request_id,
                                    "Runtime stopped, chat response dropped"
                                );
                            }
                        }
                    }
                });
            }

            Effect::LogFailure { message } => {
                tracing::warn!(error = %message, "Chat request failed");
            }
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(Snapshot {
            entries: self.store.snapshot(),
            is_pending: self.state.is_pending(),
            is_open: self.state.is_open,
            has_greeted: self.state.has_greeted,
            draft_text: self.state.draft_text.clone(),
        });
    }
}
