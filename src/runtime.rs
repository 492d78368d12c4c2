//! Conversation controller
//!
//! A background task owns the message store and session state. The
//! [`ConversationController`] handle feeds it events and reads the snapshots
//! it publishes after every accepted event.

mod executor;


pub use executor::ConversationRuntime;

use crate::gateway::ChatGateway;
use crate::state_machine::Event;
use crate::store::{ConversationEntry, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Read-only view of the conversation for the presentation layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub entries: Arc<[ConversationEntry]>,
    pub is_pending: bool,
    pub is_open: bool,
    pub has_greeted: bool,
    pub draft_text: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("Conversation runtime has stopped")]
    Stopped,
    #[error(transparent)]
    InvalidIndex(#[from] StoreError),
}

/// Handle to a running conversation
///
/// Every entry point is synchronous and only enqueues an event. The runtime
/// stops when the last handle is dropped or on [`shutdown`](Self::shutdown).
#[derive(Clone)]
pub struct ConversationController {
    event_tx: mpsc::UnboundedSender<Event>,
    snapshot_rx: watch::Receiver<Snapshot>,
    shutdown: CancellationToken,
}

impl ConversationController {
    /// Start a runtime on the current tokio runtime
    pub fn spawn<G: ChatGateway + 'static>(gateway: G) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        let shutdown = CancellationToken::new();

        let runtime = ConversationRuntime::new(
            gateway,
            event_rx,
            event_tx.downgrade(),
            snapshot_tx,
            shutdown.clone(),
        );
        tokio::spawn(runtime.run());

        Self {
            event_tx,
            snapshot_rx,
            shutdown,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that is notified whenever a new snapshot is published
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    pub fn open(&self) -> Result<(), ControllerError> {
        self.dispatch(Event::Open {
            request_id: new_request_id(),
        })
    }

    pub fn close(&self) -> Result<(), ControllerError> {
        self.dispatch(Event::Close)
    }

    pub fn toggle(&self) -> Result<(), ControllerError> {
        self.dispatch(Event::Toggle {
            request_id: new_request_id(),
        })
    }

    pub fn set_draft(&self, text: impl Into<String>) -> Result<(), ControllerError> {
        self.dispatch(Event::SetDraft { text: text.into() })
    }

    /// Ignored by the runtime if the text is blank or a request is in flight
    pub fn send_user_message(&self, text: impl Into<String>) -> Result<(), ControllerError> {
        self.dispatch(Event::SendUserMessage {
            text: text.into(),
            request_id: new_request_id(),
        })
    }

    /// Send `text` as the user's turn and consume the quick replies of the
    /// entry at `origin_index`.
    ///
    /// The index is checked against the latest snapshot; an invalid one is
    /// rejected without enqueuing anything.
    pub fn select_quick_reply(
        &self,
        text: impl Into<String>,
        origin_index: usize,
    ) -> Result<(), ControllerError> {
        let len = self.snapshot_rx.borrow().entries.len();
        if origin_index >= len {
            return Err(StoreError::IndexOutOfRange {
                index: origin_index,
                len,
            }
            .into());
        }

        self.dispatch(Event::SelectQuickReply {
            text: text.into(),
            origin_index,
            request_id: new_request_id(),
        })
    }

    /// Stop the runtime and abandon any in-flight request
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn dispatch(&self, event: Event) -> Result<(), ControllerError> {
        self.event_tx
            .send(event)
            .map_err(|_| ControllerError::Stopped)
    }
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
