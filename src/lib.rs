//! Soli chat widget controller
//!
//! Keeps a chat session on top of a single request/response backend
//! endpoint: message history, the one-request-at-a-time lifecycle, response
//! shape normalization and the quick-reply loop. Rendering is left to
//! whoever reads the published [`Snapshot`]s.

pub mod gateway;
pub mod runtime;
pub mod state_machine;
pub mod store;

pub use gateway::{
    ChatGateway, GatewayConfig, GatewayError, GatewayRequest, HttpGateway, LoggingGateway,
    NormalizedResponse,
};
pub use runtime::{ControllerError, ConversationController, Snapshot};
pub use store::{BotEntry, ConversationEntry, MessageStore, StoreError};
