//! Ordered conversation log
//!
//! Entries are only ever appended, except for two targeted edits: the greeting
//! replaces the whole history, and a bot entry's quick replies can be cleared
//! once one of them has been used.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// A single entry in the conversation, in display order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sender", rename_all = "snake_case")]
pub enum ConversationEntry {
    User { text: String },
    Bot(BotEntry),
}

/// A bot turn: the text to show plus suggested follow-ups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotEntry {
    pub summary_text: String,
    #[serde(default)]
    pub quick_replies: Vec<String>,
    /// Backend `details` payload, kept for an expert view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_details: Option<Value>,
}

impl ConversationEntry {
    pub fn user(text: impl Into<String>) -> Self {
        ConversationEntry::User { text: text.into() }
    }

    pub fn bot(summary_text: impl Into<String>, quick_replies: Vec<String>) -> Self {
        ConversationEntry::Bot(BotEntry {
            summary_text: summary_text.into(),
            quick_replies,
            raw_details: None,
        })
    }

    pub fn is_user(&self) -> bool {
        matches!(self, ConversationEntry::User { .. })
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, ConversationEntry::Bot(_))
    }

    /// Quick replies offered by this entry (always empty for user entries)
    pub fn quick_replies(&self) -> &[String] {
        match self {
            ConversationEntry::Bot(bot) => &bot.quick_replies,
            ConversationEntry::User { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("entry index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// In-memory message log owned by the conversation runtime
#[derive(Debug, Default)]
pub struct MessageStore {
    entries: Vec<ConversationEntry>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    /// Replace the entire history. Only the greeting flow does this.
    pub fn replace_all(&mut self, entries: Vec<ConversationEntry>) {
        self.entries = entries;
    }

    /// Empty the quick replies of the entry at `index`.
    ///
    /// Clearing an entry that has none (including a user entry) is a no-op.
    pub fn clear_quick_replies(&mut self, index: usize) -> Result<(), StoreError> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })?;

        if let ConversationEntry::Bot(bot) = entry {
            bot.quick_replies.clear();
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&ConversationEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Immutable copy of the current history for readers
    pub fn snapshot(&self) -> Arc<[ConversationEntry]> {
        Arc::from(self.entries.as_slice())
    }
}
