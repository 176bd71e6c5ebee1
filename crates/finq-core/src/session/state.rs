//! The session state container and its named transitions.
//!
//! `SessionState` is pure state: every change goes through one of the
//! transition methods below, and none of them performs I/O. Message appends
//! always go to the end of the list; nothing here reorders or deduplicates.

use serde::{Deserialize, Serialize};

use crate::conversation::Conversation;
use crate::job::JobProgress;
use crate::message::ChatMessage;

/// The authoritative client-side view of the session.
///
/// `selected_conversation` of `None` means a draft: the user is composing a
/// new conversation that does not exist server-side yet. While a draft's
/// first job is in flight, `pending_anchor` remembers the conversation id
/// the server assigned so the terminal refresh can resolve against it
/// without prematurely wiping the optimistic messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionState {
    pub conversations: Vec<Conversation>,
    pub selected_conversation: Option<i64>,
    pub pending_anchor: Option<i64>,
    pub messages: Vec<ChatMessage>,
    pub loading_history: bool,
    pub sending: bool,
    pub progress: JobProgress,
    pub error: Option<String>,
}

impl SessionState {
    // ========================================================================
    // Conversation list
    // ========================================================================

    /// Replaces the conversation list wholesale.
    pub fn set_conversations(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations;
    }

    /// Removes one conversation from the list, if present.
    pub fn remove_conversation(&mut self, conversation_id: i64) {
        self.conversations.retain(|c| c.id != conversation_id);
    }

    // ========================================================================
    // Selection and anchor
    // ========================================================================

    /// Changes the selection. `None` marks a draft. Messages are left
    /// untouched; callers pair this with `replace_messages` or
    /// `clear_messages` as their operation requires.
    pub fn select(&mut self, conversation_id: Option<i64>) {
        self.selected_conversation = conversation_id;
    }

    pub fn set_pending_anchor(&mut self, conversation_id: Option<i64>) {
        self.pending_anchor = conversation_id;
    }

    /// The conversation id a terminal job should resolve against: the
    /// pending anchor if one is set, otherwise the current selection.
    pub fn resolve_target(&self) -> Option<i64> {
        self.pending_anchor.or(self.selected_conversation)
    }

    // ========================================================================
    // Messages
    // ========================================================================

    /// Replaces the entire message list in one transition. Callers never
    /// observe a partially written list.
    pub fn replace_messages(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    /// Appends a message at the end of the list.
    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    // ========================================================================
    // Flags, progress, error
    // ========================================================================

    pub fn set_loading_history(&mut self, loading: bool) {
        self.loading_history = loading;
    }

    pub fn set_sending(&mut self, sending: bool) {
        self.sending = sending;
    }

    pub fn set_progress(&mut self, progress: JobProgress) {
        self.progress = progress;
    }

    pub fn reset_progress(&mut self) {
        self.progress = JobProgress::idle();
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
