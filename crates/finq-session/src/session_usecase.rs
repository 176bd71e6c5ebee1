//! Session use case implementation.
//!
//! `SessionUseCase` is the application-layer surface the presentation layer
//! calls. It coordinates the [`SessionStore`], the [`JobPoller`], and the
//! [`QueryApi`] client: every operation commits its externally visible state
//! change to the store before resolving, and every failure degrades to a
//! visible error in the state rather than tearing anything down.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;

use finq_api::QueryApi;
use finq_core::{ChatMessage, Conversation, SessionState, SessionStore, format_message};

use crate::poller::{JobPoller, PollPolicy};

/// Snapshot taken before an optimistic delete, restored verbatim if the
/// server rejects it.
struct DeleteSnapshot {
    conversations: Vec<Conversation>,
    selected: Option<i64>,
    messages: Vec<ChatMessage>,
}

/// Orchestrates conversations, query submission, and job observation.
pub struct SessionUseCase {
    store: Arc<SessionStore>,
    api: Arc<dyn QueryApi>,
    poller: JobPoller,
}

impl SessionUseCase {
    pub fn new(api: Arc<dyn QueryApi>, policy: PollPolicy) -> Self {
        let store = Arc::new(SessionStore::new());
        let poller = JobPoller::new(Arc::clone(&api), Arc::clone(&store), policy);
        Self { store, api, poller }
    }

    /// The reactive state handed to the presentation layer.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.store.subscribe()
    }

    /// Returns a copy of the current session state.
    pub async fn state(&self) -> SessionState {
        self.store.snapshot().await
    }

    /// Replaces the conversation list with the latest server-reported one.
    ///
    /// Idempotent. On failure the previous list is left untouched and
    /// `error` is set.
    pub async fn fetch_history(&self) -> Result<()> {
        self.store
            .update(|s| {
                s.set_loading_history(true);
                s.clear_error();
            })
            .await;

        match self.api.fetch_history().await {
            Ok(conversations) => {
                self.store
                    .update(move |s| {
                        s.set_conversations(conversations);
                        s.set_loading_history(false);
                    })
                    .await;
                Ok(())
            }
            Err(err) => {
                self.store
                    .update(|s| {
                        s.set_loading_history(false);
                        s.set_error(err.to_string());
                    })
                    .await;
                Err(err.into())
            }
        }
    }

    /// Selects a conversation, or `None` to start a draft.
    ///
    /// For a real id the message list is replaced atomically with the
    /// server's record; on fetch failure the prior messages stay, the new
    /// selection stands, and `error` is set.
    pub async fn select_conversation(&self, conversation_id: Option<i64>) -> Result<()> {
        let Some(id) = conversation_id else {
            self.store
                .update(|s| {
                    s.select(None);
                    s.clear_messages();
                    s.set_pending_anchor(None);
                })
                .await;
            return Ok(());
        };

        self.store.update(move |s| s.select(Some(id))).await;

        match self.api.fetch_messages(id).await {
            Ok(wire_messages) => {
                let messages: Vec<ChatMessage> =
                    wire_messages.iter().map(format_message).collect();
                self.store
                    .update(move |s| s.replace_messages(messages))
                    .await;
                Ok(())
            }
            Err(err) => {
                self.store.update(|s| s.set_error(err.to_string())).await;
                Err(err.into())
            }
        }
    }

    /// Abandons whatever is in flight and moves to a fresh draft.
    ///
    /// This is the only way the UI walks away from an active job: the poll
    /// is cancelled (the job itself keeps running server-side, unobserved)
    /// and the selection becomes a draft.
    pub async fn create_new_conversation(&self) -> Result<()> {
        self.poller.cancel().await;
        self.store
            .update(|s| {
                s.set_sending(false);
                s.reset_progress();
            })
            .await;
        self.select_conversation(None).await
    }

    /// Deletes a conversation optimistically.
    ///
    /// The conversation leaves the local list before the server call; if
    /// the server rejects the delete, list, selection, and messages are all
    /// restored verbatim and `error` is set.
    pub async fn delete_conversation(&self, conversation_id: i64) -> Result<()> {
        let snapshot = self
            .store
            .update(move |s| {
                let snapshot = DeleteSnapshot {
                    conversations: s.conversations.clone(),
                    selected: s.selected_conversation,
                    messages: s.messages.clone(),
                };
                s.remove_conversation(conversation_id);
                if s.selected_conversation == Some(conversation_id) {
                    s.select(None);
                    s.clear_messages();
                }
                snapshot
            })
            .await;

        match self.api.delete_conversation(conversation_id).await {
            Ok(()) => {
                tracing::info!(target: "session", conversation_id, "conversation deleted");
                Ok(())
            }
            Err(err) => {
                let err_text = err.to_string();
                self.store
                    .update(move |s| {
                        s.set_conversations(snapshot.conversations);
                        s.select(snapshot.selected);
                        s.replace_messages(snapshot.messages);
                        s.set_error(err_text);
                    })
                    .await;
                Err(err.into())
            }
        }
    }

    /// Submits a query against the current selection (or a draft).
    ///
    /// Appends the optimistic user echo before any network round-trip. A
    /// draft submission remembers the server-assigned conversation id as
    /// the pending anchor instead of changing the selection, so the echo
    /// survives until the job's terminal refresh. On submission failure the
    /// sending flag rolls back and an inline error message is appended.
    pub async fn send_message(&self, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(());
        }

        let selected = self
            .store
            .update(|s| {
                s.push_message(ChatMessage::user_echo(content));
                s.set_sending(true);
                s.clear_error();
                s.selected_conversation
            })
            .await;

        match self.api.submit_query(content, selected).await {
            Ok(submission) => {
                if selected.is_none() {
                    tracing::info!(
                        target: "session",
                        conversation_id = submission.conversation_id,
                        "draft resolved to a server conversation, anchor set"
                    );
                    self.store
                        .update(move |s| s.set_pending_anchor(Some(submission.conversation_id)))
                        .await;
                }
                tracing::info!(target: "session", job_id = %submission.job_id, "query submitted");
                self.poller.start(submission.job_id).await;
                Ok(())
            }
            Err(err) => {
                self.store
                    .update(|s| {
                        s.set_sending(false);
                        s.push_message(ChatMessage::inline_error(format!(
                            "Failed to submit query: {}",
                            err
                        )));
                        s.set_error(err.to_string());
                    })
                    .await;
                Err(err.into())
            }
        }
    }

    /// Whether a job poll is currently live. Exposed for hosts that want to
    /// gate teardown on it.
    pub async fn is_polling(&self) -> bool {
        self.poller.is_active().await
    }

    /// Cancels any live poll. Hosts call this on teardown (for example when
    /// the API client forces a re-login) so no timer outlives the session.
    pub async fn shutdown(&self) {
        self.poller.cancel().await;
    }
}
