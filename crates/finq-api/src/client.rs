//! The consumed server interface, as a trait seam.
//!
//! The orchestration layer only ever talks to `dyn QueryApi`, so tests swap
//! in a mock and the HTTP implementation stays in one place.

use async_trait::async_trait;
use finq_core::{Conversation, JobStatusReport, JobSubmission, Result, WireMessage};

/// Async client interface for the FinQ query service.
#[async_trait]
pub trait QueryApi: Send + Sync {
    /// Lists the user's conversations, newest state first as the server
    /// reports them.
    async fn fetch_history(&self) -> Result<Vec<Conversation>>;

    /// Fetches the full, ordered (oldest to newest) message list of one
    /// conversation.
    async fn fetch_messages(&self, conversation_id: i64) -> Result<Vec<WireMessage>>;

    /// Deletes a conversation and all of its messages.
    async fn delete_conversation(&self, conversation_id: i64) -> Result<()>;

    /// Submits a natural-language query, spawning an asynchronous job.
    ///
    /// A `conversation_id` of `None` asks the server to create a new
    /// conversation; the receipt carries the id it assigned.
    async fn submit_query(
        &self,
        query: &str,
        conversation_id: Option<i64>,
    ) -> Result<JobSubmission>;

    /// Fetches the current status of a job.
    async fn job_status(&self, job_id: &str) -> Result<JobStatusReport>;
}
