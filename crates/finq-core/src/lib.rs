//! Domain layer for the FinQ client: error type, data model, the session
//! state store, and the wire-to-UI message formatter.
//!
//! I/O lives in `finq-api` (HTTP) and `finq-session` (orchestration); this
//! crate is pure types and state.

pub mod conversation;
pub mod error;
pub mod job;
pub mod message;
pub mod session;

// Re-export common error type
pub use error::{FinqError, Result};

pub use conversation::Conversation;
pub use job::{JobProgress, JobStatus, JobStatusReport, JobSubmission};
pub use message::{ChatMessage, ContentKind, WireMessage, format_message};
pub use session::{SessionState, SessionStore};
