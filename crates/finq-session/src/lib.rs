//! Application layer for the FinQ client: the session use case and the job
//! poller it drives.
//!
//! The flow is UI action → [`SessionUseCase`] → `QueryApi` → result folded
//! into the session store → [`JobPoller`] started or advanced → terminal
//! status refreshes the canonical message view.

pub mod poller;
pub mod session_usecase;

pub use poller::{JobPoller, PollPolicy};
pub use session_usecase::SessionUseCase;
