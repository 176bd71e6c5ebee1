//! Client-side session state: the authoritative view the presentation layer
//! renders, and the store that owns it.

pub mod state;
pub mod store;

pub use state::SessionState;
pub use store::SessionStore;
