//! The reactive owner of [`SessionState`].

use tokio::sync::{RwLock, watch};

use super::state::SessionState;

/// Holds the session state and republishes a snapshot after every mutation.
///
/// All mutation goes through [`SessionStore::update`], which applies a set
/// of named transitions under the write lock and then publishes the result
/// in one step, so subscribers never observe a half-applied operation. The
/// store itself performs no I/O.
pub struct SessionStore {
    state: RwLock<SessionState>,
    tx: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self {
            state: RwLock::new(SessionState::default()),
            tx,
        }
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Subscribes to state snapshots. The receiver starts at the current
    /// state and observes every subsequent committed update.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Applies `f` to the state under the write lock, publishes the new
    /// snapshot, and returns `f`'s result.
    pub async fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SessionState) -> R,
    {
        let mut state = self.state.write().await;
        let out = f(&mut state);
        self.tx.send_replace(state.clone());
        out
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
