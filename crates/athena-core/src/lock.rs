//! Global grade lock.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::traits::{BackendResult, LockScope, QuizBackend};

/// Shared handle on the global lock, which hides grades on the dashboard.
///
/// Clones share one value. The backend owns the truth; the handle is only
/// changed through [`LockState::refresh`] and [`LockState::toggle`].
#[derive(Debug, Clone)]
pub struct LockState {
    locked: Arc<RwLock<bool>>,
}

impl Default for LockState {
    /// Locked until the backend says otherwise.
    fn default() -> Self {
        Self::new(true)
    }
}

impl LockState {
    pub fn new(locked: bool) -> Self {
        Self {
            locked: Arc::new(RwLock::new(locked)),
        }
    }

    pub async fn is_locked(&self) -> bool {
        *self.locked.read().await
    }

    /// Reload the lock from the backend.
    #[instrument(skip_all)]
    pub async fn refresh(&self, backend: &dyn QuizBackend) -> BackendResult<bool> {
        let locked = backend.get_lock_state(&LockScope::Global).await?;
        *self.locked.write().await = locked;
        debug!(locked, "global lock refreshed");
        Ok(locked)
    }

    /// Flip the lock on the backend, then refresh.
    #[instrument(skip_all)]
    pub async fn toggle(&self, backend: &dyn QuizBackend) -> BackendResult<bool> {
        backend.toggle_lock_state(&LockScope::Global).await?;
        self.refresh(backend).await
    }
}
