//! Shared application state: store handle, collaborator handles and the
//! in-process timer registry.

pub mod results;
pub mod session;
pub mod state_machine;
pub mod timers;

use std::sync::Arc;

use crate::collab::{AuthProvider, QuizCatalog};
use crate::dao::SessionStore;
use crate::state::timers::TimerRegistry;

/// Cheaply clonable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state wiring the store, the external collaborators
/// and the per-session timer handles together.
pub struct AppState {
    store: Arc<dyn SessionStore>,
    auth: Arc<dyn AuthProvider>,
    quizzes: Arc<dyn QuizCatalog>,
    timers: TimerRegistry,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`].
    pub fn new(
        store: Arc<dyn SessionStore>,
        auth: Arc<dyn AuthProvider>,
        quizzes: Arc<dyn QuizCatalog>,
    ) -> SharedState {
        Arc::new(Self {
            store,
            auth,
            quizzes,
            timers: TimerRegistry::new(),
        })
    }

    /// Handle to the session document store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Handle to the auth collaborator.
    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    /// Handle to the quiz catalog collaborator.
    pub fn quizzes(&self) -> &Arc<dyn QuizCatalog> {
        &self.quizzes
    }

    /// Registry of armed timers keyed by session id.
    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }
}
