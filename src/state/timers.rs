//! Per-session timer handles. Only live process state: nothing here is
//! persisted, and a process restart simply drops every armed timer.

use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::state::session::SessionId;

/// The two optional timer slots a session can hold.
#[derive(Debug, Default)]
struct TimerSlots {
    countdown: Option<JoinHandle<()>>,
    open_window: Option<JoinHandle<()>>,
}

/// Registry of armed timers keyed by session id.
///
/// Cancellation is idempotent: cancelling an empty, already-fired or unknown
/// slot is a no-op. Arming a slot aborts whatever task previously occupied
/// it, so at most one task per slot is ever live.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    slots: DashMap<SessionId, TimerSlots>,
}

impl TimerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a countdown task, aborting any previous one.
    pub fn set_countdown(&self, session_id: SessionId, handle: JoinHandle<()>) {
        let mut slots = self.slots.entry(session_id).or_default();
        if let Some(previous) = slots.countdown.replace(handle) {
            previous.abort();
        }
    }

    /// Install an open-window task, aborting any previous one.
    pub fn set_open_window(&self, session_id: SessionId, handle: JoinHandle<()>) {
        let mut slots = self.slots.entry(session_id).or_default();
        if let Some(previous) = slots.open_window.replace(handle) {
            previous.abort();
        }
    }

    /// Abort and drop the countdown timer, if armed.
    pub fn cancel_countdown(&self, session_id: SessionId) {
        if let Some(mut slots) = self.slots.get_mut(&session_id) {
            if let Some(handle) = slots.countdown.take() {
                handle.abort();
            }
        }
    }

    /// Abort and drop the open-window timer, if armed.
    pub fn cancel_open_window(&self, session_id: SessionId) {
        if let Some(mut slots) = self.slots.get_mut(&session_id) {
            if let Some(handle) = slots.open_window.take() {
                handle.abort();
            }
        }
    }

    /// Abort and drop both timers, if armed.
    pub fn cancel_all(&self, session_id: SessionId) {
        if let Some((_, slots)) = self.slots.remove(&session_id) {
            if let Some(handle) = slots.countdown {
                handle.abort();
            }
            if let Some(handle) = slots.open_window {
                handle.abort();
            }
        }
    }

    /// Drop the countdown handle without aborting. Used by the fire path so
    /// a callback never aborts the task it is running on.
    pub fn disarm_countdown(&self, session_id: SessionId) {
        if let Some(mut slots) = self.slots.get_mut(&session_id) {
            slots.countdown.take();
        }
    }

    /// Drop the open-window handle without aborting (fire path).
    pub fn disarm_open_window(&self, session_id: SessionId) {
        if let Some(mut slots) = self.slots.get_mut(&session_id) {
            slots.open_window.take();
        }
    }

    /// Whether (countdown, open-window) slots currently hold a handle.
    pub fn armed(&self, session_id: SessionId) -> (bool, bool) {
        self.slots
            .get(&session_id)
            .map(|slots| (slots.countdown.is_some(), slots.open_window.is_some()))
            .unwrap_or((false, false))
    }
}
