//! Timer scheduling and the autonomous fire handlers.
//!
//! Each fire performs the same load-mutate-persist cycle as an explicit
//! action, without caller authorization. A fire can race an admin request on
//! the shared document; the handlers defensively re-check that the session
//! still exists and is at the phase and question they were armed for, and
//! no-op otherwise. Fire-path failures are logged and swallowed since no
//! caller is waiting on them.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::state::SharedState;
use crate::state::session::{COUNTDOWN_SECS, SessionId, TimerCommand};

/// Current wall clock as Unix milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Carry out the scheduler side effects a session mutation asked for.
pub fn execute_timer_commands(
    state: &SharedState,
    session_id: SessionId,
    commands: Vec<TimerCommand>,
) {
    for command in commands {
        match command {
            TimerCommand::ArmCountdown { question } => {
                arm_countdown(state.clone(), session_id, question);
            }
            TimerCommand::ArmOpenWindow { question, duration } => {
                arm_open_window(state.clone(), session_id, question, duration);
            }
            TimerCommand::CancelCountdown => state.timers().cancel_countdown(session_id),
            TimerCommand::CancelOpenWindow => state.timers().cancel_open_window(session_id),
            TimerCommand::CancelAll => state.timers().cancel_all(session_id),
        }
    }
}

fn arm_countdown(state: SharedState, session_id: SessionId, question: usize) {
    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        sleep(Duration::from_secs(COUNTDOWN_SECS)).await;
        fire_countdown(task_state, session_id, question).await;
    });
    state.timers().set_countdown(session_id, handle);
}

fn arm_open_window(
    state: SharedState,
    session_id: SessionId,
    question: usize,
    duration: Duration,
) {
    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        sleep(duration).await;
        fire_open_window(task_state, session_id, question).await;
    });
    state.timers().set_open_window(session_id, handle);
}

/// Countdown elapsed: open the question and arm its window.
async fn fire_countdown(state: SharedState, session_id: SessionId, question: usize) {
    state.timers().disarm_countdown(session_id);

    let mut document = match state.store().load().await {
        Ok(document) => document,
        Err(err) => {
            warn!(session_id, error = %err, "countdown fire could not load document");
            return;
        }
    };

    let Some(session) = document.session_mut(session_id) else {
        debug!(session_id, "countdown fired for a vanished session");
        return;
    };
    let Some(arm) = session.countdown_fired(question, now_ms()) else {
        debug!(session_id, question, "stale countdown fire ignored");
        return;
    };

    if let Err(err) = state.store().save(document).await {
        warn!(session_id, error = %err, "countdown fire could not persist document");
        return;
    }

    info!(session_id, question, "question opened by countdown timer");
    execute_timer_commands(&state, session_id, vec![arm]);
}

/// Open window elapsed: close the question.
async fn fire_open_window(state: SharedState, session_id: SessionId, question: usize) {
    state.timers().disarm_open_window(session_id);

    let mut document = match state.store().load().await {
        Ok(document) => document,
        Err(err) => {
            warn!(session_id, error = %err, "open-window fire could not load document");
            return;
        }
    };

    let Some(session) = document.session_mut(session_id) else {
        debug!(session_id, "open-window fired for a vanished session");
        return;
    };
    if !session.open_window_fired(question) {
        debug!(session_id, question, "stale open-window fire ignored");
        return;
    }

    if let Err(err) = state.store().save(document).await {
        warn!(session_id, error = %err, "open-window fire could not persist document");
        return;
    }

    info!(session_id, question, "question closed by open-window timer");
}
