//! Per-session state shared between the orchestrator and its worker task
//!
//! Status, progress and the event log live under one lock, so an event is
//! appended exactly when the status it reports becomes visible. Once a
//! terminal status is set, every later transition is refused; this is what
//! guarantees a single terminal event and nothing after it.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::Instant;

use super::progress::{EventBatch, ProgressEvent};
use super::request::GenerationOutput;
use crate::types::{GenerationMode, GenerationSession, Progress, SessionId, SessionStatus, StepFailure};

struct SessionState {
    session: GenerationSession,
    events: Vec<ProgressEvent>,
    output: Option<GenerationOutput>,
}

pub(crate) struct SessionHandle {
    id: SessionId,
    clock: Instant,
    state: RwLock<SessionState>,
    cancel_requested: AtomicBool,
    changes: watch::Sender<u64>,
}

impl SessionHandle {
    pub(crate) fn new(
        id: SessionId,
        provider_id: String,
        mode: GenerationMode,
        total_steps: u32,
        from_cache: bool,
    ) -> Self {
        let session = GenerationSession {
            id: id.clone(),
            provider_id,
            mode,
            status: SessionStatus::Starting,
            progress: Progress::initial(total_steps),
            started_at: Utc::now(),
            duration_seconds: 0.0,
            from_cache,
            failure: None,
        };
        let (changes, _) = watch::channel(0);
        Self {
            id,
            clock: Instant::now(),
            state: RwLock::new(SessionState {
                session,
                events: Vec::new(),
                output: None,
            }),
            cancel_requested: AtomicBool::new(false),
            changes,
        }
    }

    pub(crate) fn id(&self) -> &SessionId {
        &self.id
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn elapsed_secs(&self) -> f64 {
        self.clock.elapsed().as_secs_f64()
    }

    /// Current snapshot; running sessions report their live duration
    pub(crate) fn snapshot(&self) -> GenerationSession {
        let mut session = self.read().session.clone();
        if !session.status.is_terminal() {
            session.duration_seconds = self.elapsed_secs();
        }
        session
    }

    pub(crate) fn status(&self) -> SessionStatus {
        self.read().session.status
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }

    pub(crate) fn output(&self) -> Option<GenerationOutput> {
        self.read().output.clone()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Record that `step_number` finished. Returns false once terminal.
    pub(crate) fn advance(&self, step_number: u32, step: &str, eta_seconds: Option<f64>) -> bool {
        let mut state = self.write();
        if state.session.status.is_terminal() {
            return false;
        }

        let progress = &mut state.session.progress;
        let total = progress.total_steps;
        let step_number = step_number.max(progress.current_step_number);
        progress.current_step = step.to_string();
        progress.current_step_number = step_number;
        progress.progress = progress
            .progress
            .max(Progress::percent_for(step_number, total));
        progress.status_message = format!("{} ({}/{})", step, step_number, total);
        progress.eta_seconds = eta_seconds;
        state.session.status = SessionStatus::InProgress;

        self.push_event(&mut state);
        true
    }

    pub(crate) fn complete(&self, output: GenerationOutput) -> bool {
        let mut state = self.write();
        if state.session.status.is_terminal() {
            return false;
        }

        let progress = &mut state.session.progress;
        progress.current_step_number = progress.total_steps;
        progress.progress = 100;
        progress.status_message = "Completed".to_string();
        progress.eta_seconds = None;
        state.output = Some(output);
        self.terminate(&mut state, SessionStatus::Completed);
        true
    }

    pub(crate) fn fail(&self, failure: StepFailure) -> bool {
        let mut state = self.write();
        if state.session.status.is_terminal() {
            return false;
        }

        let progress = &mut state.session.progress;
        progress.current_step = failure.step.clone();
        progress.current_step_number = progress.current_step_number.max(failure.step_number);
        progress.has_error = true;
        progress.error_message = Some(failure.to_string());
        progress.status_message = format!("Failed: {}", failure.message);
        progress.eta_seconds = None;
        state.session.failure = Some(failure);
        self.terminate(&mut state, SessionStatus::Failed);
        true
    }

    /// Request cancellation. True only if the session was still running.
    pub(crate) fn cancel(&self) -> bool {
        let mut state = self.write();
        if !state.session.status.is_cancellable() {
            return false;
        }

        self.cancel_requested.store(true, Ordering::Release);
        state.session.progress.status_message = "Cancelled".to_string();
        state.session.progress.eta_seconds = None;
        self.terminate(&mut state, SessionStatus::Cancelled);
        true
    }

    /// Run `f` only while the session is not terminal, holding the state
    /// lock so a concurrent cancel cannot interleave.
    pub(crate) fn run_if_live<T>(&self, f: impl FnOnce() -> T) -> Option<T> {
        let state = self.write();
        if state.session.status.is_terminal() {
            return None;
        }
        let value = f();
        drop(state);
        Some(value)
    }

    fn terminate(&self, state: &mut SessionState, status: SessionStatus) {
        state.session.status = status;
        state.session.duration_seconds = self.elapsed_secs();
        self.push_event(state);
    }

    fn push_event(&self, state: &mut SessionState) {
        let event = ProgressEvent {
            session_id: self.id.clone(),
            sequence: state.events.len() as u64,
            status: state.session.status,
            progress: state.session.progress.clone(),
            timestamp: Utc::now(),
        };
        state.events.push(event);
        self.changes.send_modify(|version| *version += 1);
    }

    // =========================================================================
    // Event log
    // =========================================================================

    pub(crate) fn events_from(&self, cursor: usize) -> EventBatch {
        let state = self.read();
        let start = cursor.min(state.events.len());
        EventBatch {
            events: state.events[start..].to_vec(),
            next_cursor: state.events.len(),
            finished: state.session.status.is_terminal(),
        }
    }

    /// Event at `index`, plus whether the log is closed
    pub(crate) fn event_at(&self, index: usize) -> (Option<ProgressEvent>, bool) {
        let state = self.read();
        (
            state.events.get(index).cloned(),
            state.session.status.is_terminal(),
        )
    }

    pub(crate) fn watch(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}
