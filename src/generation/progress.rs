//! Session progress events
//!
//! Every session keeps an append-only event log. Push-style callers hold a
//! [`ProgressSubscription`] (or its `Stream` form); pull-style callers poll
//! with a cursor and get an [`EventBatch`]. Both see the same sequence:
//! non-decreasing progress, then exactly one terminal event.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::session::SessionHandle;
use crate::types::{Progress, SessionId, SessionStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub session_id: SessionId,
    /// Position in the session's event log, starting at 0
    pub sequence: u64,
    pub status: SessionStatus,
    pub progress: Progress,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Result of polling the event log from a cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    pub events: Vec<ProgressEvent>,
    /// Pass back on the next poll
    pub next_cursor: usize,
    /// The session is terminal; no events will follow this batch
    pub finished: bool,
}

/// Ordered live view of one session's events
pub struct ProgressSubscription {
    handle: Arc<SessionHandle>,
    changes: watch::Receiver<u64>,
    cursor: usize,
}

impl ProgressSubscription {
    pub(crate) fn new(handle: Arc<SessionHandle>) -> Self {
        let changes = handle.watch();
        Self {
            handle,
            changes,
            cursor: 0,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        self.handle.id()
    }

    /// Next event, or `None` after the terminal event has been delivered
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        loop {
            self.changes.borrow_and_update();
            let (event, finished) = self.handle.event_at(self.cursor);
            if let Some(event) = event {
                self.cursor += 1;
                return Some(event);
            }
            if finished {
                return None;
            }
            if self.changes.changed().await.is_err() {
                let (event, _) = self.handle.event_at(self.cursor);
                self.cursor += usize::from(event.is_some());
                return event;
            }
        }
    }

    /// Everything already logged that this subscription has not yet seen
    pub fn try_drain(&mut self) -> Vec<ProgressEvent> {
        let batch = self.handle.events_from(self.cursor);
        self.cursor = batch.next_cursor;
        batch.events
    }

    pub fn into_stream(self) -> impl Stream<Item = ProgressEvent> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .recv()
                .await
                .map(|event| (event, subscription))
        })
    }
}
