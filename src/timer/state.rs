use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

use crate::{models::Session, store::SessionStore};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Focus => "Focus",
            Phase::Break => "Break",
        }
    }
}

/// What is running right now. Elapsed time is never stored; it is derived
/// from `phase_started_at` whenever the info is rendered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunningInfo {
    pub session_id: u64,
    pub phase: Phase,
    pub phase_duration_secs: u64,
    pub phase_started_at: DateTime<Utc>,
    pub current_round: u32,
    pub total_rounds: u32,
}

impl RunningInfo {
    /// Whole seconds spent in the phase at `now`, capped at the phase length.
    ///
    /// Both instants are truncated to the second first, so every `now` within
    /// the same second yields the same value.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        let delta = now.timestamp() - self.phase_started_at.timestamp();
        (delta.max(0) as u64).min(self.phase_duration_secs)
    }

    /// One-line status for `session`, or `None` if the info describes some
    /// other session.
    pub fn render(&self, now: DateTime<Utc>, session: &Session) -> Option<String> {
        if session.id != self.session_id {
            return None;
        }

        Some(format!(
            "[Running] Session {} [{}] - Round {}/{} - {} | {} / {}",
            session.id,
            session.title,
            self.current_round,
            self.total_rounds,
            self.phase.label(),
            format_mmss(self.elapsed_secs(now)),
            format_mmss(self.phase_duration_secs),
        ))
    }
}

pub fn format_mmss(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Single-slot, single-writer / many-reader holder of the current
/// [`RunningInfo`].
///
/// Writes replace the whole value at once, so readers always get either the
/// previous or the next snapshot.
#[derive(Clone)]
pub struct RunningInfoChannel {
    tx: Arc<watch::Sender<Option<RunningInfo>>>,
}

impl Default for RunningInfoChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningInfoChannel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Replaces the current snapshot, stamping the phase start with the
    /// current wall-clock time.
    pub fn publish(
        &self,
        session_id: u64,
        phase: Phase,
        phase_duration_secs: u64,
        current_round: u32,
        total_rounds: u32,
    ) {
        self.tx.send_replace(Some(RunningInfo {
            session_id,
            phase,
            phase_duration_secs,
            phase_started_at: Utc::now(),
            current_round,
            total_rounds,
        }));
    }

    pub fn clear(&self) {
        self.tx.send_if_modified(|current| current.take().is_some());
    }

    pub fn snapshot(&self) -> Option<RunningInfo> {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every publish or clear.
    pub fn subscribe(&self) -> watch::Receiver<Option<RunningInfo>> {
        self.tx.subscribe()
    }

    /// Renders the current snapshot against the session it refers to.
    ///
    /// Returns `None` when nothing runs or the session is gone from `store`.
    pub fn render(&self, now: DateTime<Utc>, store: &SessionStore) -> Option<String> {
        let info = self.snapshot()?;
        let session = store.get(info.session_id)?;
        info.render(now, &session)
    }
}
