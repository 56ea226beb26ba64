use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::{sync::Mutex, task::JoinHandle, time::Duration};
use tokio_util::sync::CancellationToken;

use crate::{
    error::SessionError,
    models::{Session, SessionStatus},
    store::SessionStore,
};

use super::{
    schedule::{plan_phases, wait_phase, PlannedPhase, WaitOutcome, DEFAULT_TICK_INTERVAL},
    RunningInfoChannel,
};

struct ActiveRun {
    session_id: u64,
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Drives at most one session at a time in a background task.
///
/// Clones share the same execution slot.
#[derive(Clone)]
pub struct SessionRunner {
    store: SessionStore,
    channel: RunningInfoChannel,
    active: Arc<Mutex<Option<ActiveRun>>>,
    tick_interval: Duration,
}

impl SessionRunner {
    pub fn new(store: SessionStore, channel: RunningInfoChannel) -> Self {
        Self::with_tick_interval(store, channel, DEFAULT_TICK_INTERVAL)
    }

    pub fn with_tick_interval(
        store: SessionStore,
        channel: RunningInfoChannel,
        tick_interval: Duration,
    ) -> Self {
        Self {
            store,
            channel,
            active: Arc::new(Mutex::new(None)),
            tick_interval,
        }
    }

    pub fn channel(&self) -> &RunningInfoChannel {
        &self.channel
    }

    /// Marks the session running and starts it in the background.
    ///
    /// Returns as soon as the task is spawned.
    pub async fn start(&self, session_id: u64) -> Result<(), SessionError> {
        let mut active = self.active.lock().await;
        if let Some(run) = active.as_ref() {
            if !run.handle.is_finished() {
                warn!(
                    "refusing to start session {session_id}: session {} is running",
                    run.session_id
                );
                return Err(SessionError::AlreadyRunning(run.session_id));
            }
        }

        let session = self
            .store
            .get(session_id)
            .ok_or(SessionError::NotFound(session_id))?;
        if session.status != SessionStatus::Pending {
            return Err(SessionError::InvalidState {
                id: session.id,
                status: session.status,
            });
        }

        let phases = plan_phases(&session);
        self.store.set_status(session.id, SessionStatus::Running)?;
        // Running never shows without its running info.
        if let Some(first) = phases.first() {
            publish_phase(&self.channel, session.id, first);
        }
        info!(
            "starting session {} ({} rounds of {}m/{}m)",
            session.id, session.rounds, session.focus_minutes, session.break_minutes
        );

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(drive_session(
            session,
            phases,
            self.store.clone(),
            self.channel.clone(),
            cancel_token.clone(),
            self.tick_interval,
        ));

        *active = Some(ActiveRun {
            session_id,
            handle,
            cancel_token,
        });
        Ok(())
    }

    /// Cancels the running session and waits for its rollback.
    ///
    /// Does nothing when no session is running.
    pub async fn cancel(&self) {
        let mut active = self.active.lock().await;
        let Some(run) = active.take() else {
            debug!("cancel requested with nothing running");
            return;
        };

        run.cancel_token.cancel();
        if let Err(err) = run.handle.await {
            error!("session {} task failed: {err}", run.session_id);
            self.channel.clear();
            if self
                .store
                .get(run.session_id)
                .is_some_and(|session| session.status == SessionStatus::Running)
            {
                if let Err(err) = self.store.set_status(run.session_id, SessionStatus::Pending) {
                    error!("failed to roll back session {}: {err}", run.session_id);
                }
            }
        }
    }

    /// Cancels any running session before the process exits.
    pub async fn shutdown(&self) {
        if self.is_running().await {
            info!("shutting down with a running session; rolling back");
        }
        self.cancel().await;
    }

    pub async fn is_running(&self) -> bool {
        self.active_session_id().await.is_some()
    }

    pub async fn active_session_id(&self) -> Option<u64> {
        self.active
            .lock()
            .await
            .as_ref()
            .filter(|run| !run.handle.is_finished())
            .map(|run| run.session_id)
    }

    /// Status line for the running phase, if any.
    pub fn status_line(&self, now: DateTime<Utc>) -> Option<String> {
        self.channel.render(now, &self.store)
    }
}

fn publish_phase(channel: &RunningInfoChannel, session_id: u64, planned: &PlannedPhase) {
    channel.publish(
        session_id,
        planned.phase,
        planned.duration_secs,
        planned.round,
        planned.total_rounds,
    );
    debug!(
        "session {session_id}: {} phase, round {}/{}",
        planned.phase.label(),
        planned.round,
        planned.total_rounds
    );
}

/// Runs `phases` in order. The first phase was already published by
/// [`SessionRunner::start`].
async fn drive_session(
    session: Session,
    phases: Vec<PlannedPhase>,
    store: SessionStore,
    channel: RunningInfoChannel,
    cancel_token: CancellationToken,
    tick_interval: Duration,
) {
    for (index, planned) in phases.iter().enumerate() {
        if index > 0 {
            publish_phase(&channel, session.id, planned);
        }

        let wait = Duration::from_secs(planned.duration_secs);
        if wait_phase(wait, tick_interval, &cancel_token).await == WaitOutcome::Cancelled {
            channel.clear();
            if let Err(err) = store.set_status(session.id, SessionStatus::Pending) {
                error!("failed to roll back session {}: {err}", session.id);
            }
            info!("session {} cancelled; back to pending", session.id);
            return;
        }
    }

    channel.clear();
    if let Err(err) = store.set_status(session.id, SessionStatus::Completed) {
        error!("failed to complete session {}: {err}", session.id);
        return;
    }
    info!("session {} completed", session.id);
}
