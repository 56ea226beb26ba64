use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::Session;

use super::Phase;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedPhase {
    pub phase: Phase,
    pub duration_secs: u64,
    pub round: u32,
    pub total_rounds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed,
    Cancelled,
}

/// Focus for every round, with a break after each round except the last.
pub fn plan_phases(session: &Session) -> Vec<PlannedPhase> {
    let total_rounds = session.rounds;
    let mut phases = Vec::with_capacity((2 * total_rounds as usize).saturating_sub(1));

    for round in 1..=total_rounds {
        phases.push(PlannedPhase {
            phase: Phase::Focus,
            duration_secs: u64::from(session.focus_minutes) * 60,
            round,
            total_rounds,
        });
        if round < total_rounds {
            phases.push(PlannedPhase {
                phase: Phase::Break,
                duration_secs: u64::from(session.break_minutes) * 60,
                round,
                total_rounds,
            });
        }
    }

    phases
}

/// Waits for `duration` or until `cancel_token` fires.
///
/// The deadline is checked every `tick`, so a phase never overruns by more
/// than one tick. Cancellation wakes the wait right away.
pub async fn wait_phase(
    duration: Duration,
    tick: Duration,
    cancel_token: &CancellationToken,
) -> WaitOutcome {
    if cancel_token.is_cancelled() {
        return WaitOutcome::Cancelled;
    }

    let deadline = Instant::now() + duration;
    let mut ticker = time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return WaitOutcome::Cancelled,
            _ = ticker.tick() => {
                if Instant::now() >= deadline {
                    return WaitOutcome::Completed;
                }
            }
        }
    }
}
