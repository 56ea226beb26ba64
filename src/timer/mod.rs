pub mod controller;
pub mod schedule;
pub mod state;

pub use controller::SessionRunner;
pub use schedule::{plan_phases, wait_phase, PlannedPhase, WaitOutcome};
pub use state::{Phase, RunningInfo, RunningInfoChannel};
