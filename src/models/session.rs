use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Pending,
    Running,
    Completed,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Pending
    }
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-defined pomodoro: `rounds` focus phases separated by breaks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: u64,
    pub title: String,
    pub focus_minutes: u32,
    pub break_minutes: u32,
    pub rounds: u32,
    pub status: SessionStatus,
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session {} [{}] - focus {}m / break {}m x {} rounds ({})",
            self.id, self.title, self.focus_minutes, self.break_minutes, self.rounds, self.status
        )
    }
}
