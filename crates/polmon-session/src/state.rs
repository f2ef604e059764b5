//! Acquisition session states.
//!
//! ```text
//! CONFIGURING → (SWEEP_START → POLLING → FETCHING → ANALYZING → LOGGING)* → CLOSED
//! ```
//!
//! Any fatal error jumps straight to `CLOSED`.

use std::fmt;

use serde::Serialize;

/// State of an acquisition session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Configuring,
    SweepStart,
    Polling,
    Fetching,
    Analyzing,
    Logging,
    Closed,
}

impl SessionState {
    /// Whether moving from `self` to `next` follows the state machine.
    #[must_use]
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Configuring, SweepStart)
            | (SweepStart, Polling)
            | (Polling, Fetching)
            | (Fetching, Analyzing)
            | (Analyzing, Logging)
            | (Logging, SweepStart) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuring => "CONFIGURING",
            Self::SweepStart => "SWEEP_START",
            Self::Polling => "POLLING",
            Self::Fetching => "FETCHING",
            Self::Analyzing => "ANALYZING",
            Self::Logging => "LOGGING",
            Self::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}
