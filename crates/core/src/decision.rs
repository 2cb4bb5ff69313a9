//! Continuation verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a conversation should continue or stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionReason {
    #[default]
    Ongoing,
    MaxTurnsReached,
    GoalAchieved,
    ThreatDetected,
    NoProgress,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::Ongoing => "ONGOING",
            DecisionReason::MaxTurnsReached => "MAX_TURNS_REACHED",
            DecisionReason::GoalAchieved => "GOAL_ACHIEVED",
            DecisionReason::ThreatDetected => "THREAT_DETECTED",
            DecisionReason::NoProgress => "NO_PROGRESS",
        }
    }

    /// Parse a reason code. Unknown or empty codes degrade to `Ongoing`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "MAX_TURNS_REACHED" => DecisionReason::MaxTurnsReached,
            "GOAL_ACHIEVED" => DecisionReason::GoalAchieved,
            "THREAT_DETECTED" => DecisionReason::ThreatDetected,
            "NO_PROGRESS" => DecisionReason::NoProgress,
            _ => DecisionReason::Ongoing,
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Continue/stop decision, recomputed every turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionVerdict {
    pub should_continue: bool,
    pub reason: DecisionReason,
}

impl DecisionVerdict {
    pub fn proceed() -> Self {
        Self {
            should_continue: true,
            reason: DecisionReason::Ongoing,
        }
    }

    pub fn stop(reason: DecisionReason) -> Self {
        Self {
            should_continue: false,
            reason,
        }
    }
}

impl Default for DecisionVerdict {
    fn default() -> Self {
        Self::proceed()
    }
}
