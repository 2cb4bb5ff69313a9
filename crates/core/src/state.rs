//! Conversation states and events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversation lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    /// Session created, no messages yet
    #[default]
    Initial,
    Ongoing,
    /// Valuable intelligence has been captured
    IntelligenceExtracted,
    Completed,
    MaxTurnsReached,
    /// Scammer appears to suspect a trap
    ThreatDetected,
    /// Scammer went quiet or made no progress
    Disengaged,
    Terminated,
    Error,
}

impl ConversationState {
    pub const COUNT: usize = 9;

    pub fn all() -> &'static [ConversationState] {
        &[
            ConversationState::Initial,
            ConversationState::Ongoing,
            ConversationState::IntelligenceExtracted,
            ConversationState::Completed,
            ConversationState::MaxTurnsReached,
            ConversationState::ThreatDetected,
            ConversationState::Disengaged,
            ConversationState::Terminated,
            ConversationState::Error,
        ]
    }

    /// Row index in transition tables
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Initial => "INITIAL",
            ConversationState::Ongoing => "ONGOING",
            ConversationState::IntelligenceExtracted => "INTELLIGENCE_EXTRACTED",
            ConversationState::Completed => "COMPLETED",
            ConversationState::MaxTurnsReached => "MAX_TURNS_REACHED",
            ConversationState::ThreatDetected => "THREAT_DETECTED",
            ConversationState::Disengaged => "DISENGAGED",
            ConversationState::Terminated => "TERMINATED",
            ConversationState::Error => "ERROR",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// No outgoing transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationState::Completed | ConversationState::Terminated)
    }

    /// Conversation may still receive scammer messages
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ConversationState::Initial
                | ConversationState::Ongoing
                | ConversationState::IntelligenceExtracted
                | ConversationState::Disengaged
        )
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that drive state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationEvent {
    Start,
    MessageReceived,
    ResponseSent,
    IntelExtracted,
    MaxTurns,
    ThreatDetected,
    ScammerDisengaged,
    GoalAchieved,
    ManualTerminate,
    ErrorOccurred,
}

impl ConversationEvent {
    pub const COUNT: usize = 10;

    pub fn all() -> &'static [ConversationEvent] {
        &[
            ConversationEvent::Start,
            ConversationEvent::MessageReceived,
            ConversationEvent::ResponseSent,
            ConversationEvent::IntelExtracted,
            ConversationEvent::MaxTurns,
            ConversationEvent::ThreatDetected,
            ConversationEvent::ScammerDisengaged,
            ConversationEvent::GoalAchieved,
            ConversationEvent::ManualTerminate,
            ConversationEvent::ErrorOccurred,
        ]
    }

    /// Column index in transition tables
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationEvent::Start => "start",
            ConversationEvent::MessageReceived => "message_received",
            ConversationEvent::ResponseSent => "response_sent",
            ConversationEvent::IntelExtracted => "intel_extracted",
            ConversationEvent::MaxTurns => "max_turns",
            ConversationEvent::ThreatDetected => "threat_detected",
            ConversationEvent::ScammerDisengaged => "scammer_disengaged",
            ConversationEvent::GoalAchieved => "goal_achieved",
            ConversationEvent::ManualTerminate => "manual_terminate",
            ConversationEvent::ErrorOccurred => "error_occurred",
        }
    }

    /// Parse an event name; `None` for names outside the enum
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|e| e.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for ConversationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One applied transition, kept for audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: ConversationState,
    pub event: ConversationEvent,
    pub to: ConversationState,
    pub at: DateTime<Utc>,
}
