//! Conversation state machine
//!
//! Lookup table of `(state, event) -> state`. Pairs missing from the table are
//! no-ops: the state is returned unchanged and nothing is recorded, so callers
//! can emit benign events (e.g. `message_received` while already
//! `INTELLIGENCE_EXTRACTED`) without checking first.

use chrono::Utc;
use scamshield_core::{ConversationEvent, ConversationState, TransitionRecord};

type Table = [[Option<ConversationState>; ConversationEvent::COUNT]; ConversationState::COUNT];

static TRANSITIONS: Table = build_table();

const fn build_table() -> Table {
    use scamshield_core::ConversationEvent as E;
    use scamshield_core::ConversationState as S;

    let mut t: Table = [[None; E::COUNT]; S::COUNT];

    t[S::Initial as usize][E::Start as usize] = Some(S::Ongoing);
    t[S::Initial as usize][E::ErrorOccurred as usize] = Some(S::Error);

    t[S::Ongoing as usize][E::MessageReceived as usize] = Some(S::Ongoing);
    t[S::Ongoing as usize][E::ResponseSent as usize] = Some(S::Ongoing);
    t[S::Ongoing as usize][E::IntelExtracted as usize] = Some(S::IntelligenceExtracted);
    t[S::Ongoing as usize][E::MaxTurns as usize] = Some(S::MaxTurnsReached);
    t[S::Ongoing as usize][E::ScammerDisengaged as usize] = Some(S::Disengaged);
    t[S::Ongoing as usize][E::GoalAchieved as usize] = Some(S::Completed);
    t[S::Ongoing as usize][E::ErrorOccurred as usize] = Some(S::Error);

    t[S::IntelligenceExtracted as usize][E::MessageReceived as usize] =
        Some(S::IntelligenceExtracted);
    t[S::IntelligenceExtracted as usize][E::ResponseSent as usize] = Some(S::IntelligenceExtracted);
    t[S::IntelligenceExtracted as usize][E::MaxTurns as usize] = Some(S::MaxTurnsReached);
    t[S::IntelligenceExtracted as usize][E::ScammerDisengaged as usize] = Some(S::Completed);
    t[S::IntelligenceExtracted as usize][E::GoalAchieved as usize] = Some(S::Completed);

    // re-engagement
    t[S::Disengaged as usize][E::MessageReceived as usize] = Some(S::Ongoing);

    t[S::Error as usize][E::Start as usize] = Some(S::Ongoing);

    // threat and manual termination apply from every non-terminal state
    let open = [
        S::Initial,
        S::Ongoing,
        S::IntelligenceExtracted,
        S::MaxTurnsReached,
        S::ThreatDetected,
        S::Disengaged,
        S::Error,
    ];
    let mut i = 0;
    while i < open.len() {
        let s = open[i] as usize;
        if !matches!(open[i], S::ThreatDetected) {
            t[s][E::ThreatDetected as usize] = Some(S::ThreatDetected);
        }
        t[s][E::ManualTerminate as usize] = Some(S::Terminated);
        i += 1;
    }

    t
}

/// Finite state machine with an append-only transition history
#[derive(Debug, Clone, Default)]
pub struct ConversationStateMachine {
    current: ConversationState,
    history: Vec<TransitionRecord>,
}

impl ConversationStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ConversationState) -> Self {
        Self {
            current: state,
            history: Vec::new(),
        }
    }

    pub fn current_state(&self) -> ConversationState {
        self.current
    }

    /// Table lookup without side effects
    pub fn resolve(from: ConversationState, event: ConversationEvent) -> Option<ConversationState> {
        TRANSITIONS[from.index()][event.index()]
    }

    /// Apply `event` to `from`
    ///
    /// Mapped pairs move the machine to the target state and are recorded.
    /// Unmapped pairs return `from` unchanged.
    pub fn transition(
        &mut self,
        from: ConversationState,
        event: ConversationEvent,
    ) -> ConversationState {
        let Some(to) = Self::resolve(from, event) else {
            tracing::debug!(state = %from, event = %event, "No transition for event");
            return from;
        };

        self.history.push(TransitionRecord {
            from,
            event,
            to,
            at: Utc::now(),
        });
        self.current = to;

        if from != to {
            tracing::info!(from = %from, event = %event, to = %to, "State transition");
        }

        to
    }

    /// Apply `event` to the current state
    pub fn fire(&mut self, event: ConversationEvent) -> ConversationState {
        self.transition(self.current, event)
    }

    /// Apply an event given by name; unknown names are no-ops
    pub fn transition_named(&mut self, from: ConversationState, event: &str) -> ConversationState {
        match ConversationEvent::from_name(event) {
            Some(event) => self.transition(from, event),
            None => {
                tracing::debug!(state = %from, event, "Unknown event ignored");
                from
            }
        }
    }

    pub fn can_transition(from: ConversationState, event: ConversationEvent) -> bool {
        Self::resolve(from, event).is_some()
    }

    /// Events with a mapped transition out of `from`
    pub fn valid_events(from: ConversationState) -> Vec<ConversationEvent> {
        ConversationEvent::all()
            .iter()
            .copied()
            .filter(|e| Self::can_transition(from, *e))
            .collect()
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_active()
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// Hand over the recorded history, leaving it empty
    pub fn take_history(&mut self) -> Vec<TransitionRecord> {
        std::mem::take(&mut self.history)
    }

    pub fn reset(&mut self, state: ConversationState) {
        self.current = state;
        self.history.clear();
    }
}
