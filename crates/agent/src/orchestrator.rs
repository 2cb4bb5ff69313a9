//! Per-turn orchestration
//!
//! One turn runs classify, extract, merge, score, decide and transition in
//! that order. Nothing here performs I/O; the result is a value the caller
//! persists (or discards) as a whole.

use crate::decision::DecisionEngine;
use crate::state_machine::ConversationStateMachine;
use scamshield_config::constants::decision::INTEL_EXTRACTED_SCORE;
use scamshield_config::Settings;
use scamshield_core::{
    ConversationEvent, ConversationMessage, ConversationState, DecisionReason, DecisionVerdict,
    EntityType, ScamClassification, SessionIntelligence, TransitionRecord,
};
use scamshield_detection::ScamClassifier;
use scamshield_intelligence::{EntityExtractor, ExtractionOptions, IntelligenceAggregator};
use serde::{Deserialize, Serialize};

/// Input for one turn
#[derive(Debug, Clone, Copy)]
pub struct TurnInput<'a> {
    pub scammer_message: &'a str,
    /// 1-based number of this turn
    pub turn_count: u32,
    pub prior_intelligence: &'a SessionIntelligence,
    /// Message checked for threat keywords; the scammer message when `None`
    pub threat_check_message: Option<&'a str>,
    pub current_state: ConversationState,
    /// Earlier messages, oldest first
    pub history: &'a [ConversationMessage],
}

/// Result of one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub classification: ScamClassification,
    /// Entities extracted in this turn alone
    pub new_entities: SessionIntelligence,
    pub merged_intelligence: SessionIntelligence,
    pub intel_score: f32,
    pub verdict: DecisionVerdict,
    /// Types still missing, most valuable first
    pub priorities: Vec<EntityType>,
    pub previous_state: ConversationState,
    pub next_state: ConversationState,
    /// Transitions applied during this turn
    pub transitions: Vec<TransitionRecord>,
}

/// Event that reflects a verdict, if any
fn verdict_event(verdict: &DecisionVerdict, intel_score: f32) -> Option<ConversationEvent> {
    match verdict.reason {
        DecisionReason::ThreatDetected => Some(ConversationEvent::ThreatDetected),
        DecisionReason::MaxTurnsReached => Some(ConversationEvent::MaxTurns),
        DecisionReason::GoalAchieved => Some(ConversationEvent::GoalAchieved),
        DecisionReason::NoProgress => Some(ConversationEvent::ScammerDisengaged),
        DecisionReason::Ongoing if intel_score >= INTEL_EXTRACTED_SCORE => {
            Some(ConversationEvent::IntelExtracted)
        }
        DecisionReason::Ongoing => None,
    }
}

/// Runs the intelligence pipeline for one turn
///
/// Holds only immutable components, so one processor can be shared by every
/// session.
#[derive(Debug, Clone)]
pub struct TurnProcessor {
    classifier: ScamClassifier,
    extractor: EntityExtractor,
    aggregator: IntelligenceAggregator,
    decision: DecisionEngine,
    /// Extract from all inbound history, not just the current message
    extract_across_history: bool,
}

impl Default for TurnProcessor {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl TurnProcessor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            classifier: ScamClassifier::new(),
            extractor: EntityExtractor::with_options(ExtractionOptions::from(&settings.intelligence)),
            aggregator: IntelligenceAggregator::from(&settings.intelligence),
            decision: DecisionEngine::new(settings.decision.clone()),
            extract_across_history: settings.agent.extract_across_history,
        }
    }

    pub fn classifier(&self) -> &ScamClassifier {
        &self.classifier
    }

    pub fn extractor(&self) -> &EntityExtractor {
        &self.extractor
    }

    pub fn aggregator(&self) -> &IntelligenceAggregator {
        &self.aggregator
    }

    pub fn decision(&self) -> &DecisionEngine {
        &self.decision
    }

    pub fn process_turn(&self, input: &TurnInput<'_>) -> TurnOutcome {
        let classification = self.classifier.classify(input.scammer_message);

        let new_entities = if self.extract_across_history {
            let mut messages = input.history.to_vec();
            messages.push(ConversationMessage::scammer(input.scammer_message));
            self.extractor.extract_from_conversation(&messages, true)
        } else {
            self.extractor.extract_all(input.scammer_message)
        };

        let merged_intelligence =
            self.aggregator
                .merge(input.prior_intelligence, &new_entities, input.turn_count);

        let intel_score = self.decision.calculate_intel_score(&merged_intelligence);
        let verdict = self.decision.should_continue(
            input.turn_count,
            &merged_intelligence,
            None,
            Some(input.threat_check_message.unwrap_or(input.scammer_message)),
        );
        let priorities = self.decision.get_extraction_priority(&merged_intelligence);

        let mut machine = ConversationStateMachine::with_state(input.current_state);
        if input.current_state == ConversationState::Initial {
            machine.fire(ConversationEvent::Start);
        }
        machine.fire(ConversationEvent::MessageReceived);
        if let Some(event) = verdict_event(&verdict, intel_score) {
            machine.fire(event);
        }
        let next_state = machine.current_state();

        tracing::info!(
            turn = input.turn_count,
            is_scam = classification.is_scam,
            category = %classification.category,
            new_entities = new_entities.total_entities(),
            total_entities = merged_intelligence.total_entities(),
            intel_score,
            reason = %verdict.reason,
            state = %next_state,
            "Turn processed"
        );

        TurnOutcome {
            classification,
            new_entities,
            merged_intelligence,
            intel_score,
            verdict,
            priorities,
            previous_state: input.current_state,
            next_state,
            transitions: machine.take_history(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scamshield_core::{EntityRecord, ScamCategory};

    fn turn<'a>(
        message: &'a str,
        turn_count: u32,
        prior: &'a SessionIntelligence,
        state: ConversationState,
    ) -> TurnInput<'a> {
        TurnInput {
            scammer_message: message,
            turn_count,
            prior_intelligence: prior,
            threat_check_message: None,
            current_state: state,
            history: &[],
        }
    }

    #[test]
    fn test_first_turn_starts_conversation() {
        let processor = TurnProcessor::default();
        let empty = SessionIntelligence::new();
        let outcome = processor.process_turn(&turn(
            "Your KYC is expiring, click link to update",
            1,
            &empty,
            ConversationState::Initial,
        ));

        assert!(outcome.classification.is_scam);
        assert_eq!(outcome.classification.category, ScamCategory::KycPhishing);
        assert_eq!(outcome.verdict, DecisionVerdict::proceed());
        assert_eq!(outcome.next_state, ConversationState::Ongoing);
        let events: Vec<_> = outcome.transitions.iter().map(|t| t.event).collect();
        assert_eq!(
            events,
            vec![ConversationEvent::Start, ConversationEvent::MessageReceived]
        );
    }

    #[test]
    fn test_intel_moves_to_extracted() {
        let processor = TurnProcessor::default();
        let empty = SessionIntelligence::new();
        let outcome = processor.process_turn(&turn(
            "Call 9876543210 or pay to user@ybl",
            2,
            &empty,
            ConversationState::Ongoing,
        ));

        assert_eq!(outcome.new_entities.total_entities(), 2);
        assert_eq!(outcome.merged_intelligence.total_entities(), 2);
        assert!(outcome.intel_score >= 0.3 && outcome.intel_score < 0.6);
        assert!(outcome.verdict.should_continue);
        assert_eq!(outcome.next_state, ConversationState::IntelligenceExtracted);
        assert_eq!(
            outcome.priorities,
            vec![
                EntityType::BankAccount,
                EntityType::PhishingLink,
                EntityType::Ifsc,
                EntityType::Email,
            ]
        );
    }

    #[test]
    fn test_threat_check_message() {
        let processor = TurnProcessor::default();
        let empty = SessionIntelligence::new();

        let outcome = processor.process_turn(&turn(
            "I know you are wasting my time, cyber cell is tracing you",
            3,
            &empty,
            ConversationState::Ongoing,
        ));
        assert_eq!(outcome.verdict.reason, DecisionReason::ThreatDetected);
        assert_eq!(outcome.next_state, ConversationState::ThreatDetected);

        let mut input = turn("hello sir", 3, &empty, ConversationState::Ongoing);
        input.threat_check_message = Some("this is a honeypot");
        let outcome = processor.process_turn(&input);
        assert_eq!(outcome.next_state, ConversationState::ThreatDetected);
    }

    #[test]
    fn test_stagnation_disengages_then_reengages() {
        let processor = TurnProcessor::default();
        let empty = SessionIntelligence::new();

        let outcome = processor.process_turn(&turn(
            "hello how are you",
            6,
            &empty,
            ConversationState::Ongoing,
        ));
        assert_eq!(outcome.verdict.reason, DecisionReason::NoProgress);
        assert_eq!(outcome.next_state, ConversationState::Disengaged);

        let outcome = processor.process_turn(&turn(
            "are you there sir?",
            2,
            &empty,
            ConversationState::Disengaged,
        ));
        assert_eq!(outcome.next_state, ConversationState::Ongoing);
    }

    #[test]
    fn test_goal_completes_session() {
        let processor = TurnProcessor::default();
        let prior: SessionIntelligence = vec![
            EntityRecord::new(EntityType::Upi, "x@ybl", "x@ybl", 0.92),
            EntityRecord::new(EntityType::Phone, "9876543210", "+919876543210", 0.95),
        ]
        .into_iter()
        .collect();

        let outcome = processor.process_turn(&turn(
            "Send to A/C No: 50100234567891 IFSC: HDFC0001234",
            3,
            &prior,
            ConversationState::IntelligenceExtracted,
        ));
        assert_eq!(outcome.new_entities.total_entities(), 2);
        assert_eq!(outcome.verdict.reason, DecisionReason::GoalAchieved);
        assert_eq!(outcome.next_state, ConversationState::Completed);
    }

    #[test]
    fn test_max_turns() {
        let processor = TurnProcessor::default();
        let empty = SessionIntelligence::new();
        let outcome = processor.process_turn(&turn(
            "ok tell me",
            10,
            &empty,
            ConversationState::IntelligenceExtracted,
        ));
        assert_eq!(outcome.verdict.reason, DecisionReason::MaxTurnsReached);
        assert_eq!(outcome.next_state, ConversationState::MaxTurnsReached);
    }

    #[test]
    fn test_extract_across_history() {
        let mut settings = Settings::default();
        settings.agent.extract_across_history = true;
        let processor = TurnProcessor::new(&settings);

        let history = vec![
            ConversationMessage::scammer("my number is 9123456780"),
            ConversationMessage::agent("ok ji 9988776655"),
        ];
        let empty = SessionIntelligence::new();
        let mut input = turn("now pay to refund@ybl", 2, &empty, ConversationState::Ongoing);
        input.history = &history;

        let outcome = processor.process_turn(&input);
        assert_eq!(outcome.new_entities.count(EntityType::Phone), 1);
        assert_eq!(outcome.new_entities.count(EntityType::Upi), 1);
    }

    #[test]
    fn test_aggregator_uses_configured_threshold() {
        let mut settings = Settings::default();
        settings.intelligence.high_confidence_threshold = 0.6;
        let processor = TurnProcessor::new(&settings);
        assert_eq!(processor.aggregator().high_confidence_threshold(), 0.6);
    }
}
