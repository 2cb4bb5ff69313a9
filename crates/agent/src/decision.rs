//! Continuation decisions
//!
//! Decides after every turn whether engaging the scammer further is still
//! worthwhile, and scores how much actionable intelligence the session holds.
//!
//! Checks run in a fixed order and the first one that fires wins:
//! 1. Threat keyword in the last inbound message
//! 2. Turn budget exhausted
//! 3. Intel score at target
//! 4. Intel score good enough near the turn limit
//! 5. Stagnation (many turns, almost no intel)
//! 6. Otherwise keep going

use scamshield_config::constants::decision as consts;
use scamshield_config::DecisionSettings;
use scamshield_core::intelligence::round2;
use scamshield_core::{
    ConversationMessage, DecisionReason, DecisionVerdict, EntityType, MessageRole,
    SessionIntelligence,
};
use serde::{Deserialize, Serialize};

/// How engaged the counterparty has been
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    None,
    Minimal,
    Moderate,
    High,
}

impl EngagementLevel {
    fn from_messages(count: usize) -> Self {
        match count {
            0 => EngagementLevel::None,
            1 => EngagementLevel::Minimal,
            2..=5 => EngagementLevel::Moderate,
            _ => EngagementLevel::High,
        }
    }

    fn weight(&self) -> f32 {
        match self {
            EngagementLevel::High => 1.0,
            EngagementLevel::Moderate => 0.5,
            EngagementLevel::Minimal | EngagementLevel::None => 0.0,
        }
    }
}

/// Quality assessment of a conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationQuality {
    pub quality_score: f32,
    pub engagement_level: EngagementLevel,
    /// Average scammer message length in characters
    pub avg_scammer_msg_length: usize,
    pub avg_agent_msg_length: usize,
    pub scammer_messages: usize,
    pub agent_messages: usize,
}

/// Words in a tactic that make it suitable for eliciting a type
fn tactic_keywords(entity_type: EntityType) -> &'static [&'static str] {
    match entity_type {
        EntityType::Upi => &["upi", "gpay", "paytm", "pay", "transfer"],
        EntityType::BankAccount => &["account", "bank", "transfer", "deposit"],
        EntityType::Phone => &["call", "phone", "whatsapp", "number"],
        EntityType::Ifsc => &["branch", "bank", "ifsc"],
        EntityType::PhishingLink => &["link", "website", "click"],
        EntityType::Email | EntityType::Other => &[],
    }
}

/// Continue/stop decision engine
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    settings: DecisionSettings,
    /// Lower-cased copy of the configured threat keywords
    threat_keywords: Vec<String>,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DecisionSettings::default())
    }
}

impl DecisionEngine {
    pub fn new(settings: DecisionSettings) -> Self {
        let threat_keywords = settings
            .threat_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            settings,
            threat_keywords,
        }
    }

    pub fn settings(&self) -> &DecisionSettings {
        &self.settings
    }

    /// Decide whether to keep engaging
    ///
    /// `max_turns` of `None` or `Some(0)` falls back to the configured limit.
    /// A threat keyword in `last_message` stops the conversation regardless of
    /// every other signal.
    pub fn should_continue(
        &self,
        turn_count: u32,
        intel: &SessionIntelligence,
        max_turns: Option<u32>,
        last_message: Option<&str>,
    ) -> DecisionVerdict {
        let max_turns = max_turns
            .filter(|m| *m > 0)
            .unwrap_or(self.settings.max_turns);

        if let Some(keyword) = last_message.and_then(|m| self.threat_keyword(m)) {
            tracing::warn!(keyword, turn_count, "Threat detected in scammer message");
            return DecisionVerdict::stop(DecisionReason::ThreatDetected);
        }

        if turn_count >= max_turns {
            tracing::info!(turn_count, max_turns, "Max turns reached");
            return DecisionVerdict::stop(DecisionReason::MaxTurnsReached);
        }

        let intel_score = self.calculate_intel_score(intel);

        if intel_score >= self.settings.target_score {
            tracing::info!(intel_score, target = self.settings.target_score, "Target intel score achieved");
            return DecisionVerdict::stop(DecisionReason::GoalAchieved);
        }

        let near_limit = turn_count >= max_turns.saturating_sub(consts::NEAR_LIMIT_WINDOW);
        if intel_score >= self.settings.min_success_score && near_limit {
            tracing::info!(intel_score, turn_count, "Sufficient intel near max turns");
            return DecisionVerdict::stop(DecisionReason::GoalAchieved);
        }

        if turn_count >= self.settings.stagnation_turns && intel_score < self.settings.stagnation_score {
            tracing::info!(turn_count, intel_score, "No significant intel, giving up");
            return DecisionVerdict::stop(DecisionReason::NoProgress);
        }

        DecisionVerdict::proceed()
    }

    /// Weighted, confidence-adjusted intelligence score in [0, 1]
    pub fn calculate_intel_score(&self, intel: &SessionIntelligence) -> f32 {
        if intel.is_empty() {
            return 0.0;
        }

        let mut score = 0.0;
        for (entity_type, weight) in self.settings.weights.ranked() {
            let count = intel.count(entity_type);
            if count == 0 {
                continue;
            }

            let mut type_score = weight;
            if count > 1 {
                let extra = count.min(consts::MULTI_ENTITY_CAP) - 1;
                type_score *= 1.0 + extra as f32 * consts::MULTI_ENTITY_STEP;
            }

            let avg_confidence = intel.type_confidence(entity_type).unwrap_or(0.5);
            type_score *= 0.5 + avg_confidence * 0.5;

            score += type_score;
        }

        if intel.has(EntityType::BankAccount) && intel.has(EntityType::Ifsc) {
            score += consts::BANK_IFSC_BONUS;
        }
        if intel.has(EntityType::Upi) && intel.has(EntityType::Phone) {
            score += consts::UPI_PHONE_BONUS;
        }

        round2(score.clamp(0.0, 1.0))
    }

    pub fn detect_threat(&self, message: &str) -> bool {
        self.threat_keyword(message).is_some()
    }

    /// First configured threat keyword contained in `message`
    pub fn threat_keyword(&self, message: &str) -> Option<&str> {
        if message.is_empty() {
            return None;
        }
        let lower = message.to_lowercase();
        self.threat_keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Weighted types not yet extracted, most valuable first
    pub fn get_extraction_priority(&self, intel: &SessionIntelligence) -> Vec<EntityType> {
        self.settings
            .weights
            .ranked()
            .into_iter()
            .map(|(t, _)| t)
            .filter(|t| !intel.has(*t))
            .collect()
    }

    /// Pick the tactic best suited to the most valuable missing entity
    ///
    /// Falls back to rotating through `tactics` by turn count when no tactic
    /// mentions a missing type.
    pub fn get_next_tactic<'a>(
        &self,
        turn_count: u32,
        intel: &SessionIntelligence,
        tactics: &'a [String],
    ) -> Option<&'a str> {
        if tactics.is_empty() {
            return None;
        }

        for missing in self.get_extraction_priority(intel) {
            let keywords = tactic_keywords(missing);
            let hit = tactics.iter().find(|tactic| {
                let lower = tactic.to_lowercase();
                keywords.iter().any(|kw| lower.contains(kw))
            });
            if let Some(tactic) = hit {
                return Some(tactic.as_str());
            }
        }

        Some(tactics[turn_count as usize % tactics.len()].as_str())
    }

    pub fn assess_conversation_quality(&self, history: &[ConversationMessage]) -> ConversationQuality {
        let scammer: Vec<&ConversationMessage> = history
            .iter()
            .filter(|m| m.role == MessageRole::Scammer)
            .collect();
        let agent: Vec<&ConversationMessage> = history
            .iter()
            .filter(|m| m.role == MessageRole::Agent)
            .collect();

        let engagement_level = EngagementLevel::from_messages(history.len());
        if history.is_empty() {
            return ConversationQuality {
                quality_score: 0.0,
                engagement_level,
                avg_scammer_msg_length: 0,
                avg_agent_msg_length: 0,
                scammer_messages: 0,
                agent_messages: 0,
            };
        }

        let scammer_avg = average_chars(&scammer);
        let agent_avg = average_chars(&agent);

        let quality = 0.2 * (history.len() as f32 / 10.0).min(1.0)
            + 0.3 * (scammer_avg / 100.0).min(1.0)
            + if scammer.is_empty() { 0.0 } else { 0.3 }
            + 0.2 * engagement_level.weight();

        ConversationQuality {
            quality_score: round2(quality.min(1.0)),
            engagement_level,
            avg_scammer_msg_length: scammer_avg.round() as usize,
            avg_agent_msg_length: agent_avg.round() as usize,
            scammer_messages: scammer.len(),
            agent_messages: agent.len(),
        }
    }
}

fn average_chars(messages: &[&ConversationMessage]) -> f32 {
    if messages.is_empty() {
        return 0.0;
    }
    let total: usize = messages.iter().map(|m| m.content.chars().count()).sum();
    total as f32 / messages.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use scamshield_core::EntityRecord;

    fn intel_of(entries: &[(EntityType, &str, f32)]) -> SessionIntelligence {
        entries
            .iter()
            .map(|(t, v, c)| EntityRecord::new(*t, *v, *v, *c))
            .collect()
    }

    #[test]
    fn test_no_progress_before_max_turns() {
        let engine = DecisionEngine::default();
        let verdict = engine.should_continue(6, &SessionIntelligence::new(), Some(10), None);
        assert_eq!(verdict, DecisionVerdict::stop(DecisionReason::NoProgress));
    }

    #[test]
    fn test_threat_overrides_everything() {
        let engine = DecisionEngine::default();
        let rich = intel_of(&[
            (EntityType::BankAccount, "123456789012", 1.0),
            (EntityType::Ifsc, "SBIN0001234", 1.0),
            (EntityType::Upi, "x@ybl", 1.0),
        ]);

        for message in ["I will go to the Cyber Cell", "nice try, honeypot"] {
            for (turn, intel) in [(1, SessionIntelligence::new()), (50, rich.clone())] {
                let verdict = engine.should_continue(turn, &intel, Some(10), Some(message));
                assert_eq!(verdict, DecisionVerdict::stop(DecisionReason::ThreatDetected));
            }
        }
        assert!(!engine.detect_threat(""));
        assert_eq!(engine.threat_keyword("I will REPORT you"), Some("report"));
    }

    #[test]
    fn test_max_turns() {
        let engine = DecisionEngine::default();
        let intel = SessionIntelligence::new();
        assert_eq!(
            engine.should_continue(10, &intel, None, None).reason,
            DecisionReason::MaxTurnsReached
        );
        // zero falls back to the configured limit
        assert_eq!(
            engine.should_continue(10, &intel, Some(0), None).reason,
            DecisionReason::MaxTurnsReached
        );
        assert_eq!(
            engine.should_continue(3, &intel, Some(3), None).reason,
            DecisionReason::MaxTurnsReached
        );
    }

    #[test]
    fn test_goal_achieved() {
        let engine = DecisionEngine::default();
        let intel = intel_of(&[
            (EntityType::BankAccount, "123456789012", 1.0),
            (EntityType::Ifsc, "SBIN0001234", 1.0),
            (EntityType::Upi, "x@ybl", 1.0),
        ]);
        assert_eq!(engine.calculate_intel_score(&intel), 0.7);
        assert_eq!(
            engine.should_continue(3, &intel, None, Some("ok send now")),
            DecisionVerdict::stop(DecisionReason::GoalAchieved)
        );
    }

    #[test]
    fn test_near_limit_success() {
        let engine = DecisionEngine::default();
        let intel = intel_of(&[
            (EntityType::Upi, "a@ybl", 1.0),
            (EntityType::Upi, "b@ybl", 1.0),
            (EntityType::Upi, "c@ybl", 1.0),
        ]);
        assert_eq!(engine.calculate_intel_score(&intel), 0.35);
        assert!(engine.should_continue(7, &intel, Some(10), None).should_continue);
        assert_eq!(
            engine.should_continue(8, &intel, Some(10), None).reason,
            DecisionReason::GoalAchieved
        );
    }

    #[test]
    fn test_ongoing() {
        let engine = DecisionEngine::default();
        let verdict = engine.should_continue(2, &SessionIntelligence::new(), None, Some("hello sir"));
        assert_eq!(verdict, DecisionVerdict::proceed());
    }

    #[test]
    fn test_intel_score() {
        let engine = DecisionEngine::default();
        assert_eq!(engine.calculate_intel_score(&SessionIntelligence::new()), 0.0);

        let single = intel_of(&[(EntityType::Phone, "+919876543210", 1.0)]);
        assert_eq!(engine.calculate_intel_score(&single), 0.2);

        // 0.19 + 0.2375 + 0.05 combo
        let pair = intel_of(&[
            (EntityType::Phone, "+919876543210", 0.9),
            (EntityType::Upi, "x@ybl", 0.9),
        ]);
        assert_eq!(engine.calculate_intel_score(&pair), 0.48);

        // diminishing returns stop at three
        let five: Vec<(EntityType, &str, f32)> = ["a@ybl", "b@ybl", "c@ybl", "d@ybl", "e@ybl"]
            .iter()
            .map(|v| (EntityType::Upi, *v, 1.0))
            .collect();
        assert_eq!(engine.calculate_intel_score(&intel_of(&five)), 0.35);

        // `other` carries no weight
        let other = intel_of(&[(EntityType::Other, "ABCPE1234F", 0.85)]);
        assert_eq!(engine.calculate_intel_score(&other), 0.0);
    }

    #[test]
    fn test_extraction_priority() {
        let engine = DecisionEngine::default();
        assert_eq!(
            engine.get_extraction_priority(&SessionIntelligence::new()),
            vec![
                EntityType::Upi,
                EntityType::BankAccount,
                EntityType::Phone,
                EntityType::PhishingLink,
                EntityType::Ifsc,
                EntityType::Email,
            ]
        );

        let intel = intel_of(&[(EntityType::Upi, "x@ybl", 0.9)]);
        let priorities = engine.get_extraction_priority(&intel);
        assert_eq!(priorities.first(), Some(&EntityType::BankAccount));
        assert!(!priorities.contains(&EntityType::Upi));
    }

    #[test]
    fn test_next_tactic() {
        let engine = DecisionEngine::default();
        let tactics = vec![
            "Ask for their phone number".to_string(),
            "Ask which bank account to deposit into".to_string(),
            "Stall".to_string(),
        ];
        let empty = SessionIntelligence::new();

        assert_eq!(engine.get_next_tactic(1, &empty, &[]), None);
        assert_eq!(
            engine.get_next_tactic(1, &empty, &tactics),
            Some("Ask which bank account to deposit into")
        );

        let full = intel_of(&[
            (EntityType::Upi, "x@ybl", 0.9),
            (EntityType::BankAccount, "123456789012", 0.9),
            (EntityType::Phone, "+919876543210", 0.9),
            (EntityType::PhishingLink, "http://x.xyz", 0.9),
            (EntityType::Ifsc, "SBIN0001234", 0.9),
            (EntityType::Email, "a@b.com", 0.9),
        ]);
        assert_eq!(engine.get_next_tactic(4, &full, &tactics), Some("Ask which bank account to deposit into"));
        assert_eq!(engine.get_next_tactic(5, &full, &tactics), Some("Stall"));
    }

    #[test]
    fn test_conversation_quality() {
        let engine = DecisionEngine::default();

        let empty = engine.assess_conversation_quality(&[]);
        assert_eq!(empty.engagement_level, EngagementLevel::None);
        assert_eq!(empty.quality_score, 0.0);

        let long = "x".repeat(100);
        let history: Vec<ConversationMessage> = (0..6)
            .map(|i| {
                if i % 2 == 0 {
                    ConversationMessage::scammer(long.clone())
                } else {
                    ConversationMessage::agent("ok")
                }
            })
            .collect();

        let quality = engine.assess_conversation_quality(&history);
        assert_eq!(quality.engagement_level, EngagementLevel::High);
        assert_eq!(quality.scammer_messages, 3);
        assert_eq!(quality.agent_messages, 3);
        assert_eq!(quality.avg_scammer_msg_length, 100);
        assert_eq!(quality.avg_agent_msg_length, 2);
        // 0.12 + 0.3 + 0.3 + 0.2
        assert_eq!(quality.quality_score, 0.92);

        let short = engine.assess_conversation_quality(&[ConversationMessage::agent("hi")]);
        assert_eq!(short.engagement_level, EngagementLevel::Minimal);
    }
}
