//! Scam classifier
//!
//! Two scoring paths:
//! - Primary: every category template is scored from keyword and phrase
//!   hits; the best category is boosted by the shared high-risk cues and the
//!   critical-keyword fallback score.
//! - Fallback: when no template matches at all, urgency/payment cues and
//!   critical keywords alone can still flag the message, with the category
//!   inferred from which critical keyword matched.

use crate::rules::{
    CategoryRules, CATEGORY_RULES, CRITICAL_PHRASES, CRITICAL_WORDS, FALLBACK_CATEGORY_CUES,
    HIGH_RISK_PATTERNS,
};
use regex::{Regex, RegexBuilder};
use scamshield_config::constants::classification as limits;
use scamshield_core::intelligence::round2;
use scamshield_core::{RiskLevel, ScamCategory, ScamClassification};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Full analysis of one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScamAnalysis {
    pub classification: ScamClassification,
    /// Every category template scoring above 0.1
    pub category_scores: BTreeMap<ScamCategory, f32>,
    /// `CATEGORY:keyword` hits in rule order
    pub indicators: Vec<String>,
    /// Length in characters
    pub message_length: usize,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone)]
struct CompiledCategory {
    rules: &'static CategoryRules,
    patterns: Vec<Regex>,
}

impl CompiledCategory {
    fn score(&self, lower: &str) -> f32 {
        let keyword_hits = self.rules.keywords.iter().filter(|kw| lower.contains(*kw)).count();
        let pattern_hits = self.patterns.iter().filter(|p| p.is_match(lower)).count();

        let mut score = 0.0;
        if keyword_hits > 0 {
            score += (keyword_hits as f32 * limits::KEYWORD_WEIGHT).min(limits::COMPONENT_CAP);
        }
        if pattern_hits > 0 {
            score += (pattern_hits as f32 * limits::PATTERN_WEIGHT).min(limits::COMPONENT_CAP);
        }
        score
    }
}

/// Rule-based scam classifier
///
/// Patterns are compiled once at construction; the classifier is immutable
/// afterwards and safe to share across sessions.
#[derive(Debug, Clone)]
pub struct ScamClassifier {
    categories: Vec<CompiledCategory>,
    high_risk: Vec<(&'static str, Regex)>,
}

impl Default for ScamClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ScamClassifier {
    pub fn new() -> Self {
        let categories = CATEGORY_RULES
            .iter()
            .map(|rules| CompiledCategory {
                rules,
                patterns: rules.phrases.iter().filter_map(|p| compile(p)).collect(),
            })
            .collect();

        let high_risk = HIGH_RISK_PATTERNS
            .iter()
            .filter_map(|p| compile(p).map(|re| (*p, re)))
            .collect();

        tracing::debug!(categories = CATEGORY_RULES.len(), "ScamClassifier initialized");

        Self {
            categories,
            high_risk,
        }
    }

    /// Classify one message
    ///
    /// Empty messages and messages under 10 characters are never scams.
    pub fn classify(&self, text: &str) -> ScamClassification {
        if text.chars().count() < limits::MIN_MESSAGE_CHARS {
            return ScamClassification::benign();
        }

        let lower = text.to_lowercase();

        let mut best: Option<(ScamCategory, f32)> = None;
        for compiled in &self.categories {
            let score = compiled.score(&lower);
            if score <= 0.0 {
                continue;
            }
            // strictly greater keeps the earlier category on ties
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((compiled.rules.category, score));
            }
        }

        let high_risk_hits: Vec<&'static str> = self
            .high_risk
            .iter()
            .filter(|(_, re)| re.is_match(&lower))
            .map(|(p, _)| *p)
            .collect();
        let high_risk_score =
            (high_risk_hits.len() as f32 * limits::HIGH_RISK_WEIGHT).min(limits::HIGH_RISK_CAP);

        let critical = critical_matches(&lower);
        let fallback_score = fallback_confidence(critical.len());

        let mut indicators: BTreeSet<String> = self.indicators(text).into_iter().collect();
        indicators.extend(high_risk_hits.iter().map(|p| format!("HIGH_RISK:{p}")));
        indicators.extend(critical.iter().map(|c| format!("CRITICAL:{c}")));

        let Some((category, best_score)) = best else {
            if high_risk_score <= 0.0 && fallback_score <= 0.0 {
                return ScamClassification::benign();
            }

            let combined = high_risk_score.max(fallback_score);
            let category = fallback_category(&critical);
            let is_scam = combined >= limits::SCAM_THRESHOLD;
            if is_scam {
                tracing::info!(
                    category = %category,
                    confidence = combined,
                    critical = critical.len(),
                    "Scam flagged by keyword fallback"
                );
            }
            return ScamClassification {
                is_scam,
                category,
                confidence: round2(combined.min(limits::FALLBACK_CAP)),
                matched_indicators: indicators,
            };
        };

        let confidence = (best_score
            + high_risk_score * limits::HIGH_RISK_FACTOR
            + fallback_score * limits::FALLBACK_FACTOR)
            .min(limits::MAX_CONFIDENCE);
        let is_scam = confidence >= limits::SCAM_THRESHOLD;

        if is_scam {
            tracing::info!(
                category = %category,
                confidence = round2(confidence),
                critical = critical.len(),
                "Scam detected"
            );
        }

        ScamClassification {
            is_scam,
            category,
            confidence: round2(confidence),
            matched_indicators: indicators,
        }
    }

    /// Template scores per category, keeping those above 0.1
    pub fn category_scores(&self, text: &str) -> BTreeMap<ScamCategory, f32> {
        if text.is_empty() {
            return BTreeMap::new();
        }
        let lower = text.to_lowercase();
        self.categories
            .iter()
            .map(|c| (c.rules.category, c.score(&lower)))
            .filter(|(_, score)| *score > limits::REPORT_FLOOR)
            .map(|(category, score)| (category, round2(score)))
            .collect()
    }

    /// Every `CATEGORY:keyword` hit
    pub fn indicators(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.categories
            .iter()
            .flat_map(|c| {
                c.rules
                    .keywords
                    .iter()
                    .filter(|kw| lower.contains(*kw))
                    .map(move |kw| format!("{}:{}", c.rules.category.as_str(), kw))
            })
            .collect()
    }

    pub fn analyze(&self, text: &str) -> ScamAnalysis {
        let classification = self.classify(text);
        let risk_level = classification.risk_level();
        ScamAnalysis {
            category_scores: self.category_scores(text),
            indicators: self.indicators(text),
            message_length: text.chars().count(),
            risk_level,
            classification,
        }
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "Invalid scam pattern skipped");
            None
        }
    }
}

/// Critical words (whole whitespace-separated tokens) and phrases present
fn critical_matches(lower: &str) -> BTreeSet<&'static str> {
    let words: BTreeSet<&str> = lower.split_whitespace().collect();
    let mut found: BTreeSet<&'static str> = CRITICAL_WORDS
        .iter()
        .copied()
        .filter(|w| words.contains(w))
        .collect();
    found.extend(CRITICAL_PHRASES.iter().copied().filter(|p| lower.contains(p)));
    found
}

fn fallback_confidence(matches: usize) -> f32 {
    match matches {
        0 => 0.0,
        1 => limits::FALLBACK_SINGLE,
        n => (limits::FALLBACK_BASE + n as f32 * limits::FALLBACK_STEP).min(limits::FALLBACK_CAP),
    }
}

fn fallback_category(critical: &BTreeSet<&'static str>) -> ScamCategory {
    FALLBACK_CATEGORY_CUES
        .iter()
        .find(|(cues, _)| cues.iter().any(|c| critical.contains(c)))
        .map_or(ScamCategory::Unknown, |(_, category)| *category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kyc_expiry_message() {
        let classifier = ScamClassifier::new();
        let result = classifier.classify("Your KYC is expiring, click link to update");

        assert!(result.is_scam);
        assert_eq!(result.category, ScamCategory::KycPhishing);
        assert!(result.confidence >= 0.3);
        // 0.65 template + 0.15 * 0.2 high risk + 0.55 * 0.15 fallback
        assert_eq!(result.confidence, 0.76);
        assert!(result.matched_indicators.contains("KYC_PHISHING:kyc"));
        assert!(result.matched_indicators.contains("HIGH_RISK:click.*link"));
        assert!(result.matched_indicators.contains("CRITICAL:click link"));
    }

    #[test]
    fn test_short_and_empty_messages() {
        let classifier = ScamClassifier::new();
        for text in ["", "otp pls", "   "] {
            let result = classifier.classify(text);
            assert!(!result.is_scam);
            assert_eq!(result.category, ScamCategory::Unknown);
            assert_eq!(result.confidence, 0.0);
        }
    }

    #[test]
    fn test_benign_message() {
        let classifier = ScamClassifier::new();
        let result = classifier.classify("Hello, how are you doing today?");
        assert_eq!(result, ScamClassification::benign());
    }

    #[test]
    fn test_fallback_credential_request() {
        let classifier = ScamClassifier::new();
        let result = classifier.classify("Please share your PIN and password quickly");
        assert!(result.is_scam);
        assert_eq!(result.category, ScamCategory::OtpTheft);
        assert_eq!(result.confidence, 0.55);
    }

    #[test]
    fn test_fallback_blocked_maps_to_kyc() {
        let classifier = ScamClassifier::new();
        let result = classifier.classify("Your card is blocked today, call us");
        assert!(result.is_scam);
        assert_eq!(result.category, ScamCategory::KycPhishing);
        assert_eq!(result.confidence, 0.4);
    }

    #[test]
    fn test_high_risk_cues_alone() {
        let classifier = ScamClassifier::new();
        let result = classifier.classify("Please pay rs 500 and transfer amount quickly");
        assert!(result.is_scam);
        assert_eq!(result.category, ScamCategory::Unknown);
        assert_eq!(result.confidence, 0.3);
    }

    #[test]
    fn test_ties_resolve_to_earlier_category() {
        let classifier = ScamClassifier::new();
        let result = classifier.classify("pay the registration fee now");
        assert_eq!(result.category, ScamCategory::LoanScam);
        assert_eq!(result.confidence, 0.4);

        let scores = classifier.category_scores("pay the registration fee now");
        assert_eq!(scores.get(&ScamCategory::LoanScam), Some(&0.4));
        assert_eq!(scores.get(&ScamCategory::JobScam), Some(&0.4));
    }

    #[test]
    fn test_critical_words_need_whole_tokens() {
        let found = critical_matches("enter your pincode, then verify now");
        assert!(!found.contains("pin"));
        assert!(found.contains("verify now"));
        assert_eq!(fallback_confidence(4), 0.75);
    }

    #[test]
    fn test_analyze() {
        let classifier = ScamClassifier::new();
        let text = "Your KYC is expiring, click link to update";
        let analysis = classifier.analyze(text);

        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.message_length, text.chars().count());
        assert_eq!(
            analysis.category_scores.get(&ScamCategory::KycPhishing),
            Some(&0.65)
        );
        assert_eq!(analysis.indicators, vec!["KYC_PHISHING:kyc".to_string()]);
    }
}
