//! Cross-turn intelligence aggregation
//!
//! Folds one turn's extraction into the session aggregate. Records are keyed
//! per type by their normalized value; a repeat sighting reinforces the stored
//! record instead of adding a second one.

use scamshield_config::constants::{aggregation, confidence as tier};
use scamshield_config::IntelligenceSettings;
use scamshield_core::{EntityRecord, EntityType, IntelligenceSummary, SessionIntelligence};
use std::collections::{HashMap, HashSet};

/// Merges per-turn extraction results into the session aggregate
#[derive(Debug, Clone)]
pub struct IntelligenceAggregator {
    high_confidence_threshold: f32,
}

impl Default for IntelligenceAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&IntelligenceSettings> for IntelligenceAggregator {
    fn from(settings: &IntelligenceSettings) -> Self {
        Self::with_threshold(settings.high_confidence_threshold)
    }
}

impl IntelligenceAggregator {
    pub fn new() -> Self {
        Self::with_threshold(tier::HIGH)
    }

    pub fn with_threshold(high_confidence_threshold: f32) -> Self {
        Self {
            high_confidence_threshold: high_confidence_threshold.clamp(0.0, 1.0),
        }
    }

    pub fn high_confidence_threshold(&self) -> f32 {
        self.high_confidence_threshold
    }

    /// Merge `new` into `old` as seen at `current_turn`
    ///
    /// Known keys are reinforced: confidence moves a fifth of the way toward
    /// 1.0 (never below the new sighting, never above 0.99), `last_seen_turn`
    /// advances and `occurrences` grows by one. Unknown keys are inserted as
    /// first seen at `current_turn`. A key repeated inside `new` is only
    /// counted once.
    pub fn merge(
        &self,
        old: &SessionIntelligence,
        new: &SessionIntelligence,
        current_turn: u32,
    ) -> SessionIntelligence {
        let turn = current_turn.max(1);
        let mut merged = old.clone();

        for &entity_type in EntityType::all() {
            let incoming = new.get(entity_type);
            if incoming.is_empty() {
                continue;
            }

            let mut records = merged.get(entity_type).to_vec();
            let mut index: HashMap<String, usize> = records
                .iter()
                .enumerate()
                .map(|(i, r)| (r.key(), i))
                .collect();
            let mut seen_this_turn = HashSet::new();

            for item in incoming {
                let key = item.key();
                if !seen_this_turn.insert(key.clone()) {
                    continue;
                }

                match index.get(&key) {
                    Some(&i) => {
                        reinforce(&mut records[i], item, turn);
                        tracing::debug!(
                            entity_type = %entity_type,
                            key = %key,
                            confidence = records[i].confidence,
                            occurrences = records[i].occurrences,
                            "Reinforced entity"
                        );
                    }
                    None => {
                        let mut record = item.clone();
                        record.confidence = record.confidence.min(aggregation::MAX_CONFIDENCE);
                        record.first_seen_turn = turn;
                        record.last_seen_turn = turn;
                        record.occurrences = 1;
                        index.insert(key, records.len());
                        records.push(record);
                    }
                }
            }

            merged.set(entity_type, records);
        }

        tracing::debug!(
            before = old.total_entities(),
            after = merged.total_entities(),
            turn,
            "Merged turn intelligence"
        );

        merged
    }

    /// Only the records at or above `threshold`
    pub fn get_high_confidence_intel(
        &self,
        intel: &SessionIntelligence,
        threshold: f32,
    ) -> SessionIntelligence {
        intel
            .iter()
            .filter(|r| r.confidence >= threshold)
            .cloned()
            .collect()
    }

    /// High-confidence view at the configured threshold (0.85 unless set)
    pub fn high_confidence(&self, intel: &SessionIntelligence) -> SessionIntelligence {
        self.get_high_confidence_intel(intel, self.high_confidence_threshold)
    }

    pub fn get_summary(&self, intel: &SessionIntelligence) -> IntelligenceSummary {
        intel.summary()
    }
}

fn reinforce(stored: &mut EntityRecord, sighting: &EntityRecord, turn: u32) {
    let boosted = stored.confidence + (1.0 - stored.confidence) * aggregation::REINFORCEMENT_RATE;
    stored.confidence = boosted
        .min(aggregation::MAX_CONFIDENCE)
        .max(sighting.confidence.min(aggregation::MAX_CONFIDENCE))
        .max(stored.confidence);
    stored.last_seen_turn = turn.max(stored.first_seen_turn);
    stored.occurrences = stored.occurrences.saturating_add(1);

    if matches!(stored.detail, scamshield_core::EntityDetail::None) {
        stored.detail = sighting.detail.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scamshield_core::{EntityDetail, IdentityKind};

    fn upi(id: &str, confidence: f32) -> SessionIntelligence {
        std::iter::once(EntityRecord::new(EntityType::Upi, id, id, confidence)).collect()
    }

    #[test]
    fn test_repeat_sighting_reinforces() {
        let aggregator = IntelligenceAggregator::new();
        let turn1 = aggregator.merge(&SessionIntelligence::new(), &upi("x@ybl", 0.8), 1);
        let turn2 = aggregator.merge(&turn1, &upi("x@ybl", 0.8), 2);

        let records = turn2.get(EntityType::Upi);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.occurrences, 2);
        assert_eq!(record.first_seen_turn, 1);
        assert_eq!(record.last_seen_turn, 2);
        assert!(record.confidence > 0.8);
        assert!((record.confidence - 0.84).abs() < 1e-4);
    }

    #[test]
    fn test_confidence_never_decreases_or_exceeds_cap() {
        let aggregator = IntelligenceAggregator::new();
        let mut intel = aggregator.merge(&SessionIntelligence::new(), &upi("x@ybl", 0.9), 1);
        let mut last = intel.get(EntityType::Upi)[0].confidence;

        for turn in 2..40 {
            // lower-confidence repeat
            intel = aggregator.merge(&intel, &upi("x@ybl", 0.5), turn);
            let now = intel.get(EntityType::Upi)[0].confidence;
            assert!(now >= last);
            assert!(now <= 0.99);
            last = now;
        }
        assert_eq!(intel.get(EntityType::Upi)[0].occurrences, 39);
    }

    #[test]
    fn test_higher_sighting_wins() {
        let aggregator = IntelligenceAggregator::new();
        let intel = aggregator.merge(&SessionIntelligence::new(), &upi("x@ybl", 0.7), 1);
        let intel = aggregator.merge(&intel, &upi("x@ybl", 0.95), 3);
        assert_eq!(intel.get(EntityType::Upi)[0].confidence, 0.95);
    }

    #[test]
    fn test_new_keys_use_current_turn() {
        let aggregator = IntelligenceAggregator::new();
        let intel = aggregator.merge(&SessionIntelligence::new(), &upi("a@ybl", 0.8), 4);
        let record = &intel.get(EntityType::Upi)[0];
        assert_eq!(record.first_seen_turn, 4);
        assert_eq!(record.last_seen_turn, 4);
        assert_eq!(record.occurrences, 1);
    }

    #[test]
    fn test_keys_ignore_formatting() {
        let aggregator = IntelligenceAggregator::new();
        let intel = aggregator.merge(&SessionIntelligence::new(), &upi("Rahul.K@ybl", 0.9), 1);
        let intel = aggregator.merge(&intel, &upi("rahulk@ybl", 0.9), 2);
        assert_eq!(intel.count(EntityType::Upi), 1);
    }

    #[test]
    fn test_duplicates_within_one_turn_count_once() {
        let aggregator = IntelligenceAggregator::new();
        let mut new = upi("x@ybl", 0.8);
        new.push(EntityRecord::new(EntityType::Upi, "x@ybl", "x@ybl", 0.8));

        let intel = aggregator.merge(&SessionIntelligence::new(), &new, 1);
        let record = &intel.get(EntityType::Upi)[0];
        assert_eq!(intel.count(EntityType::Upi), 1);
        assert_eq!(record.occurrences, 1);
        assert_eq!(record.confidence, 0.8);
    }

    #[test]
    fn test_total_matches_per_type_counts() {
        let aggregator = IntelligenceAggregator::new();
        let mut new = upi("x@ybl", 0.8);
        new.push(EntityRecord::new(EntityType::Phone, "9876543210", "+919876543210", 0.95));
        new.push(EntityRecord::new(EntityType::Ifsc, "sbin0001234", "SBIN0001234", 0.85));

        let first = aggregator.merge(&SessionIntelligence::new(), &new, 1);
        let second = aggregator.merge(&first, &new, 2);
        for intel in [&first, &second] {
            let sum: usize = EntityType::all().iter().map(|t| intel.count(*t)).sum();
            assert_eq!(intel.total_entities(), sum);
            assert_eq!(intel.total_entities(), 3);
        }
    }

    #[test]
    fn test_identity_kinds_are_distinct_keys() {
        let aggregator = IntelligenceAggregator::new();
        let aadhaar = EntityRecord::new(EntityType::Other, "x", "ABCDE", 0.8).with_detail(
            EntityDetail::Identity {
                identity: IdentityKind::Aadhaar,
            },
        );
        let pan = EntityRecord::new(EntityType::Other, "x", "ABCDE", 0.85).with_detail(
            EntityDetail::Identity {
                identity: IdentityKind::Pan,
            },
        );
        let new: SessionIntelligence = vec![aadhaar, pan].into_iter().collect();
        let intel = aggregator.merge(&SessionIntelligence::new(), &new, 1);
        assert_eq!(intel.count(EntityType::Other), 2);
    }

    #[test]
    fn test_high_confidence_view_and_summary() {
        let aggregator = IntelligenceAggregator::new();
        let mut intel = upi("x@ybl", 0.92);
        intel.push(EntityRecord::new(EntityType::BankAccount, "123456789", "123456789", 0.72));

        let high = aggregator.high_confidence(&intel);
        assert_eq!(high.total_entities(), 1);
        assert!(high.has(EntityType::Upi));

        let summary = aggregator.get_summary(&intel);
        assert_eq!(summary.total_entities, 2);
        assert_eq!(summary.count(EntityType::BankAccount), 1);
        assert_eq!(summary.count(EntityType::Email), 0);
        assert_eq!(summary.avg_confidence, 0.82);
    }

    #[test]
    fn test_configured_threshold() {
        let mut intel = upi("x@ybl", 0.92);
        intel.push(EntityRecord::new(EntityType::BankAccount, "123456789", "123456789", 0.72));

        let settings = IntelligenceSettings {
            high_confidence_threshold: 0.7,
            ..IntelligenceSettings::default()
        };
        let relaxed = IntelligenceAggregator::from(&settings);
        assert_eq!(relaxed.high_confidence_threshold(), 0.7);
        assert_eq!(relaxed.high_confidence(&intel).total_entities(), 2);

        let strict = IntelligenceAggregator::with_threshold(0.95);
        assert!(strict.high_confidence(&intel).is_empty());

        assert_eq!(
            IntelligenceAggregator::from(&IntelligenceSettings::default()).high_confidence(&intel),
            IntelligenceAggregator::new().high_confidence(&intel)
        );
    }

    #[test]
    fn test_first_sighting_is_capped() {
        let aggregator = IntelligenceAggregator::new();
        let intel = aggregator.merge(&SessionIntelligence::new(), &upi("x@ybl", 1.0), 2);
        let record = &intel.get(EntityType::Upi)[0];
        assert_eq!(record.confidence, 0.99);
        assert_eq!(record.occurrences, 1);
        assert_eq!(record.first_seen_turn, 2);
    }
}
