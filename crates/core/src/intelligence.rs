//! Per-session intelligence aggregate

use crate::entity::{EntityRecord, EntityType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entities grouped by type
///
/// Used both for a single turn's extraction result and for the cumulative
/// session aggregate. The entity total is always derived from the lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionIntelligence {
    #[serde(default)]
    entities: BTreeMap<EntityType, Vec<EntityRecord>>,
}

impl SessionIntelligence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of one type (empty slice if none)
    pub fn get(&self, entity_type: EntityType) -> &[EntityRecord] {
        self.entities
            .get(&entity_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has(&self, entity_type: EntityType) -> bool {
        !self.get(entity_type).is_empty()
    }

    pub fn count(&self, entity_type: EntityType) -> usize {
        self.get(entity_type).len()
    }

    /// Sum of per-type counts
    pub fn total_entities(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_entities() == 0
    }

    /// Replace the records of one type; an empty list removes the type
    pub fn set(&mut self, entity_type: EntityType, records: Vec<EntityRecord>) {
        if records.is_empty() {
            self.entities.remove(&entity_type);
        } else {
            self.entities.insert(entity_type, records);
        }
    }

    /// Append a record under its own type
    pub fn push(&mut self, record: EntityRecord) {
        self.entities
            .entry(record.entity_type)
            .or_default()
            .push(record);
    }

    /// Iterate over every record
    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.values().flatten()
    }

    /// Types that have at least one record
    pub fn present_types(&self) -> Vec<EntityType> {
        self.entities
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(t, _)| *t)
            .collect()
    }

    /// Mean confidence over all records, rounded to 2 decimals
    pub fn average_confidence(&self) -> f32 {
        let total = self.total_entities();
        if total == 0 {
            return 0.0;
        }
        let sum: f32 = self.iter().map(|r| r.confidence).sum();
        round2(sum / total as f32)
    }

    /// Mean confidence of one type, unrounded
    pub fn type_confidence(&self, entity_type: EntityType) -> Option<f32> {
        let records = self.get(entity_type);
        if records.is_empty() {
            return None;
        }
        let sum: f32 = records.iter().map(|r| r.confidence).sum();
        Some(sum / records.len() as f32)
    }

    pub fn summary(&self) -> IntelligenceSummary {
        let counts = EntityType::all()
            .iter()
            .map(|t| (*t, self.count(*t)))
            .collect();
        IntelligenceSummary {
            total_entities: self.total_entities(),
            counts,
            avg_confidence: self.average_confidence(),
        }
    }
}

impl FromIterator<EntityRecord> for SessionIntelligence {
    fn from_iter<I: IntoIterator<Item = EntityRecord>>(iter: I) -> Self {
        let mut intel = SessionIntelligence::new();
        for record in iter {
            intel.push(record);
        }
        intel
    }
}

/// Read-only statistics over an aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceSummary {
    pub total_entities: usize,
    /// Count per entity type, zero included
    pub counts: BTreeMap<EntityType, usize>,
    pub avg_confidence: f32,
}

impl IntelligenceSummary {
    pub fn count(&self, entity_type: EntityType) -> usize {
        self.counts.get(&entity_type).copied().unwrap_or(0)
    }
}

/// Round to 2 decimal places
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entity_type: EntityType, value: &str, confidence: f32) -> EntityRecord {
        EntityRecord::new(entity_type, value, value, confidence)
    }

    #[test]
    fn test_total_is_sum_of_lists() {
        let mut intel = SessionIntelligence::new();
        assert_eq!(intel.total_entities(), 0);

        intel.push(record(EntityType::Phone, "+919876543210", 0.95));
        intel.push(record(EntityType::Upi, "a@ybl", 0.92));
        intel.push(record(EntityType::Upi, "b@ybl", 0.92));
        assert_eq!(intel.total_entities(), 3);
        assert_eq!(intel.count(EntityType::Upi), 2);

        intel.set(EntityType::Upi, Vec::new());
        assert_eq!(intel.total_entities(), 1);
        assert!(!intel.has(EntityType::Upi));
    }

    #[test]
    fn test_average_confidence() {
        let intel: SessionIntelligence = vec![
            record(EntityType::Phone, "p", 0.9),
            record(EntityType::Email, "e", 0.8),
        ]
        .into_iter()
        .collect();
        assert!((intel.average_confidence() - 0.85).abs() < 1e-6);
        assert_eq!(SessionIntelligence::new().average_confidence(), 0.0);
    }

    #[test]
    fn test_summary_counts_all_types() {
        let intel: SessionIntelligence =
            std::iter::once(record(EntityType::Ifsc, "HDFC0001234", 0.98)).collect();
        let summary = intel.summary();
        assert_eq!(summary.total_entities, 1);
        assert_eq!(summary.count(EntityType::Ifsc), 1);
        assert_eq!(summary.count(EntityType::Phone), 0);
        assert_eq!(summary.counts.len(), 7);
    }

    #[test]
    fn test_serde_roundtrip_keeps_records() {
        let intel: SessionIntelligence =
            std::iter::once(record(EntityType::BankAccount, "123456789012", 0.88)).collect();
        let json = serde_json::to_string(&intel).unwrap();
        assert!(json.contains("bank_account"));
        let back: SessionIntelligence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, intel);
    }
}
