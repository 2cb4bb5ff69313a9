//! Extracted entities
//!
//! An [`EntityRecord`] is one validated piece of evidence with turn provenance.
//! Records are identified by `(entity_type, normalize_key(normalized_value))`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity type taxonomy
///
/// Closed set shared with downstream consumers. The serialized names are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Phone,
    Upi,
    BankAccount,
    Ifsc,
    PhishingLink,
    Email,
    Other,
}

impl EntityType {
    /// All entity types in declaration order
    pub fn all() -> &'static [EntityType] {
        &[
            EntityType::Phone,
            EntityType::Upi,
            EntityType::BankAccount,
            EntityType::Ifsc,
            EntityType::PhishingLink,
            EntityType::Email,
            EntityType::Other,
        ]
    }

    /// Wire name (snake_case)
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Phone => "phone",
            EntityType::Upi => "upi",
            EntityType::BankAccount => "bank_account",
            EntityType::Ifsc => "ifsc",
            EntityType::PhishingLink => "phishing_link",
            EntityType::Email => "email",
            EntityType::Other => "other",
        }
    }

    /// Parse a wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a URL looks like phishing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlSuspicion {
    SuspiciousTld,
    FakeBankDomain,
    PhishingKeyword,
    UrlShortener,
}

impl UrlSuspicion {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlSuspicion::SuspiciousTld => "suspicious_tld",
            UrlSuspicion::FakeBankDomain => "fake_bank_domain",
            UrlSuspicion::PhishingKeyword => "phishing_keyword",
            UrlSuspicion::UrlShortener => "url_shortener",
        }
    }
}

/// National identity document kinds captured under [`EntityType::Other`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Aadhaar,
    Pan,
}

impl IdentityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityKind::Aadhaar => "aadhaar",
            IdentityKind::Pan => "pan",
        }
    }
}

/// Type-specific details attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityDetail {
    #[default]
    None,
    /// URL host and suspicion verdict
    Link {
        domain: Option<String>,
        suspicion: Option<UrlSuspicion>,
    },
    /// Aadhaar or PAN
    Identity { identity: IdentityKind },
    /// IFSC bank prefix (first four letters)
    Branch { bank_code: String },
}

/// A single extracted and validated piece of evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_type: EntityType,
    /// Text as it appeared in the message
    pub raw_value: String,
    /// Canonical form (e.g. `+919876543210`)
    pub normalized_value: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
    pub first_seen_turn: u32,
    pub last_seen_turn: u32,
    pub occurrences: u32,
    #[serde(default)]
    pub detail: EntityDetail,
}

impl EntityRecord {
    /// Create a record first seen at turn 1
    pub fn new(
        entity_type: EntityType,
        raw_value: impl Into<String>,
        normalized_value: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            entity_type,
            raw_value: raw_value.into(),
            normalized_value: normalized_value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            first_seen_turn: 1,
            last_seen_turn: 1,
            occurrences: 1,
            detail: EntityDetail::None,
        }
    }

    pub fn with_detail(mut self, detail: EntityDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Deduplication key within this record's type
    ///
    /// Identity documents are keyed by kind as well, so an Aadhaar and a PAN
    /// never collapse into one record.
    pub fn key(&self) -> String {
        let base = normalize_key(&self.normalized_value);
        match &self.detail {
            EntityDetail::Identity { identity } => format!("{}:{}", identity.as_str(), base),
            _ => base,
        }
    }
}

/// Lower-case and strip whitespace, `-`, `.` and `_`
pub fn normalize_key(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '.' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}
