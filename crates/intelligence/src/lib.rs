//! Entity intelligence for scam conversations
//!
//! Features:
//! - Format validators and normalizers for Indian financial identifiers
//! - Context-aware confidence scoring
//! - Tiered regex extraction (phone, UPI, bank account, IFSC, URL, email,
//!   Aadhaar, PAN)
//! - Cross-turn aggregation with deduplication and confidence reinforcement
//!
//! Everything here is pure computation over text and prior state.

pub mod aggregator;
pub mod confidence;
pub mod extractor;
pub mod patterns;
pub mod validators;

pub use aggregator::IntelligenceAggregator;
pub use confidence::entity_confidence;
pub use extractor::{EntityExtractor, ExtractionOptions};
pub use validators::{is_suspicious_url, suspicious_url_reason, ValueKind};
