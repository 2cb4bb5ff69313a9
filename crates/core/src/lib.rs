//! Core types for the scam intelligence pipeline
//!
//! Shared by every stage of a turn:
//! - Entity records and the per-session intelligence aggregate
//! - Scam categories and classification results
//! - Continuation verdicts
//! - Conversation states, events and transition records
//! - Conversation messages
//!
//! Everything here is plain data. The algorithms live in the
//! `scamshield-intelligence`, `scamshield-detection` and `scamshield-agent` crates.

pub mod classification;
pub mod decision;
pub mod entity;
pub mod error;
pub mod intelligence;
pub mod message;
pub mod state;

pub use classification::{RiskLevel, ScamCategory, ScamClassification};
pub use decision::{DecisionReason, DecisionVerdict};
pub use entity::{
    normalize_key, EntityDetail, EntityRecord, EntityType, IdentityKind, UrlSuspicion,
};
pub use error::{Error, Result};
pub use intelligence::{IntelligenceSummary, SessionIntelligence};
pub use message::{ConversationMessage, MessageRole};
pub use state::{ConversationEvent, ConversationState, TransitionRecord};
