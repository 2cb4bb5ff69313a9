//! Scam detection
//!
//! Pattern and keyword based classification of inbound messages into the
//! fixed scam category taxonomy. No model calls; pure computation.

pub mod classifier;
pub mod rules;

pub use classifier::{ScamAnalysis, ScamClassifier};
