//! Scoring constants
//!
//! Single source for the thresholds shared by extraction, aggregation,
//! classification and the continuation decision.

/// Entity confidence tiers
pub mod confidence {
    /// Starting confidence for any candidate
    pub const BASE: f32 = 0.70;

    /// Confidence once the type validator accepts the value
    pub const VALIDATED: f32 = 0.85;

    /// Boost when a context keyword appears near the match
    pub const CONTEXT_BOOST: f32 = 0.10;

    /// Ceiling for the context boost
    pub const CONTEXT_CAP: f32 = 0.98;

    /// Strict-validation overrides
    pub const PHONE_STRICT: f32 = 0.95;
    pub const UPI_STRICT: f32 = 0.92;
    pub const IFSC_STRICT: f32 = 0.98;

    /// Fallback phone tiers
    pub const PHONE_BRACKETED: f32 = 0.80;
    pub const PHONE_FLEXIBLE: f32 = 0.75;
    pub const PHONE_NORMALIZED_TEXT: f32 = 0.70;

    pub const UPI_GENERIC: f32 = 0.75;

    pub const BANK_ACCOUNT_CONTEXT: f32 = 0.88;
    pub const BANK_ACCOUNT_GENERIC: f32 = 0.72;

    pub const IFSC_GENERIC: f32 = 0.85;

    pub const URL_SUSPICIOUS: f32 = 0.95;
    pub const URL_PLAIN: f32 = 0.70;

    pub const EMAIL: f32 = 0.85;
    pub const AADHAAR: f32 = 0.80;
    pub const PAN: f32 = 0.85;

    /// Candidates below this are dropped unless low-confidence output is requested
    pub const MIN_ACCEPTED: f32 = 0.70;

    /// Read-only "high confidence" view threshold
    pub const HIGH: f32 = 0.85;
}

/// Cross-turn aggregation
pub mod aggregation {
    /// Upper bound on a merged record's confidence
    pub const MAX_CONFIDENCE: f32 = 0.99;

    /// Fraction of the remaining headroom added on each repeat sighting
    pub const REINFORCEMENT_RATE: f32 = 0.2;
}

/// Continuation decision
pub mod decision {
    /// Intel score at which the session goal is met
    pub const TARGET_SCORE: f32 = 0.6;

    /// Intel score good enough to stop near the turn limit
    pub const MIN_SUCCESS_SCORE: f32 = 0.3;

    /// Turns from the limit at which `MIN_SUCCESS_SCORE` suffices
    pub const NEAR_LIMIT_WINDOW: u32 = 2;

    pub const STAGNATION_TURNS: u32 = 5;
    pub const STAGNATION_SCORE: f32 = 0.1;

    pub const DEFAULT_MAX_TURNS: u32 = 10;
    pub const MAX_TURNS_CEILING: u32 = 50;

    /// Multi-entity multiplier step, applied up to three entities
    pub const MULTI_ENTITY_STEP: f32 = 0.2;
    pub const MULTI_ENTITY_CAP: usize = 3;

    pub const BANK_IFSC_BONUS: f32 = 0.10;
    pub const UPI_PHONE_BONUS: f32 = 0.05;

    /// Intel score at which a continuing turn counts as "intel extracted"
    pub const INTEL_EXTRACTED_SCORE: f32 = 0.3;
}

/// Scam classification
pub mod classification {
    pub const SCAM_THRESHOLD: f32 = 0.30;
    pub const MIN_MESSAGE_CHARS: usize = 10;

    pub const KEYWORD_WEIGHT: f32 = 0.15;
    pub const PATTERN_WEIGHT: f32 = 0.25;
    pub const COMPONENT_CAP: f32 = 0.5;

    pub const HIGH_RISK_WEIGHT: f32 = 0.15;
    pub const HIGH_RISK_CAP: f32 = 0.5;
    pub const HIGH_RISK_FACTOR: f32 = 0.2;

    pub const FALLBACK_SINGLE: f32 = 0.40;
    pub const FALLBACK_BASE: f32 = 0.35;
    pub const FALLBACK_STEP: f32 = 0.10;
    pub const FALLBACK_CAP: f32 = 0.75;
    pub const FALLBACK_FACTOR: f32 = 0.15;

    pub const MAX_CONFIDENCE: f32 = 0.98;

    /// Category scores at or below this are left out of the score table
    pub const REPORT_FLOOR: f32 = 0.1;
}

/// Reply generation
pub mod reply {
    pub const DEFAULT_TIMEOUT_MS: u64 = 8000;
    pub const DEFAULT_HISTORY_WINDOW: usize = 10;
}

/// Threat keywords that end an engagement immediately
pub const DEFAULT_THREAT_KEYWORDS: &[&str] = &[
    "police",
    "cyber cell",
    "cybercrime",
    "complaint",
    "report",
    "i know you are",
    "honeypot",
    "fake",
    "scam trap",
    "sting",
    "trace",
    "tracking",
    "recorded",
    "evidence",
    "arrest",
];
