//! Scam categories and classification results

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Scam category taxonomy
///
/// Declaration order matters: when two categories score equally the earlier
/// one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScamCategory {
    KycPhishing,
    LotteryPrize,
    InvestmentFraud,
    Impersonation,
    LoanScam,
    JobScam,
    OtpTheft,
    TechSupport,
    #[default]
    Unknown,
}

impl ScamCategory {
    pub fn all() -> &'static [ScamCategory] {
        &[
            ScamCategory::KycPhishing,
            ScamCategory::LotteryPrize,
            ScamCategory::InvestmentFraud,
            ScamCategory::Impersonation,
            ScamCategory::LoanScam,
            ScamCategory::JobScam,
            ScamCategory::OtpTheft,
            ScamCategory::TechSupport,
            ScamCategory::Unknown,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScamCategory::KycPhishing => "KYC_PHISHING",
            ScamCategory::LotteryPrize => "LOTTERY_PRIZE",
            ScamCategory::InvestmentFraud => "INVESTMENT_FRAUD",
            ScamCategory::Impersonation => "IMPERSONATION",
            ScamCategory::LoanScam => "LOAN_SCAM",
            ScamCategory::JobScam => "JOB_SCAM",
            ScamCategory::OtpTheft => "OTP_THEFT",
            ScamCategory::TechSupport => "TECH_SUPPORT",
            ScamCategory::Unknown => "UNKNOWN",
        }
    }

}

impl fmt::Display for ScamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScamClassification {
    pub is_scam: bool,
    pub category: ScamCategory,
    pub confidence: f32,
    /// `CATEGORY:keyword` tags plus matched high-risk and critical cues
    pub matched_indicators: BTreeSet<String>,
}

impl ScamClassification {
    /// Not a scam, unknown category, zero confidence
    pub fn benign() -> Self {
        Self::default()
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_confidence(self.confidence)
    }
}

/// Human-readable risk band for a classification confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Minimal,
}

impl RiskLevel {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 0.8 {
            RiskLevel::High
        } else if confidence >= 0.5 {
            RiskLevel::Medium
        } else if confidence >= 0.3 {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }
}
