//! Reply generation boundary
//!
//! The reply text itself comes from an external generator (typically an LLM).
//! This module defines what the generator is given, bounds the call with a
//! timeout, cleans what comes back, and supplies stall phrases when the
//! generator fails.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use scamshield_core::{ConversationMessage, EntityType, Error, Result, ScamCategory};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engagement phase chosen from the turn number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementPhase {
    /// Turns 1-2
    BuildTrust,
    /// Turns 3-5
    AggressiveExtraction,
    /// Turns 6-8
    ConfirmAndRerequest,
    /// Turn 9 onwards
    Stall,
}

impl EngagementPhase {
    pub fn from_turn(turn_count: u32) -> Self {
        match turn_count {
            0..=2 => EngagementPhase::BuildTrust,
            3..=5 => EngagementPhase::AggressiveExtraction,
            6..=8 => EngagementPhase::ConfirmAndRerequest,
            _ => EngagementPhase::Stall,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementPhase::BuildTrust => "build_trust",
            EngagementPhase::AggressiveExtraction => "aggressive_extraction",
            EngagementPhase::ConfirmAndRerequest => "confirm_and_rerequest",
            EngagementPhase::Stall => "stall",
        }
    }

    /// Short instruction for the generator's prompt
    pub fn guidance(&self) -> &'static str {
        match self {
            EngagementPhase::BuildTrust => {
                "Act confused but grateful. Ask basic clarifying questions about which bank and which account."
            }
            EngagementPhase::AggressiveExtraction => {
                "Offer to send them money or pay the fee, and ask for their account number, UPI ID or callback number."
            }
            EngagementPhase::ConfirmAndRerequest => {
                "Repeat their details back slightly wrong so they correct them, and ask again for anything missing."
            }
            EngagementPhase::Stall => {
                "Stall with small excuses while still asking for their payment details."
            }
        }
    }
}

/// Everything a reply generator gets for one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub session_id: String,
    pub scammer_message: String,
    pub turn_count: u32,
    pub phase: EngagementPhase,
    /// Entity types still missing, most valuable first
    pub priorities: Vec<EntityType>,
    pub category: ScamCategory,
    /// Recent history, oldest first
    pub history: Vec<ConversationMessage>,
}

/// External reply generator
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, request: &ReplyRequest) -> Result<String>;

    fn name(&self) -> &str {
        "reply-generator"
    }
}

/// Run the generator with a deadline and clean its output
///
/// An empty reply after cleaning counts as a failure.
pub async fn generate_with_timeout(
    generator: &dyn ReplyGenerator,
    request: &ReplyRequest,
    timeout_ms: u64,
) -> Result<String> {
    let reply = tokio::time::timeout(Duration::from_millis(timeout_ms), generator.generate(request))
        .await
        .map_err(|_| Error::ReplyTimeout(timeout_ms))??;

    let cleaned = clean_reply(&reply);
    if cleaned.is_empty() {
        return Err(Error::Reply(format!("{} returned an empty reply", generator.name())));
    }
    Ok(cleaned)
}

const ROLE_PREFIXES: &[&str] = &["Agent:", "Victim:", "Response:", "Me:"];

/// Replies longer than this are cut to their first three sentences
const MAX_REPLY_CHARS: usize = 300;

/// Strip role prefixes and wrapping quotes, shorten long replies
pub fn clean_reply(reply: &str) -> String {
    let mut text = reply.trim();

    for prefix in ROLE_PREFIXES {
        if let Some(rest) = text.strip_prefix(prefix) {
            text = rest.trim();
        }
    }

    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        text = &text[1..text.len() - 1];
    }

    if text.chars().count() > MAX_REPLY_CHARS {
        let sentences: Vec<&str> = text.split(". ").take(3).collect();
        let mut short = sentences.join(". ");
        if !short.ends_with('.') {
            short.push('.');
        }
        return short.trim().to_string();
    }

    text.trim().to_string()
}

/// Stall phrases used when the generator is unavailable
pub const FALLBACK_PHRASES: &[&str] = &[
    "Haan... ek minute... phone hang ho gaya...",
    "Wait beta, message properly nahi dikh raha... screen blur hai...",
    "Ek second, let me read this again slowly...",
    "Beta mujhe samajh nahi aa raha, please phir se explain karo...",
    "Arey, ye message cut ho gaya kya? Poora nahi dikha...",
    "Wait, mera phone slow ho gaya hai...",
    "Ek minute, battery low hai, charger lagata hoon...",
    "Screen pe kuch aur aa gaya, ek second...",
    "Message type karne mein time lag raha hai, patience rakhiye...",
    "Mera phone restart ho raha hai, please wait...",
    "Haan haan, bass ek minute, chai lene gaya tha...",
    "Beta abhi busy hoon, but batao kya karna hai...",
    "Let me find my reading glasses first...",
    "Wait, door pe koi aaya hai... ek minute...",
    "Sorry beta, dusra message aa gaya tha...",
    "Acha acha, toh aapka matlab kya hai exactly?",
    "Haan beta, but ye KYC kya hota hai? Samjhao...",
    "Main confused hoon, please step by step batao...",
    "Thoda slowly explain karo na beta...",
    "Arey ye sab mujhe samajh nahi aata, grandson se help leni padegi...",
    "Acha, but aapka number kya hai? Main note kar loon...",
    "Ye payment kahan bhejna hai? Account number do apna...",
    "Aapka UPI ID kya hai? Main likh leti hoon...",
    "Aap konsi branch se ho? Address batao...",
    "Aapka naam kya hai beta? Main yaad rakhna chahti hoon...",
];

/// Number of recent picks remembered per session
const FALLBACK_MEMORY: usize = 10;

/// Pick a stall phrase not among the session's recent picks
///
/// `used` is the session's own rotation state; it is updated in place and
/// never grows beyond the last ten picks.
pub fn pick_fallback<R: Rng + ?Sized>(used: &mut Vec<usize>, rng: &mut R) -> &'static str {
    let mut available: Vec<usize> = (0..FALLBACK_PHRASES.len())
        .filter(|i| !used.contains(i))
        .collect();
    if available.is_empty() {
        used.clear();
        available = (0..FALLBACK_PHRASES.len()).collect();
    }

    let chosen = available.choose(rng).copied().unwrap_or(0);
    used.push(chosen);
    if used.len() > FALLBACK_MEMORY {
        let excess = used.len() - FALLBACK_MEMORY;
        used.drain(..excess);
    }

    FALLBACK_PHRASES[chosen]
}

/// Generator that always fails over to stall phrases
///
/// Useful when no external generator is configured.
#[derive(Debug, Clone, Default)]
pub struct StallOnlyGenerator;

#[async_trait]
impl ReplyGenerator for StallOnlyGenerator {
    async fn generate(&self, _request: &ReplyRequest) -> Result<String> {
        Err(Error::Reply("no reply generator configured".to_string()))
    }

    fn name(&self) -> &str {
        "stall-only"
    }
}
