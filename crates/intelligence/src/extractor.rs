//! Entity extraction engine
//!
//! Runs ordered pattern families per entity type over raw text. For each type
//! a keyword-anchored pattern runs first and wins the higher confidence tier;
//! a generic pattern then picks up unanchored occurrences at a lower tier.
//! Results are deduplicated by normalized key within the call.
//!
//! Phones are always extracted before bank accounts and handed to the account
//! pass, which drops any candidate that is one of those phone numbers.
//!
//! # Example
//!
//! ```
//! use scamshield_intelligence::EntityExtractor;
//! use scamshield_core::EntityType;
//!
//! let extractor = EntityExtractor::new();
//! let intel = extractor.extract_all("Call 9876543210 or pay to user@ybl");
//!
//! assert_eq!(intel.get(EntityType::Phone)[0].normalized_value, "+919876543210");
//! assert_eq!(intel.get(EntityType::Upi)[0].normalized_value, "user@ybl");
//! assert_eq!(intel.total_entities(), 2);
//! ```

use crate::confidence::entity_confidence;
use crate::patterns::{self, char_after, char_before, digit_bounded, scan, Candidate};
use crate::validators::{
    self, mask_aadhaar, normalize_bank_account, normalize_ifsc, normalize_pan, normalize_phone,
    normalize_upi, suspicious_url_reason, url_domain, validate_email, ValueKind,
};
use scamshield_config::constants::confidence as tier;
use scamshield_config::IntelligenceSettings;
use scamshield_core::intelligence::round2;
use scamshield_core::{
    normalize_key, ConversationMessage, EntityDetail, EntityRecord, EntityType, IdentityKind,
    SessionIntelligence,
};
use std::collections::HashSet;

/// Extraction knobs
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Keep candidates below `min_confidence`
    pub include_low_confidence: bool,
    pub min_confidence: f32,
    /// Characters either side of a match scanned for context keywords
    pub context_radius: usize,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            include_low_confidence: false,
            min_confidence: tier::MIN_ACCEPTED,
            context_radius: 50,
        }
    }
}

impl From<&IntelligenceSettings> for ExtractionOptions {
    fn from(settings: &IntelligenceSettings) -> Self {
        Self {
            include_low_confidence: settings.include_low_confidence,
            min_confidence: settings.min_confidence,
            context_radius: settings.context_radius_chars,
        }
    }
}

/// Collects records of one type, first hit per key wins
struct Collector {
    entity_type: EntityType,
    seen: HashSet<String>,
    records: Vec<EntityRecord>,
}

impl Collector {
    fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            seen: HashSet::new(),
            records: Vec::new(),
        }
    }

    fn contains(&self, normalized: &str) -> bool {
        self.seen.contains(&normalize_key(normalized))
    }

    fn add(&mut self, raw: &str, normalized: String, confidence: f32, detail: EntityDetail) -> bool {
        let record = EntityRecord::new(self.entity_type, raw.trim(), normalized, confidence)
            .with_detail(detail);
        if !self.seen.insert(record.key()) {
            return false;
        }
        self.records.push(record);
        true
    }

    fn finish(self) -> Vec<EntityRecord> {
        self.records
    }
}

/// Regex-driven extractor for Indian financial entities
///
/// Stateless; one instance can serve any number of sessions concurrently.
#[derive(Debug, Clone, Default)]
pub struct EntityExtractor {
    options: ExtractionOptions,
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExtractionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    /// Extract every entity type from one text
    ///
    /// Empty text yields an empty result.
    pub fn extract_all(&self, text: &str) -> SessionIntelligence {
        let mut intel = SessionIntelligence::new();
        if text.trim().is_empty() {
            return intel;
        }

        tracing::debug!(chars = text.len(), "Extracting entities");

        let phones = self.extract_phone_numbers(text);
        let accounts = self.extract_bank_accounts(text, &phones);
        let identities = self.extract_identity_documents(text, &phones);

        intel.set(EntityType::Upi, self.keep(self.extract_upi_ids(text)));
        intel.set(EntityType::BankAccount, self.keep(accounts));
        intel.set(EntityType::Ifsc, self.keep(self.extract_ifsc_codes(text)));
        intel.set(EntityType::PhishingLink, self.keep(self.extract_urls(text)));
        intel.set(EntityType::Email, self.keep(self.extract_emails(text)));
        intel.set(EntityType::Other, self.keep(identities));
        intel.set(EntityType::Phone, self.keep(phones));

        tracing::debug!(
            total = intel.total_entities(),
            phones = intel.count(EntityType::Phone),
            upi = intel.count(EntityType::Upi),
            accounts = intel.count(EntityType::BankAccount),
            links = intel.count(EntityType::PhishingLink),
            "Extraction complete"
        );

        intel
    }

    /// Drop low-confidence records unless asked to keep them
    fn keep(&self, records: Vec<EntityRecord>) -> Vec<EntityRecord> {
        if self.options.include_low_confidence {
            return records;
        }
        records
            .into_iter()
            .filter(|r| r.confidence >= self.options.min_confidence)
            .collect()
    }

    /// Indian mobile numbers, in four tiers
    ///
    /// 1. Standard pattern, scored from context (0.95 when valid)
    /// 2. Separator between any digits (0.75)
    /// 3. Wrapped in brackets (0.80)
    /// 4. Whole text with dashes, brackets and whitespace removed (0.70)
    pub fn extract_phone_numbers(&self, text: &str) -> Vec<EntityRecord> {
        let mut out = Collector::new(EntityType::Phone);

        for c in scan(&patterns::PHONE, text, digit_bounded) {
            let raw = c.value(text);
            if let Some(normalized) = normalize_phone(raw) {
                if out.contains(&normalized) {
                    continue;
                }
                let context = self.context(text, &c);
                let confidence = entity_confidence(ValueKind::Phone, &normalized, Some(context));
                out.add(raw, normalized, confidence, EntityDetail::None);
            }
        }

        for c in scan(&patterns::PHONE_FLEXIBLE, text, digit_bounded) {
            let raw = c.value(text);
            if let Some(normalized) = normalize_phone(raw) {
                out.add(raw, normalized, tier::PHONE_FLEXIBLE, EntityDetail::None);
            }
        }

        for caps in patterns::PHONE_BRACKETED.captures_iter(text) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if validators::phone_digits(inner.as_str()).len() < 10 {
                continue;
            }
            if let Some(normalized) = normalize_phone(inner.as_str()) {
                out.add(whole.as_str(), normalized, tier::PHONE_BRACKETED, EntityDetail::None);
            }
        }

        let compact = patterns::PHONE_TEXT_NOISE.replace_all(text, "");
        if compact.len() != text.len() {
            for c in scan(&patterns::PHONE, &compact, digit_bounded) {
                let raw = c.value(&compact);
                if let Some(normalized) = normalize_phone(raw) {
                    out.add(raw, normalized, tier::PHONE_NORMALIZED_TEXT, EntityDetail::None);
                }
            }
        }

        out.finish()
    }

    /// UPI ids; known handles first (0.92), then any handle (0.75)
    ///
    /// A candidate that is the head of an email address (`name@domain.tld`)
    /// is not a UPI id.
    pub fn extract_upi_ids(&self, text: &str) -> Vec<EntityRecord> {
        let mut out = Collector::new(EntityType::Upi);

        for c in scan(&patterns::UPI_STRICT, text, upi_bounded) {
            let raw = c.value(text);
            if let Some(normalized) = normalize_upi(raw) {
                out.add(raw, normalized, tier::UPI_STRICT, EntityDetail::None);
            }
        }

        for c in scan(&patterns::UPI_GENERIC, text, upi_bounded) {
            let raw = c.value(text);
            if validate_email(raw) {
                continue;
            }
            if let Some(normalized) = normalize_upi(raw) {
                out.add(raw, normalized, tier::UPI_GENERIC, EntityDetail::None);
            }
        }

        out.finish()
    }

    /// Bank account numbers, excluding anything that is one of `phones`
    ///
    /// Keyword-anchored numbers score 0.88, bare digit runs 0.72.
    pub fn extract_bank_accounts(&self, text: &str, phones: &[EntityRecord]) -> Vec<EntityRecord> {
        let exclusions = PhoneExclusions::new(phones);
        let mut out = Collector::new(EntityType::BankAccount);

        for c in scan(&patterns::BANK_ACCOUNT_CONTEXT, text, digit_bounded) {
            let raw = c.value(text);
            let Some(normalized) = normalize_bank_account(raw) else {
                continue;
            };
            if exclusions.matches(&normalized) {
                tracing::debug!(candidate = %normalized, "Skipping account that is a known phone");
                continue;
            }
            out.add(raw, normalized, tier::BANK_ACCOUNT_CONTEXT, EntityDetail::None);
        }

        let generic_bounds = |t: &str, s: usize, e: usize| {
            digit_bounded(t, s, e) && char_before(t, s) != Some('+')
        };
        for c in scan(&patterns::BANK_ACCOUNT, text, generic_bounds) {
            let raw = c.value(text);
            let Some(normalized) = normalize_bank_account(raw) else {
                continue;
            };
            if looks_like_phone(&normalized) || exclusions.matches(&normalized) {
                continue;
            }
            out.add(raw, normalized, tier::BANK_ACCOUNT_GENERIC, EntityDetail::None);
        }

        out.finish()
    }

    /// IFSC codes; keyword-anchored codes are scored from context (0.98 when
    /// valid), bare codes get 0.85
    pub fn extract_ifsc_codes(&self, text: &str) -> Vec<EntityRecord> {
        let mut out = Collector::new(EntityType::Ifsc);

        for c in scan(&patterns::IFSC_CONTEXT, text, alnum_after) {
            let raw = c.value(text);
            if let Some(normalized) = normalize_ifsc(raw) {
                let context = self.context(text, &c);
                let confidence = entity_confidence(ValueKind::Ifsc, &normalized, Some(context));
                let detail = branch_detail(&normalized);
                out.add(raw, normalized, confidence, detail);
            }
        }

        for c in scan(&patterns::IFSC, text, patterns::alnum_bounded) {
            let raw = c.value(text);
            if let Some(normalized) = normalize_ifsc(raw) {
                let detail = branch_detail(&normalized);
                out.add(raw, normalized, tier::IFSC_GENERIC, detail);
            }
        }

        out.finish()
    }

    /// Links, flagged when they look like phishing (0.95) or not (0.70)
    pub fn extract_urls(&self, text: &str) -> Vec<EntityRecord> {
        let mut out = Collector::new(EntityType::PhishingLink);

        for m in patterns::URL.find_iter(text) {
            let url = m
                .as_str()
                .trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '\'', '"']);
            if url.is_empty() {
                continue;
            }
            let suspicion = suspicious_url_reason(url);
            let confidence = if suspicion.is_some() {
                tier::URL_SUSPICIOUS
            } else {
                tier::URL_PLAIN
            };
            let detail = EntityDetail::Link {
                domain: url_domain(url),
                suspicion,
            };
            out.add(url, url.to_string(), confidence, detail);
        }

        out.finish()
    }

    pub fn extract_emails(&self, text: &str) -> Vec<EntityRecord> {
        let mut out = Collector::new(EntityType::Email);

        let bounds = |t: &str, s: usize, e: usize| {
            !char_before(t, s).is_some_and(is_email_local_char)
                && !char_after(t, e).is_some_and(|c| c.is_ascii_alphanumeric())
        };
        for c in scan(&patterns::EMAIL, text, bounds) {
            let raw = c.value(text);
            let email = raw.to_lowercase();
            if validate_email(&email) {
                out.add(raw, email, tier::EMAIL, EntityDetail::None);
            }
        }

        out.finish()
    }

    /// Aadhaar (masked, 0.80) and PAN (0.85) numbers
    ///
    /// A 12-digit run that is `91` plus one of `phones` is not an Aadhaar.
    pub fn extract_identity_documents(&self, text: &str, phones: &[EntityRecord]) -> Vec<EntityRecord> {
        let exclusions = PhoneExclusions::new(phones);
        let mut out = Collector::new(EntityType::Other);

        for c in scan(&patterns::AADHAAR, text, digit_bounded) {
            let raw = c.value(text);
            let digits = validators::phone_digits(raw);
            if exclusions.matches(&digits) {
                continue;
            }
            if let Some(masked) = mask_aadhaar(raw) {
                let detail = EntityDetail::Identity {
                    identity: IdentityKind::Aadhaar,
                };
                out.add(raw, masked, tier::AADHAAR, detail);
            }
        }

        for c in scan(&patterns::PAN, text, patterns::alnum_bounded) {
            let raw = c.value(text);
            if let Some(pan) = normalize_pan(raw) {
                let detail = EntityDetail::Identity {
                    identity: IdentityKind::Pan,
                };
                out.add(raw, pan, tier::PAN, detail);
            }
        }

        out.finish()
    }

    /// Extract once over the joined text of a conversation
    ///
    /// With `scammer_only`, agent messages are skipped.
    pub fn extract_from_conversation(
        &self,
        messages: &[ConversationMessage],
        scammer_only: bool,
    ) -> SessionIntelligence {
        let combined = messages
            .iter()
            .filter(|m| !scammer_only || m.role.is_inbound())
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        self.extract_all(combined.trim())
    }

    /// Overall confidence of an extraction
    ///
    /// Mean record confidence plus 0.02 per record (at most 0.1), capped at
    /// 0.99. Zero for an empty extraction.
    pub fn calculate_confidence(&self, intel: &SessionIntelligence) -> f32 {
        let count = intel.total_entities();
        if count == 0 {
            return 0.0;
        }
        let mean = intel.iter().map(|r| r.confidence).sum::<f32>() / count as f32;
        let bonus = (count as f32 * 0.02).min(0.1);
        round2((mean + bonus).min(0.99))
    }

    fn context<'t>(&self, text: &'t str, c: &Candidate) -> &'t str {
        patterns::context_window(text, c.value_start, c.value_end, self.options.context_radius)
    }
}

/// Digits of already-extracted phones, compared by exact value and by the
/// last ten digits
struct PhoneExclusions {
    full: HashSet<String>,
    last_ten: HashSet<String>,
}

impl PhoneExclusions {
    fn new(phones: &[EntityRecord]) -> Self {
        let mut full = HashSet::new();
        let mut last_ten = HashSet::new();
        for phone in phones {
            for value in [&phone.raw_value, &phone.normalized_value] {
                let digits = validators::phone_digits(value);
                if digits.len() >= 10 {
                    last_ten.insert(digits[digits.len() - 10..].to_string());
                    full.insert(digits);
                }
            }
        }
        Self { full, last_ten }
    }

    fn matches(&self, digits: &str) -> bool {
        if self.full.contains(digits) {
            return true;
        }
        digits.len() >= 10 && self.last_ten.contains(&digits[digits.len() - 10..])
    }
}

/// A digit run that opens with a mobile number (optionally `91`-prefixed)
fn looks_like_phone(digits: &str) -> bool {
    let bytes = digits.as_bytes();
    let mobile_at = |i: usize| bytes.len() >= i + 10 && matches!(bytes[i], b'6'..=b'9');
    mobile_at(0) || (digits.starts_with("91") && mobile_at(2))
}

fn is_email_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-')
}

fn upi_bounded(text: &str, start: usize, end: usize) -> bool {
    if char_before(text, start).is_some_and(|c| c.is_ascii_alphanumeric() || c == '@') {
        return false;
    }
    let rest = &text[end..];
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '@' => false,
        // `name@domain.tld` is an email
        Some('.') => !chars.next().is_some_and(|c| c.is_ascii_alphanumeric()),
        _ => true,
    }
}

fn alnum_after(text: &str, _start: usize, end: usize) -> bool {
    !char_after(text, end).is_some_and(|c| c.is_ascii_alphanumeric())
}

fn branch_detail(ifsc: &str) -> EntityDetail {
    EntityDetail::Branch {
        bank_code: ifsc[..4].to_string(),
    }
}
