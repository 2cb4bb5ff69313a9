//! Format validation and canonicalisation per entity type
//!
//! Every function here is total: malformed input yields `false` or `None`,
//! never an error.

use crate::patterns::{UPI_HANDLES, URL_HOST};
use once_cell::sync::Lazy;
use regex::Regex;
use scamshield_core::UrlSuspicion;

static URL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[a-zA-Z0-9][a-zA-Z0-9\-._~:/?#\[\]@!$&'()*+,;=%]*$").unwrap()
});

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").unwrap());

/// TLDs common in throwaway phishing domains
pub const SUSPICIOUS_TLDS: &[&str] = &[
    "xyz", "tk", "ml", "ga", "cf", "gq", "top", "pw", "cc", "club", "site", "online", "live",
    "info", "click", "link", "space", "fun", "work", "surf", "cam", "icu", "buzz",
];

/// Genuine bank domains; a host equal to or under one of these is never suspicious
pub const LEGITIMATE_BANK_DOMAINS: &[&str] = &[
    "sbi.co.in",
    "onlinesbi.com",
    "hdfcbank.com",
    "netbanking.hdfcbank.com",
    "icicibank.com",
    "infinity.icicibank.com",
    "axisbank.com",
    "omni.axisbank.com",
    "kotak.com",
    "kotakmf.com",
    "yesbank.in",
    "yesbank.com",
    "pnbindia.in",
    "netpnb.com",
    "bankofbaroda.in",
    "barodaconnect.com",
    "bankofindia.co.in",
    "canarabank.com",
    "unionbankofindia.co.in",
    "idbibank.in",
    "rblbank.com",
    "indusind.com",
    "federalbank.co.in",
];

const BANK_NAMES: &[&str] = &["sbi", "hdfc", "icici", "axis", "pnb", "bob", "kotak", "yes", "idbi"];

const PHISHING_KEYWORDS: &[&str] = &["kyc", "update", "verify", "secure", "login", "unlock", "blocked"];

const URL_SHORTENERS: &[&str] = &["bit.ly", "goo.gl", "t.co", "tinyurl.com", "is.gd", "cutt.ly"];

/// Holder-type codes allowed in the 4th PAN character
const PAN_HOLDER_TYPES: &str = "PCHABGJLFT";

/// Validator selector used by confidence scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Phone,
    Upi,
    BankAccount,
    Ifsc,
    Url,
    Email,
    Aadhaar,
    Pan,
}

impl ValueKind {
    pub fn validate(&self, value: &str) -> bool {
        match self {
            ValueKind::Phone => validate_phone(value),
            ValueKind::Upi => validate_upi(value),
            ValueKind::BankAccount => validate_bank_account(value),
            ValueKind::Ifsc => validate_ifsc(value),
            ValueKind::Url => validate_url(value),
            ValueKind::Email => validate_email(value),
            ValueKind::Aadhaar => validate_aadhaar(value),
            ValueKind::Pan => validate_pan(value),
        }
    }
}

fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn strip_separators(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Strip separators and the country/trunk prefix, leaving the subscriber digits
fn phone_subscriber(phone: &str) -> Option<String> {
    let cleaned: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    let subscriber = if let Some(rest) = cleaned.strip_prefix("+91") {
        rest
    } else if cleaned.len() == 12 && cleaned.starts_with("91") {
        &cleaned[2..]
    } else if let Some(rest) = cleaned.strip_prefix('0') {
        rest
    } else {
        cleaned.as_str()
    };

    let valid = subscriber.len() == 10
        && subscriber.bytes().all(|b| b.is_ascii_digit())
        && matches!(subscriber.as_bytes()[0], b'6'..=b'9');
    valid.then(|| subscriber.to_string())
}

/// Indian mobile number: 10 digits starting 6-9 after an optional `+91`, `91` or `0`
pub fn validate_phone(phone: &str) -> bool {
    phone_subscriber(phone).is_some()
}

/// `+91` followed by the 10 subscriber digits
pub fn normalize_phone(phone: &str) -> Option<String> {
    phone_subscriber(phone).map(|digits| format!("+91{}", digits))
}

fn split_upi(upi_id: &str) -> Option<(String, String)> {
    let lower = upi_id.trim().to_lowercase();
    let mut parts = lower.split('@');
    let local = parts.next()?.to_string();
    let handle = parts.next()?.to_string();
    if parts.next().is_some() {
        return None;
    }
    Some((local, handle))
}

fn valid_upi_local(local: &str) -> bool {
    (3..=50).contains(&local.len())
        && local
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'.' | b'_' | b'-'))
}

/// UPI id whose handle is a known bank or payment app
pub fn validate_upi(upi_id: &str) -> bool {
    split_upi(upi_id)
        .is_some_and(|(local, handle)| valid_upi_local(&local) && UPI_HANDLES.contains(&handle.as_str()))
}

/// UPI id with any alphabetic handle of 2 to 20 letters
pub fn validate_upi_loose(upi_id: &str) -> bool {
    split_upi(upi_id).is_some_and(|(local, handle)| {
        valid_upi_local(&local)
            && (2..=20).contains(&handle.len())
            && handle.bytes().all(|b| b.is_ascii_lowercase())
    })
}

pub fn normalize_upi(upi_id: &str) -> Option<String> {
    validate_upi_loose(upi_id).then(|| upi_id.trim().to_lowercase())
}

/// 9 to 18 digits, rejecting the 10-digit mobile shape
pub fn validate_bank_account(account: &str) -> bool {
    let cleaned = strip_separators(account);
    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if !(9..=18).contains(&cleaned.len()) {
        return false;
    }
    !(cleaned.len() == 10 && matches!(cleaned.as_bytes()[0], b'6'..=b'9'))
}

pub fn normalize_bank_account(account: &str) -> Option<String> {
    let cleaned = strip_separators(account);
    validate_bank_account(&cleaned).then_some(cleaned)
}

/// 4 letters, a literal `0`, then 6 letters or digits
pub fn validate_ifsc(ifsc: &str) -> bool {
    let code = ifsc.trim().to_ascii_uppercase();
    let bytes = code.as_bytes();
    bytes.len() == 11
        && bytes[..4].iter().all(u8::is_ascii_alphabetic)
        && bytes[4] == b'0'
        && bytes[5..].iter().all(u8::is_ascii_alphanumeric)
}

pub fn normalize_ifsc(ifsc: &str) -> Option<String> {
    validate_ifsc(ifsc).then(|| ifsc.trim().to_ascii_uppercase())
}

pub fn validate_url(url: &str) -> bool {
    !url.is_empty() && URL_SHAPE.is_match(url)
}

/// Lower-cased host of an `http(s)` URL
pub fn url_domain(url: &str) -> Option<String> {
    URL_HOST
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Why a URL looks like phishing, if it does
///
/// Checks run in order: genuine bank domain (never suspicious), suspicious
/// TLD, bank name inside a foreign domain, phishing keyword, URL shortener.
pub fn suspicious_url_reason(url: &str) -> Option<UrlSuspicion> {
    let domain = url_domain(url)?;

    let is_legit = LEGITIMATE_BANK_DOMAINS
        .iter()
        .any(|legit| domain == *legit || domain.ends_with(&format!(".{}", legit)));
    if is_legit {
        return None;
    }

    if SUSPICIOUS_TLDS
        .iter()
        .any(|tld| domain.ends_with(&format!(".{}", tld)))
    {
        return Some(UrlSuspicion::SuspiciousTld);
    }

    let mentions_legit = LEGITIMATE_BANK_DOMAINS.iter().any(|legit| domain.contains(legit));
    if !mentions_legit && BANK_NAMES.iter().any(|bank| domain.contains(bank)) {
        return Some(UrlSuspicion::FakeBankDomain);
    }

    if PHISHING_KEYWORDS.iter().any(|kw| domain.contains(kw)) {
        return Some(UrlSuspicion::PhishingKeyword);
    }

    if URL_SHORTENERS.iter().any(|s| domain.contains(s)) {
        return Some(UrlSuspicion::UrlShortener);
    }

    None
}

pub fn is_suspicious_url(url: &str) -> bool {
    suspicious_url_reason(url).is_some()
}

pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && EMAIL_SHAPE.is_match(email)
}

/// 12 digits, first digit 2-9; spaces and dashes allowed
///
/// Format only, the Verhoeff check digit is not verified.
pub fn validate_aadhaar(aadhaar: &str) -> bool {
    let cleaned = strip_separators(aadhaar);
    cleaned.len() == 12
        && cleaned.bytes().all(|b| b.is_ascii_digit())
        && !matches!(cleaned.as_bytes()[0], b'0' | b'1')
}

/// First four and last four digits kept, middle masked
pub fn mask_aadhaar(aadhaar: &str) -> Option<String> {
    let cleaned = strip_separators(aadhaar);
    if !validate_aadhaar(&cleaned) {
        return None;
    }
    Some(format!("{}XXXX{}", &cleaned[..4], &cleaned[8..]))
}

/// `AAAAA9999A` with a holder-type code in 4th position
pub fn validate_pan(pan: &str) -> bool {
    let code = pan.trim().to_ascii_uppercase();
    let bytes = code.as_bytes();
    bytes.len() == 10
        && bytes[..5].iter().all(u8::is_ascii_alphabetic)
        && PAN_HOLDER_TYPES.as_bytes().contains(&bytes[3])
        && bytes[5..9].iter().all(u8::is_ascii_digit)
        && bytes[9].is_ascii_alphabetic()
}

pub fn normalize_pan(pan: &str) -> Option<String> {
    validate_pan(pan).then(|| pan.trim().to_ascii_uppercase())
}

/// Digits of a phone-like string, used for cross-type exclusion
pub fn phone_digits(value: &str) -> String {
    digits_only(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+919876543210"));
        assert!(validate_phone("9876543210"));
        assert!(validate_phone("+91 98765-43210"));
        assert!(validate_phone("09876543210"));
        assert!(validate_phone("919876543210"));
        assert!(!validate_phone("1234567890"));
        assert!(!validate_phone("987654"));
        assert!(!validate_phone(""));
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("98765 43210").as_deref(), Some("+919876543210"));
        assert_eq!(normalize_phone("+91-9876543210").as_deref(), Some("+919876543210"));
        assert_eq!(normalize_phone("5876543210"), None);
    }

    #[test]
    fn test_validate_upi() {
        assert!(validate_upi("user@ybl"));
        assert!(validate_upi("merchant.store@paytm"));
        assert!(!validate_upi("user@custombank"));
        assert!(!validate_upi("ab@ybl"));
        assert!(!validate_upi("user"));

        assert!(validate_upi_loose("user@custombank"));
        assert!(!validate_upi_loose("a@b"));
        assert!(!validate_upi_loose("user@bank1"));
        assert_eq!(normalize_upi("User@YBL").as_deref(), Some("user@ybl"));
    }

    #[test]
    fn test_validate_bank_account() {
        assert!(validate_bank_account("1234567890123"));
        assert!(validate_bank_account("123456789"));
        assert!(!validate_bank_account("12345678"));
        assert!(!validate_bank_account("1234567890123456789"));
        // mobile shape
        assert!(!validate_bank_account("9876543210"));
        // ten digits not starting 6-9 are fine
        assert!(validate_bank_account("1234567890"));
        assert_eq!(
            normalize_bank_account("1234 5678 9012").as_deref(),
            Some("123456789012")
        );
    }

    #[test]
    fn test_validate_ifsc() {
        assert!(validate_ifsc("HDFC0001234"));
        assert!(validate_ifsc("sbin0123456"));
        assert!(!validate_ifsc("HDFC1001234"));
        assert!(!validate_ifsc("INVALID"));
        assert_eq!(normalize_ifsc("sbin0abc123").as_deref(), Some("SBIN0ABC123"));
    }

    #[test]
    fn test_suspicious_urls() {
        assert_eq!(
            suspicious_url_reason("http://sbi-update.xyz/login"),
            Some(UrlSuspicion::SuspiciousTld)
        );
        assert_eq!(suspicious_url_reason("https://www.onlinesbi.com/"), None);
        assert_eq!(suspicious_url_reason("https://sbi.co.in/"), None);
        assert_eq!(
            suspicious_url_reason("https://hdfc-netbanking.com/x"),
            Some(UrlSuspicion::FakeBankDomain)
        );
        assert_eq!(
            suspicious_url_reason("https://kyc-portal.com"),
            Some(UrlSuspicion::PhishingKeyword)
        );
        assert_eq!(
            suspicious_url_reason("https://bit.ly/3abc"),
            Some(UrlSuspicion::UrlShortener)
        );
        assert_eq!(suspicious_url_reason("https://example.com"), None);
        assert!(validate_url("https://example.com/path?q=1"));
        assert!(!validate_url("not-a-url"));
    }

    #[test]
    fn test_identity_documents() {
        assert!(validate_aadhaar("2345 6789 0123"));
        assert!(!validate_aadhaar("123456789012"));
        assert!(!validate_aadhaar("23456789012"));
        assert_eq!(mask_aadhaar("2345-6789-0123").as_deref(), Some("2345XXXX0123"));

        assert!(validate_pan("ABCPE1234F"));
        assert!(!validate_pan("ABCDE1234F"));
        assert!(!validate_pan("ABCD12345"));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com"));
        assert!(!validate_email("user@ybl"));
        assert!(!validate_email("invalid"));
    }
}
