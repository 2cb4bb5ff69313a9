//! Entity confidence scoring

use crate::validators::{validate_ifsc, validate_phone, validate_upi, ValueKind};
use scamshield_config::constants::confidence as tier;
use scamshield_core::intelligence::round2;

/// Words near a match that make the type more likely
fn context_keywords(kind: ValueKind) -> &'static [&'static str] {
    match kind {
        ValueKind::Phone => &["call", "phone", "mobile", "contact", "number", "whatsapp"],
        ValueKind::Upi => &["pay", "transfer", "upi", "gpay", "phonepe", "paytm"],
        ValueKind::BankAccount => &["account", "a/c", "transfer", "deposit", "bank"],
        ValueKind::Ifsc => &["ifsc", "branch", "bank", "transfer"],
        _ => &[],
    }
}

/// Score a candidate value
///
/// Starts at the base tier, rises to the validated tier when the type
/// validator accepts the value, gains a capped boost when a context keyword is
/// nearby, and is finally overridden for values that pass strict validation
/// (phone, known-handle UPI, IFSC). Rounded to 2 decimals.
pub fn entity_confidence(kind: ValueKind, value: &str, context: Option<&str>) -> f32 {
    let mut confidence = tier::BASE;

    if kind.validate(value) {
        confidence = tier::VALIDATED;
    }

    if let Some(context) = context {
        let lower = context.to_lowercase();
        if context_keywords(kind).iter().any(|kw| lower.contains(kw)) {
            confidence = (confidence + tier::CONTEXT_BOOST).min(tier::CONTEXT_CAP);
        }
    }

    match kind {
        ValueKind::Phone if validate_phone(value) => confidence = tier::PHONE_STRICT,
        ValueKind::Upi if validate_upi(value) => confidence = tier::UPI_STRICT,
        ValueKind::Ifsc if validate_ifsc(value) => confidence = tier::IFSC_STRICT,
        _ => {}
    }

    round2(confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_overrides() {
        assert_eq!(entity_confidence(ValueKind::Phone, "+919876543210", None), 0.95);
        assert_eq!(entity_confidence(ValueKind::Upi, "user@ybl", None), 0.92);
        assert_eq!(
            entity_confidence(ValueKind::Ifsc, "HDFC0001234", Some("IFSC HDFC0001234")),
            0.98
        );
    }

    #[test]
    fn test_context_boost() {
        assert_eq!(entity_confidence(ValueKind::BankAccount, "123456789012", None), 0.85);
        assert_eq!(
            entity_confidence(ValueKind::BankAccount, "123456789012", Some("my A/C is")),
            0.95
        );
        // invalid values only reach base plus boost
        assert_eq!(entity_confidence(ValueKind::BankAccount, "12", Some("bank")), 0.8);
        assert_eq!(entity_confidence(ValueKind::Email, "nope", None), 0.7);
    }
}
