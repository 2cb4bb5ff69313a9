//! Pattern tables for Indian financial entities
//!
//! The `regex` crate has no look-around, so every pattern here is paired with
//! an explicit boundary check (see [`scan`]). A candidate rejected by its
//! boundary check is retried one character later, so a bad leftmost match
//! never hides a good one further right.

use once_cell::sync::Lazy;
use regex::Regex;

// ===== STATIC REGEX PATTERNS =====

/// Mobile number with optional `+91`/`91`/`0` prefix and one separator
pub static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:(?:\+91|91|0)?[\s.\-]?)?[6-9]\d{9}").unwrap());

/// Mobile number with a separator allowed between any two digits
pub static PHONE_FLEXIBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(?:\+91|91|0)?[\s.\-]?)?[6-9][\s.\-]?(?:\d[\s.\-]?){8}\d").unwrap()
});

/// Number wrapped in `( … )` or `[ … ]`
pub static PHONE_BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\(\[]\s*([+\d\s\-().]+?)\s*[\)\]]").unwrap());

/// Characters stripped from the whole text before the last phone pass
pub static PHONE_TEXT_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\-()\s]").unwrap());

/// UPI handles of banks and payment apps
pub const UPI_HANDLES: &[&str] = &[
    "ybl", "paytm", "okaxis", "oksbi", "okhdfcbank", "okicici", "upi", "apl", "axisbank",
    "sbi", "hdfcbank", "icici", "ibl", "kotak", "indus", "federal", "pnb", "boi", "bob", "cbi",
    "rbl", "yes", "idbi", "abfspay", "axl", "pingpay", "gpay", "phonepe", "amazonpay",
    "freecharge", "mobikwik", "airtel", "jio", "slice", "jupiter", "fi", "niyopay", "postpay",
    "waicici", "wahdfcbank", "wasbi", "waaxis", "yapl", "idfcbank",
];

/// UPI id with a known handle (longest handles tried first)
pub static UPI_STRICT: Lazy<Regex> = Lazy::new(|| {
    let mut handles = UPI_HANDLES.to_vec();
    handles.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    Regex::new(&format!(
        r"(?i)[a-z0-9._\-]{{3,50}}@(?:{})",
        handles.join("|")
    ))
    .unwrap()
});

/// UPI id with any alphabetic handle
pub static UPI_GENERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[a-z0-9._\-]{3,50}@[a-z]{2,20}").unwrap());

/// Account number introduced by an account keyword or a payment verb
pub static BANK_ACCOUNT_CONTEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:(?:a/?c|account|acct|acc)[\s.:]*(?:no\.?|number|num)?[\s.:]*|(?:bank\s*)?(?:a/?c|account)[\s.:]*|(?:transfer|send|pay)[a-z\s]*?(?:to)?[\s.:]*)[\s.:]*\(?(\d{9,18})\)?",
    )
    .unwrap()
});

/// Bare 9 to 18 digit run
pub static BANK_ACCOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{9,18}").unwrap());

/// IFSC introduced by "ifsc", "branch code" or "bank code"
pub static IFSC_CONTEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:ifsc[\s.:]*(?:code)?[\s.:]*|(?:branch|bank)\s*code[\s.:]*)([a-z]{4}0[a-z0-9]{6})",
    )
    .unwrap()
});

/// Bare IFSC shape
pub static IFSC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[a-z]{4}0[a-z0-9]{6}").unwrap());

pub static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://(?:www\.)?[a-z0-9][a-z0-9\-._~:/?#\[\]@!$&'()*+,;=%]*").unwrap()
});

/// Host part of a URL
pub static URL_HOST: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://([^/?#\s]+)").unwrap());

pub static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}").unwrap()
});

pub static AADHAAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[2-9]\d{3}[\s\-]?\d{4}[\s\-]?\d{4}").unwrap());

pub static PAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[a-z]{3}[pchabgjlft][a-z]\d{4}[a-z]").unwrap());

/// A matched candidate: byte span of the whole match and of the value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub start: usize,
    pub end: usize,
    pub value_start: usize,
    pub value_end: usize,
}

impl Candidate {
    pub fn value<'t>(&self, text: &'t str) -> &'t str {
        &text[self.value_start..self.value_end]
    }

    pub fn matched<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }
}

/// Find every match of `re` whose value span passes `accept`
///
/// The value span is capture group 1 when the pattern has one, otherwise the
/// whole match. `accept` receives the full text and the value span.
pub fn scan<F>(re: &Regex, text: &str, accept: F) -> Vec<Candidate>
where
    F: Fn(&str, usize, usize) -> bool,
{
    let mut found = Vec::new();
    let mut pos = 0;
    while pos <= text.len() {
        let Some(caps) = re.captures_at(text, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let value = caps.get(1).unwrap_or(whole);

        if accept(text, value.start(), value.end()) {
            found.push(Candidate {
                start: whole.start(),
                end: whole.end(),
                value_start: value.start(),
                value_end: value.end(),
            });
            pos = if whole.end() > whole.start() {
                whole.end()
            } else {
                next_boundary(text, whole.start())
            };
        } else {
            pos = next_boundary(text, whole.start());
        }
    }
    found
}

fn next_boundary(text: &str, at: usize) -> usize {
    text[at..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| at + c.len_utf8())
}

pub fn char_before(text: &str, at: usize) -> Option<char> {
    text[..at].chars().next_back()
}

pub fn char_after(text: &str, at: usize) -> Option<char> {
    text[at..].chars().next()
}

/// No digit immediately before or after the span
pub fn digit_bounded(text: &str, start: usize, end: usize) -> bool {
    !char_before(text, start).is_some_and(|c| c.is_ascii_digit())
        && !char_after(text, end).is_some_and(|c| c.is_ascii_digit())
}

/// No ASCII letter or digit immediately before or after the span
pub fn alnum_bounded(text: &str, start: usize, end: usize) -> bool {
    !char_before(text, start).is_some_and(|c| c.is_ascii_alphanumeric())
        && !char_after(text, end).is_some_and(|c| c.is_ascii_alphanumeric())
}

/// `radius` characters either side of a span
pub fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let lo = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(i, _)| i);
    let hi = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    &text[lo..hi]
}
