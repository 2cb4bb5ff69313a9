//! Scam rule tables
//!
//! Keyword lists are matched as case-insensitive substrings; phrase patterns
//! are regexes matched against the lower-cased message.

use scamshield_core::ScamCategory;

/// Keyword and phrase-pattern set for one category
#[derive(Debug, Clone, Copy)]
pub struct CategoryRules {
    pub category: ScamCategory,
    pub keywords: &'static [&'static str],
    pub phrases: &'static [&'static str],
}

/// Rule sets in category declaration order
pub const CATEGORY_RULES: &[CategoryRules] = &[
    CategoryRules {
        category: ScamCategory::KycPhishing,
        keywords: &[
            "kyc",
            "update kyc",
            "kyc expire",
            "kyc verification",
            "account block",
            "account suspend",
            "pan link",
            "pan aadhaar",
            "link expire",
            "verification pending",
            "reactivate account",
            "complete verification",
            "verify account",
            "update details",
        ],
        phrases: &[
            r"kyc.*expir",
            r"kyc.*update",
            r"kyc.*pending",
            r"account.*block",
            r"account.*suspend",
            r"account.*deactivat",
            r"pan.*link",
            r"aadhaar.*link",
            r"verify.*account",
            r"complete.*verification",
            r"update.*detail",
        ],
    },
    CategoryRules {
        category: ScamCategory::LotteryPrize,
        keywords: &[
            "lottery",
            "winner",
            "prize",
            "jackpot",
            "lucky draw",
            "congratulations",
            "won",
            "claim",
            "reward",
            "cash prize",
            "selected",
            "lucky customer",
            "bumper prize",
        ],
        phrases: &[
            r"you.*won",
            r"you.*winner",
            r"claim.*prize",
            r"lucky.*draw",
            r"cash.*prize",
            r"congratulation",
            r"selected.*winner",
            r"bumper.*prize",
        ],
    },
    CategoryRules {
        category: ScamCategory::InvestmentFraud,
        keywords: &[
            "invest",
            "trading",
            "crypto",
            "bitcoin",
            "forex",
            "guaranteed return",
            "double money",
            "high return",
            "profit daily",
            "investment scheme",
            "money back",
            "return guarantee",
            "earn daily",
            "passive income",
        ],
        phrases: &[
            r"invest.*return",
            r"guaranteed.*return",
            r"double.*money",
            r"high.*return",
            r"profit.*daily",
            r"daily.*earning",
            r"earn.*per.*day",
            r"monthly.*return",
        ],
    },
    CategoryRules {
        category: ScamCategory::Impersonation,
        keywords: &[
            "bank manager",
            "rbi",
            "reserve bank",
            "sbi",
            "hdfc",
            "icici",
            "axis bank",
            "income tax",
            "irs",
            "customs",
            "police",
            "cyber cell",
            "official",
            "authority",
            "government",
            "ministry",
            "department",
        ],
        phrases: &[
            r"calling.*from.*bank",
            r"bank.*official",
            r"from.*rbi",
            r"income.*tax.*department",
            r"cyber.*cell",
            r"police.*station",
        ],
    },
    CategoryRules {
        category: ScamCategory::LoanScam,
        keywords: &[
            "instant loan",
            "personal loan",
            "loan approved",
            "pre-approved loan",
            "loan sanction",
            "processing fee",
            "registration fee",
            "loan offer",
            "credit limit",
            "zero interest",
            "no documentation",
        ],
        phrases: &[
            r"loan.*approved",
            r"pre.*approved.*loan",
            r"instant.*loan",
            r"loan.*sanction",
            r"processing.*fee",
            r"registration.*fee",
        ],
    },
    CategoryRules {
        category: ScamCategory::JobScam,
        keywords: &[
            "work from home",
            "job offer",
            "part time job",
            "typing job",
            "data entry",
            "earn from home",
            "registration fee",
            "joining fee",
            "job guarantee",
            "immediate joining",
            "no experience",
        ],
        phrases: &[
            r"work.*from.*home",
            r"job.*offer",
            r"part.*time.*job",
            r"earn.*from.*home",
            r"typing.*job",
            r"data.*entry",
            r"registration.*fee",
            r"joining.*fee",
        ],
    },
    CategoryRules {
        category: ScamCategory::OtpTheft,
        keywords: &[
            "otp",
            "verification code",
            "one time password",
            "share otp",
            "send otp",
            "tell otp",
            "otp received",
            "verify otp",
            "enter otp",
            "sms code",
        ],
        phrases: &[
            r"share.*otp",
            r"send.*otp",
            r"tell.*otp",
            r"otp.*received",
            r"verification.*code",
            r"enter.*otp",
            r"give.*otp",
        ],
    },
    CategoryRules {
        category: ScamCategory::TechSupport,
        keywords: &[
            "virus",
            "malware",
            "computer infected",
            "hack",
            "remote access",
            "anydesk",
            "teamviewer",
            "support call",
            "microsoft",
            "windows error",
            "security alert",
            "install app",
            "download app",
        ],
        phrases: &[
            r"computer.*infected",
            r"virus.*detected",
            r"download.*app",
            r"install.*app",
            r"remote.*access",
            r"security.*alert",
        ],
    },
];

/// Urgency, payment and credential cues shared by every category
pub const HIGH_RISK_PATTERNS: &[&str] = &[
    r"click.*link",
    r"update.*urgent",
    r"expire.*today",
    r"block.*within",
    r"suspended.*immediately",
    r"share.*otp",
    r"processing.*fee",
    r"registration.*charge",
    r"pay.*₹",
    r"pay.*rs",
    r"transfer.*amount",
];

/// Single words that signal a scam even without a category template
///
/// Matched against whitespace-separated words of the message.
pub const CRITICAL_WORDS: &[&str] = &[
    "otp", "pin", "cvv", "password", "kyc", "blocked", "suspended", "verify", "urgent", "expire",
    "expir",
];

/// Multi-word cues matched as substrings
pub const CRITICAL_PHRASES: &[&str] = &[
    "click link",
    "update now",
    "share otp",
    "send otp",
    "verify now",
];

/// Category inferred from critical cues when no template matched
///
/// Checked in order; the first group with a match decides.
pub const FALLBACK_CATEGORY_CUES: &[(&[&str], ScamCategory)] = &[
    (&["otp", "pin"], ScamCategory::OtpTheft),
    (&["kyc", "verify"], ScamCategory::KycPhishing),
    (&["blocked", "suspended"], ScamCategory::KycPhishing),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_rules_once() {
        let covered: Vec<_> = CATEGORY_RULES.iter().map(|r| r.category).collect();
        let expected: Vec<_> = ScamCategory::all()
            .iter()
            .copied()
            .filter(|c| *c != ScamCategory::Unknown)
            .collect();
        assert_eq!(covered, expected);
    }

    #[test]
    fn test_tables_are_lowercase() {
        for rules in CATEGORY_RULES {
            for kw in rules.keywords {
                assert_eq!(*kw, kw.to_lowercase());
            }
        }
    }
}
