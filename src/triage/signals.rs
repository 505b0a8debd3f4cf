use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::rules::TriageRules;
use super::types::{Intent, LeadSignals, Message};

/// Turns an inbound message into lead signals. Implementations must be pure.
pub trait LeadSignalExtractor: Sync {
    fn extract(&self, message: &Message) -> LeadSignals;
}

/// Extracts nothing; every thread scores on its aggregate alone
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSignals;

impl LeadSignalExtractor for NoSignals {
    fn extract(&self, _message: &Message) -> LeadSignals {
        LeadSignals::none()
    }
}

// Checked in order: a seller asking about a visit is still a seller
const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (Intent::Sell, &["vendre", "vente", "estimation", "sell", "valuation"]),
    (Intent::Rent, &["louer", "location", "rent", "lease"]),
    (Intent::Buy, &["acheter", "achat", "buy", "purchase", "visite", "visit"]),
];

// Digit groups joined by one separator each; a separator followed by anything but a
// digit ("120 m2, 450 000 €") ends the amount
static BUDGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[ \x{a0}\x{202f}.,']\d+)*)\s*(k)?\s*(?:€|euros?\b|eur\b)")
        .expect("valid regex")
});

static PROPERTY_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:r[ée]f(?:[ée]rence)?|reference)\.?\s*[:#n°]*\s*([a-z0-9][a-z0-9-]*\d[a-z0-9-]*)")
        .expect("valid regex")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\+\d{2,3}|\b0\d)[\d .-]{6,}\d").expect("valid regex"));

/// Keyword-based extractor for French/English agency mail.
pub struct KeywordSignalExtractor {
    rules: TriageRules,
}

impl KeywordSignalExtractor {
    pub fn new(rules: TriageRules) -> Self {
        Self { rules }
    }
}

impl LeadSignalExtractor for KeywordSignalExtractor {
    fn extract(&self, message: &Message) -> LeadSignals {
        let text = message.text();
        let lower = text.to_lowercase();

        let intent = INTENT_KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(intent, _)| *intent)
            .unwrap_or(Intent::Unknown);
        let budget_eur = parse_budget(&text);
        let property_reference = PROPERTY_REF
            .captures(&text)
            .map(|c| c[1].to_uppercase());

        let mut tags = BTreeSet::new();
        if self.rules.is_portal(&message.from.addr) {
            tags.insert("portal".to_string());
        }
        if PHONE.is_match(&text) {
            tags.insert("phone".to_string());
        }
        if intent != Intent::Unknown {
            tags.insert(format!("intent:{}", intent.label().to_lowercase()));
        }

        let mut found = Vec::new();
        if intent != Intent::Unknown {
            found.push(format!("{} intent", intent.label().to_lowercase()));
        }
        if budget_eur.is_some() {
            found.push("budget".to_string());
        }
        if property_reference.is_some() {
            found.push("property reference".to_string());
        }
        let reason = if found.is_empty() {
            "no signal".to_string()
        } else {
            format!("matched {}", found.join(", "))
        };

        LeadSignals {
            intent,
            budget_eur,
            property_reference,
            reason,
            tags,
        }
    }
}

/// First positive whole-euro amount in the text. Thousands separators are dropped
/// ("450 000 €", "1.200.000 EUR"), one or two trailing digits after `,` or `.` are cents
/// ("450 000,00 €"), and a `k` multiplies by 1000 ("800k€", "12,5k€").
fn parse_budget(text: &str) -> Option<u64> {
    BUDGET.captures_iter(text).find_map(|caps| {
        let raw = &caps[1];
        let (whole, fraction) = split_decimals(raw);
        let digits: String = whole.chars().filter(|c| c.is_ascii_digit()).collect();
        let amount: u64 = digits.parse().ok()?;
        let amount = if caps.get(2).is_some() {
            // "12,5k" is 12 500, "12,25k" is 12 250
            let cents = match fraction.len() {
                1 => fraction.parse::<u64>().ok()? * 100,
                2 => fraction.parse::<u64>().ok()? * 10,
                _ => 0,
            };
            amount.checked_mul(1000)?.checked_add(cents)?
        } else {
            amount
        };
        (amount > 0).then_some(amount)
    })
}

/// Split off a decimal tail of one or two digits; three digits after a separator are
/// a thousands group
fn split_decimals(raw: &str) -> (&str, &str) {
    match raw.rfind(|c: char| c == '.' || c == ',') {
        Some(i) if (1..=2).contains(&(raw.len() - i - 1)) => (&raw[..i], &raw[i + 1..]),
        _ => (raw, ""),
    }
}

/// One-line summary of the signals for list display and search.
pub fn summary(signals: &LeadSignals) -> String {
    let mut parts = Vec::new();
    if signals.intent != Intent::Unknown {
        parts.push(signals.intent.label().to_string());
    }
    if let Some(budget) = signals.budget_eur {
        parts.push(format!("Budget €{}", group_thousands(budget)));
    }
    if let Some(reference) = &signals.property_reference {
        parts.push(format!("Ref {}", reference));
    }
    parts.extend(signals.tags.iter().map(|t| format!("#{}", t)));

    if parts.is_empty() {
        signals.reason.clone()
    } else {
        parts.join(" · ")
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}
