use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest response window accepted from config: 30 days
pub const MAX_RESPONSE_MINUTES: i64 = 30 * 24 * 60;
/// Longest due-soon horizon accepted from config: one year
pub const MAX_DUE_SOON_HOURS: i64 = 366 * 24;

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("invalid keyword pattern: {0}")]
    Keywords(#[from] regex::Error),
    #[error("{field} = {value} is out of range (0..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        max: i64,
    },
}

/// Points added by each priority condition
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Weights {
    pub now: u32,
    pub unread: u32,
    pub portal: u32,
    pub overdue_task: u32,
    pub due_soon_task: u32,
    pub sell_intent: u32,
    pub buy_or_rent_intent: u32,
    pub high_budget: u32,
    pub urgent: u32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            now: 6,
            unread: 3,
            portal: 3,
            overdue_task: 4,
            due_soon_task: 2,
            sell_intent: 4,
            buy_or_rent_intent: 2,
            high_budget: 2,
            urgent: 3,
        }
    }
}

/// Tunable triage constants, as read from the `[rules]` config section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Listing portals whose leads get the short response window
    pub portal_domains: Vec<String>,
    /// Substrings that make an inbound message need an answer
    pub actionable_keywords: Vec<String>,
    /// Substrings that flag a message as urgent
    pub urgency_keywords: Vec<String>,
    pub weights: Weights,
    /// Budget (EUR) from which a lead counts as high value
    pub high_budget_eur: u64,
    /// Minimum score for the `high` label
    pub high_threshold: u32,
    /// Minimum score for the `medium` label
    pub medium_threshold: u32,
    pub portal_response_minutes: i64,
    pub default_response_minutes: i64,
    /// How far ahead an open task counts as due soon
    pub due_soon_hours: i64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            portal_domains: to_strings(&["immotop.lu", "athome.lu", "immobilier.lu", "wortimmo.lu"]),
            actionable_keywords: to_strings(&[
                "?",
                "question",
                "visite",
                "visit",
                "viewing",
                "interested",
                "intéress",
                "budget",
                "€",
                "eur",
                "parking",
                "rdv",
                "rendez-vous",
            ]),
            urgency_keywords: to_strings(&["urgent", "asap", "rapid", "immédiat", "vite"]),
            weights: Weights::default(),
            high_budget_eur: 700_000,
            high_threshold: 10,
            medium_threshold: 6,
            portal_response_minutes: 5,
            default_response_minutes: 60,
            due_soon_hours: 24,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Compiled form of [`RulesConfig`] used by the triage pass.
///
/// Keyword lists become case-insensitive alternations of escaped literals, so a
/// keyword matches anywhere in the text.
#[derive(Debug, Clone)]
pub struct TriageRules {
    pub config: RulesConfig,
    portal_domains: Vec<String>,
    actionable: Option<Regex>,
    urgency: Option<Regex>,
}

impl TriageRules {
    pub fn compile(config: RulesConfig) -> Result<Self, RulesError> {
        check_range(
            "portal_response_minutes",
            config.portal_response_minutes,
            MAX_RESPONSE_MINUTES,
        )?;
        check_range(
            "default_response_minutes",
            config.default_response_minutes,
            MAX_RESPONSE_MINUTES,
        )?;
        check_range("due_soon_hours", config.due_soon_hours, MAX_DUE_SOON_HOURS)?;

        let actionable = keyword_regex(&config.actionable_keywords)?;
        let urgency = keyword_regex(&config.urgency_keywords)?;
        let portal_domains = config
            .portal_domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Ok(Self {
            config,
            portal_domains,
            actionable,
            urgency,
        })
    }

    /// Whether an address belongs to a known listing portal
    pub fn is_portal(&self, addr: &str) -> bool {
        let addr = addr.to_lowercase();
        self.portal_domains.iter().any(|d| addr.contains(d.as_str()))
    }

    pub fn is_actionable(&self, text: &str) -> bool {
        self.actionable.as_ref().is_some_and(|re| re.is_match(text))
    }

    pub fn is_urgent(&self, text: &str) -> bool {
        self.urgency.as_ref().is_some_and(|re| re.is_match(text))
    }

    pub fn weights(&self) -> &Weights {
        &self.config.weights
    }
}

impl Default for TriageRules {
    fn default() -> Self {
        Self::compile(RulesConfig::default()).expect("built-in rules are in range and escaped")
    }
}

fn check_range(field: &'static str, value: i64, max: i64) -> Result<(), RulesError> {
    if (0..=max).contains(&value) {
        Ok(())
    } else {
        Err(RulesError::OutOfRange { field, value, max })
    }
}

/// Empty lists compile to `None`, which never matches
fn keyword_regex(keywords: &[String]) -> Result<Option<Regex>, regex::Error> {
    let escaped: Vec<String> = keywords
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| regex::escape(k))
        .collect();
    if escaped.is_empty() {
        return Ok(None);
    }
    RegexBuilder::new(&escaped.join("|"))
        .case_insensitive(true)
        .build()
        .map(Some)
}
