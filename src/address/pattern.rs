use once_cell::sync::Lazy;
use regex::Regex;

use crate::alert::{AlertType, SecurityAlert, Severity};

// `\d` in `regex` matches Unicode digits; addresses are scored on ASCII digits only.
static NUMERIC_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{4,}").expect("valid regex"));
static KEYBOARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)qwerty|asdf|zxcv|1234|abcd").expect("valid regex"));
static TEST_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)test|fake|demo|sample|example").expect("valid regex"));

static LEADING_ZEROS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0+[1-9a-f]").expect("valid regex"));
static TRAILING_ZEROS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[1-9a-f]+0+$").expect("valid regex"));
static ALL_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));
static TEST_OR_KEYBOARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"test|fake|demo|sample|example|qwerty|asdf").expect("valid regex")
});
static LONG_DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{6,}").expect("valid regex"));

pub const NUMERIC_RUN_POINTS: u32 = 30;
pub const KEYBOARD_POINTS: u32 = 40;
pub const REPETITION_POINTS: u32 = 25;
pub const TEST_KEYWORD_POINTS: u32 = 50;
pub const DIGIT_HEAVY_POINTS: u32 = 20;

const DIGIT_HEAVY_RATIO: f64 = 0.7;

/// Result of scanning an address for lexical red flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternAnalysis {
    pub suspicious: bool,
    pub reasons: Vec<String>,
    pub risk_score: u32,
}

impl PatternAnalysis {
    fn flag(&mut self, reason: &str, points: u32) {
        self.reasons.push(reason.to_string());
        self.risk_score += points;
    }
}

/// Run every heuristic against `address`. Heuristics are additive: one address
/// can trip several of them.
pub fn analyze(address: &str) -> PatternAnalysis {
    let mut analysis = PatternAnalysis::default();

    if NUMERIC_RUN.is_match(address) {
        analysis.flag("Contains suspicious long numeric sequences", NUMERIC_RUN_POINTS);
    }

    if KEYBOARD.is_match(address) {
        analysis.flag(
            "Contains keyboard patterns typical of fake addresses",
            KEYBOARD_POINTS,
        );
    }

    if longest_run(address) >= 5 {
        analysis.flag("Contains excessive repeated characters", REPETITION_POINTS);
    }

    if TEST_KEYWORD.is_match(address) {
        analysis.flag("Looks like a test or demo address", TEST_KEYWORD_POINTS);
    }

    if digit_ratio(address).is_some_and(|ratio| ratio > DIGIT_HEAVY_RATIO) {
        analysis.flag("Suspicious ratio of digits to letters", DIGIT_HEAVY_POINTS);
    }

    analysis.suspicious = analysis.risk_score > 0;
    analysis
}

/// Stand-alone "known suspicious pattern" check, outside the scoring pipeline.
///
/// Patterns are tried in a fixed priority order on the lower-cased address and the
/// first match produces a single low-severity, non-blocking alert.
pub fn detect_suspicious_patterns(address: &str) -> Option<SecurityAlert> {
    let lowered = address.to_lowercase();

    let message = if LEADING_ZEROS.is_match(&lowered) {
        "Address starts with a suspicious run of zeros"
    } else if TRAILING_ZEROS.is_match(&lowered) {
        "Address ends with a suspicious run of zeros"
    } else if longest_run(&lowered) >= 6 {
        "Address contains excessively repeated characters"
    } else if ALL_NUMERIC.is_match(&lowered) {
        "Address is made of digits only"
    } else if TEST_OR_KEYBOARD.is_match(&lowered) {
        "Address looks like a test address or contains keyboard patterns"
    } else if LONG_DIGIT_RUN.is_match(&lowered) {
        "Contains suspicious long numeric sequences"
    } else {
        return None;
    };

    Some(SecurityAlert::new(
        "suspicious",
        AlertType::Suspicious,
        Severity::Low,
        "Suspicious pattern detected",
        message,
        Some(address.to_string()),
    ))
}

/// Length of the longest run of one repeated character.
fn longest_run(s: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<char> = None;

    for c in s.chars() {
        if previous == Some(c) {
            current += 1;
        } else {
            current = 1;
            previous = Some(c);
        }
        longest = longest.max(current);
    }

    longest
}

/// Share of ASCII digits among ASCII alphanumerics. `None` when there are none.
fn digit_ratio(s: &str) -> Option<f64> {
    let digits = s.chars().filter(|c| c.is_ascii_digit()).count();
    let letters = s.chars().filter(|c| c.is_ascii_alphabetic()).count();
    let total = digits + letters;
    if total == 0 {
        return None;
    }
    Some(digits as f64 / total as f64)
}
