use serde::Serialize;

use crate::alert::{AlertType, SecurityAlert, Severity};

use super::pattern;

/// Similarity at or above which the dedicated phishing check raises an alert.
pub const PHISHING_THRESHOLD: f64 = 0.7;

/// Similarity at or above which a phishing alert becomes critical and blocks.
pub const PHISHING_BLOCK_THRESHOLD: f64 = 0.85;

/// How many leading/trailing characters the prefix and suffix scores look at.
const EDGE_WINDOW: usize = 8;

/// Visual score is zero once lengths differ by more than this.
const MAX_LENGTH_GAP: usize = 5;

const START_WEIGHT: f64 = 0.3;
const END_WEIGHT: f64 = 0.3;
const VISUAL_WEIGHT: f64 = 0.2;
const CONFUSABLE_WEIGHT: f64 = 0.2;

/// Similarity between two addresses in `[0, 1]`.
///
/// Comparison is case-insensitive and works on Unicode scalar values. Equal inputs
/// score 1, an empty input against a non-empty one scores 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() || a == b {
        return if a == b { 1.0 } else { 0.0 };
    }

    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let score = start_match(&a, &b) * START_WEIGHT
        + end_match(&a, &b) * END_WEIGHT
        + visual_similarity(&a, &b) * VISUAL_WEIGHT
        + confusable_similarity(&a, &b) * CONFUSABLE_WEIGHT;

    score.min(1.0)
}

/// True when `b` looks like `a` without being the same address.
pub fn is_similar(a: &str, b: &str) -> bool {
    similarity(a, b) >= PHISHING_THRESHOLD && a.to_lowercase() != b.to_lowercase()
}

/// Matching characters from the start, stopping at the first mismatch, over 8.
fn start_match(a: &[char], b: &[char]) -> f64 {
    let matches = a
        .iter()
        .zip(b.iter())
        .take(EDGE_WINDOW)
        .take_while(|(x, y)| x == y)
        .count();
    matches as f64 / EDGE_WINDOW as f64
}

/// Matching characters from the end, stopping at the first mismatch, over 8.
fn end_match(a: &[char], b: &[char]) -> f64 {
    let matches = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take(EDGE_WINDOW)
        .take_while(|(x, y)| x == y)
        .count();
    matches as f64 / EDGE_WINDOW as f64
}

/// Position-wise equal characters over the longer length.
fn visual_similarity(a: &[char], b: &[char]) -> f64 {
    if a.len().abs_diff(b.len()) > MAX_LENGTH_GAP {
        return 0.0;
    }
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    let matches = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    matches as f64 / longest as f64
}

/// Position-wise equality after collapsing look-alike characters.
fn confusable_similarity(a: &[char], b: &[char]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let matches = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| canonical(**x) == canonical(**y))
        .count();
    matches as f64 / a.len() as f64
}

/// Representative of a character's look-alike class (input is lower-case).
fn canonical(c: char) -> char {
    match c {
        '0' | 'o' | 'c' => '0',
        '1' | 'l' | 'i' => '1',
        '5' | 's' => '5',
        '8' | 'b' => '8',
        'a' | 'e' => 'a',
        'u' | 'v' => 'u',
        'm' | 'n' => 'm',
        other => other,
    }
}

/// Raise a phishing alert when `target` imitates the user's own address.
pub fn detect_phishing(
    user_address: &str,
    target_address: &str,
    threshold: f64,
) -> Option<SecurityAlert> {
    let score = similarity(user_address, target_address);
    if score < threshold || user_address == target_address {
        return None;
    }

    let critical = score >= PHISHING_BLOCK_THRESHOLD;
    let severity = if critical {
        Severity::Critical
    } else {
        Severity::High
    };

    tracing::warn!(
        target_address = %target_address,
        similarity = score,
        severity = severity.as_str(),
        "Look-alike destination address"
    );

    Some(
        SecurityAlert::new(
            "phishing",
            AlertType::Phishing,
            severity,
            "Possible phishing attack",
            format!(
                "The destination address is suspiciously similar to yours ({}% similar)",
                (score * 100.0).round() as i64
            ),
            Some(target_address.to_string()),
        )
        .with_blocked(critical),
    )
}

/// Full anti-phishing check: look-alike detection first, then known bad patterns.
pub fn phishing_check(user_address: &str, target_address: &str) -> Option<SecurityAlert> {
    detect_phishing(user_address, target_address, PHISHING_THRESHOLD)
        .or_else(|| pattern::detect_suspicious_patterns(target_address))
}

/// Shorten an address to `first8...last8` for side-by-side comparison.
pub fn format_for_comparison(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 20 {
        return address.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 8..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Breakdown of a similarity comparison for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityReport {
    pub overall_similarity: f64,
    pub start_similarity: f64,
    pub end_similarity: f64,
    pub risk_level: Severity,
    pub recommendation: &'static str,
}

pub fn similarity_report(user_address: &str, target_address: &str) -> SimilarityReport {
    let overall = similarity(user_address, target_address);
    let a: Vec<char> = user_address.to_lowercase().chars().collect();
    let b: Vec<char> = target_address.to_lowercase().chars().collect();

    let risk_level = if overall >= 0.9 {
        Severity::Critical
    } else if overall >= PHISHING_THRESHOLD {
        Severity::High
    } else {
        Severity::Low
    };

    let recommendation = if overall >= 0.8 {
        "Do not send funds: highly suspicious address"
    } else if overall >= 0.5 {
        "Verify carefully before sending"
    } else {
        "Address looks safe"
    };

    SimilarityReport {
        overall_similarity: overall,
        start_similarity: start_match(&a, &b),
        end_similarity: end_match(&a, &b),
        risk_level,
        recommendation,
    }
}
