use crate::address::format::{self, ChainProfile};
use crate::address::{pattern, similarity};
use crate::registry::MaliciousAddressRegistry;

use super::types::{PatternFlags, RiskFinding, TransactionIntent};

pub const MALICIOUS_POINTS: u32 = 80;
pub const SIMILARITY_POINTS: u32 = 70;
pub const ZERO_VALUE_POINTS: u32 = 40;
pub const HIGH_VALUE_POINTS: u32 = 20;
pub const INVALID_FORMAT_POINTS: u32 = 60;

/// Similarity above which the engine scores a look-alike destination.
/// Distinct from the stand-alone phishing threshold in [`similarity::PHISHING_THRESHOLD`].
pub const SIMILARITY_RISK_THRESHOLD: f64 = 0.8;

/// Estimated fiat value above which a transfer is flagged as high-value.
pub const HIGH_VALUE_THRESHOLD: f64 = 10_000.0;

/// Destination is in the malicious-address registry.
pub async fn check_malicious(
    registry: &MaliciousAddressRegistry,
    intent: &TransactionIntent,
) -> Option<RiskFinding> {
    if intent.to_address.is_empty() || !registry.is_malicious(&intent.to_address).await {
        return None;
    }
    Some(RiskFinding::new(
        "Address reported as malicious",
        MALICIOUS_POINTS,
        PatternFlags::default(),
    ))
}

/// Destination looks like the user's own address. Skipped without an own address.
pub fn check_similarity(own_address: Option<&str>, intent: &TransactionIntent) -> Option<RiskFinding> {
    let own = own_address.filter(|a| !a.is_empty())?;
    let score = similarity::similarity(own, &intent.to_address);
    if score <= SIMILARITY_RISK_THRESHOLD {
        return None;
    }

    Some(RiskFinding::new(
        "Address suspiciously similar to yours",
        SIMILARITY_POINTS,
        PatternFlags {
            address_similarity: Some(score),
            ..Default::default()
        },
    ))
}

pub fn check_zero_value(intent: &TransactionIntent) -> Option<RiskFinding> {
    if intent.amount != 0.0 {
        return None;
    }
    Some(RiskFinding::new(
        "Zero-value transfer detected",
        ZERO_VALUE_POINTS,
        PatternFlags {
            zero_transfer: Some(true),
            ..Default::default()
        },
    ))
}

pub fn check_high_value(intent: &TransactionIntent) -> Option<RiskFinding> {
    let value = intent.estimated_value?;
    if value <= HIGH_VALUE_THRESHOLD {
        return None;
    }
    Some(RiskFinding::new(
        "High-value transfer detected",
        HIGH_VALUE_POINTS,
        PatternFlags {
            high_value_transfer: Some(true),
            ..Default::default()
        },
    ))
}

/// Pattern heuristics on the destination; every matched reason becomes a threat.
pub fn check_patterns(intent: &TransactionIntent) -> Option<RiskFinding> {
    let analysis = pattern::analyze(&intent.to_address);
    if !analysis.suspicious {
        return None;
    }
    Some(RiskFinding {
        threats: analysis.reasons,
        risk_contribution: analysis.risk_score,
        patterns: PatternFlags {
            suspicious_pattern: Some(true),
            ..Default::default()
        },
    })
}

pub fn check_format(profile: &ChainProfile, intent: &TransactionIntent) -> Option<RiskFinding> {
    if format::validate_for(profile, &intent.to_address).valid {
        return None;
    }
    Some(RiskFinding::new(
        "Invalid address format for this chain",
        INVALID_FORMAT_POINTS,
        PatternFlags {
            invalid_format: Some(true),
            ..Default::default()
        },
    ))
}
