use std::sync::Arc;

use crate::address::format::ChainProfile;
use crate::alert::SecurityAlert;
use crate::audit::{self, CheckType, SecurityCheck};
use crate::registry::MaliciousAddressRegistry;

use super::rules;
use super::types::{AnalysisResult, PatternFlags, RiskFinding, TransactionIntent};

/// Default score at or above which [`RiskEngine::check_transaction`] raises an alert.
pub const DEFAULT_RISK_THRESHOLD: u8 = 40;

const CLEAN_CONFIDENCE: f64 = 0.95;
const THREAT_CONFIDENCE: f64 = 0.85;

/// Settings fixed for the lifetime of an engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub own_address: Option<String>,
    pub risk_threshold: u8,
    pub chain: ChainProfile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            own_address: None,
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            chain: ChainProfile::default(),
        }
    }
}

/// Combines every detector into one score for a transfer.
pub struct RiskEngine {
    config: EngineConfig,
    registry: Arc<MaliciousAddressRegistry>,
}

impl RiskEngine {
    pub fn new(config: EngineConfig, registry: Arc<MaliciousAddressRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn set_own_address(&mut self, address: impl Into<String>) {
        let address = address.into();
        tracing::info!(address = %address, "Own address configured");
        self.config.own_address = Some(address);
    }

    pub fn own_address(&self) -> Option<&str> {
        self.config.own_address.as_deref()
    }

    pub fn risk_threshold(&self) -> u8 {
        self.config.risk_threshold
    }

    pub fn registry(&self) -> &Arc<MaliciousAddressRegistry> {
        &self.registry
    }

    /// Run all detectors against `intent`.
    ///
    /// Threats are listed in detector order; the score is the clamped sum of
    /// contributions. Never fails: bad input is scored, not rejected.
    pub async fn analyze(&self, intent: &TransactionIntent) -> AnalysisResult {
        let mut findings: Vec<RiskFinding> = Vec::new();

        // Rule 1: Known malicious destination
        if let Some(finding) = rules::check_malicious(&self.registry, intent).await {
            findings.push(finding);
        }

        // Rule 2: Look-alike of the user's own address
        if let Some(finding) = rules::check_similarity(self.own_address(), intent) {
            findings.push(finding);
        }

        // Rule 3: Zero-value transfer
        if let Some(finding) = rules::check_zero_value(intent) {
            findings.push(finding);
        }

        // Rule 4: High-value transfer
        if let Some(finding) = rules::check_high_value(intent) {
            findings.push(finding);
        }

        // Rule 5: Address pattern heuristics
        if let Some(finding) = rules::check_patterns(intent) {
            findings.push(finding);
        }

        // Rule 6: Chain address format
        if let Some(finding) = rules::check_format(&self.config.chain, intent) {
            findings.push(finding);
        }

        let result = aggregate(findings);
        tracing::debug!(
            to = %intent.to_address,
            risk_score = result.risk_score,
            threats = result.threats.len(),
            "Transaction analyzed"
        );
        result
    }

    /// Analyze and decide: an alert when the score reaches the risk threshold,
    /// otherwise `None` after logging the clean check.
    pub async fn check_transaction(&self, intent: &TransactionIntent) -> Option<SecurityAlert> {
        let analysis = self.analyze(intent).await;

        if analysis.risk_score < self.config.risk_threshold {
            audit::record(
                &SecurityCheck::new(
                    &intent.to_address,
                    CheckType::AiAnalysis,
                    analysis.risk_score,
                    false,
                )
                .with_analysis(analysis),
            );
            return None;
        }

        let alert = SecurityAlert::from_analysis(&intent.to_address, &analysis);
        tracing::warn!(
            to = %intent.to_address,
            risk_score = analysis.risk_score,
            severity = alert.severity.as_str(),
            blocked = alert.blocked,
            "Dangerous transaction detected"
        );
        audit::record(
            &SecurityCheck::new(
                &intent.to_address,
                CheckType::AiAnalysis,
                analysis.risk_score,
                alert.blocked,
            )
            .with_analysis(analysis),
        );
        Some(alert)
    }
}

fn aggregate(findings: Vec<RiskFinding>) -> AnalysisResult {
    let mut threats = Vec::new();
    let mut patterns = PatternFlags::default();
    let mut total: u32 = 0;

    for finding in findings {
        total = total.saturating_add(finding.risk_contribution);
        patterns.merge(&finding.patterns);
        threats.extend(finding.threats);
    }

    let confidence = if threats.is_empty() {
        CLEAN_CONFIDENCE
    } else {
        THREAT_CONFIDENCE
    };

    AnalysisResult {
        risk_score: total.min(100) as u8,
        recommendations: recommendations(&threats),
        threats,
        confidence,
        patterns,
    }
}

/// Advice derived from the threat text, one block per category in a fixed order.
pub fn recommendations(threats: &[String]) -> Vec<String> {
    let text: Vec<String> = threats.iter().map(|t| t.to_lowercase()).collect();
    let mentions = |keywords: &[&str]| {
        text.iter()
            .any(|t| keywords.iter().any(|k| t.contains(k)))
    };

    let mut advice = Vec::new();
    if mentions(&["malicious"]) {
        advice.push("Do not send funds to this address");
        advice.push("Report this address as malicious");
    }
    if mentions(&["similar"]) {
        advice.push("Carefully verify the destination address");
        advice.push("Copy and paste addresses instead of typing them");
    }
    if mentions(&["zero-value"]) {
        advice.push("Zero-value transfers can be spam or phishing");
        advice.push("Consider cancelling this transaction");
    }
    if mentions(&["fake", "demo", "test"]) {
        advice.push("This address looks like a test or fake address");
        advice.push("Verify it's a real address before sending");
    }
    if mentions(&["invalid", "format"]) {
        advice.push("The address format is not valid for this chain");
        advice.push("Check the address was copied correctly");
    }
    advice.into_iter().map(String::from).collect()
}
