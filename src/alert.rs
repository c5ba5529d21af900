use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::types::AnalysisResult;

/// Kind of threat an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Phishing,
    Scam,
    Malware,
    Suspicious,
    Blocked,
    Emergency,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phishing => "phishing",
            Self::Scam => "scam",
            Self::Malware => "malware",
            Self::Suspicious => "suspicious",
            Self::Blocked => "blocked",
            Self::Emergency => "emergency",
        }
    }
}

/// Alert severity. Ordered so that `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Map an aggregate risk score onto a severity band.
    pub fn from_risk_score(risk_score: u8) -> Self {
        match risk_score {
            80.. => Self::Critical,
            60..=79 => Self::High,
            40..=59 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Score at or above which an engine alert is a scam rather than merely suspicious.
pub const SCAM_SCORE: u8 = 80;

/// Score at or above which an engine alert blocks the transfer.
pub const BLOCK_SCORE: u8 = 70;

/// The externally visible decision for one transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_address: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub blocked: bool,
}

impl SecurityAlert {
    /// Generic constructor used by the stand-alone detectors. Only critical alerts block.
    pub fn new(
        id_prefix: &str,
        alert_type: AlertType,
        severity: Severity,
        title: impl Into<String>,
        message: impl Into<String>,
        target_address: Option<String>,
    ) -> Self {
        Self {
            id: alert_id(id_prefix),
            alert_type,
            severity,
            title: title.into(),
            message: message.into(),
            target_address,
            timestamp: Utc::now(),
            blocked: severity == Severity::Critical,
        }
    }

    /// Override the blocking decision (used where a detector has its own rule).
    pub fn with_blocked(mut self, blocked: bool) -> Self {
        self.blocked = blocked;
        self
    }

    /// Build the alert for an engine analysis that crossed the risk threshold.
    ///
    /// Unlike [`SecurityAlert::new`], blocking follows the score (`>= 70`) rather than
    /// the severity, so a high-severity engine alert can still block.
    pub fn from_analysis(target_address: &str, analysis: &AnalysisResult) -> Self {
        let score = analysis.risk_score;
        let alert_type = if score >= SCAM_SCORE {
            AlertType::Scam
        } else {
            AlertType::Suspicious
        };

        Self {
            id: alert_id("alert"),
            alert_type,
            severity: Severity::from_risk_score(score),
            title: "Dangerous transaction detected".to_string(),
            message: format!(
                "Hairy Shield detected {} threat(s). Risk score: {}/100",
                analysis.threats.len(),
                score
            ),
            target_address: Some(target_address.to_string()),
            timestamp: Utc::now(),
            blocked: score >= BLOCK_SCORE,
        }
    }
}

fn alert_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::PatternFlags;

    fn analysis(score: u8, threats: usize) -> AnalysisResult {
        AnalysisResult {
            risk_score: score,
            threats: (0..threats).map(|i| format!("threat {}", i)).collect(),
            recommendations: vec![],
            confidence: 0.85,
            patterns: PatternFlags::default(),
        }
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_risk_score(0), Severity::Low);
        assert_eq!(Severity::from_risk_score(39), Severity::Low);
        assert_eq!(Severity::from_risk_score(40), Severity::Medium);
        assert_eq!(Severity::from_risk_score(59), Severity::Medium);
        assert_eq!(Severity::from_risk_score(60), Severity::High);
        assert_eq!(Severity::from_risk_score(79), Severity::High);
        assert_eq!(Severity::from_risk_score(80), Severity::Critical);
        assert_eq!(Severity::from_risk_score(100), Severity::Critical);
    }

    #[test]
    fn test_severity_is_monotonic() {
        let mut previous = Severity::Low;
        for score in 0..=100u8 {
            let current = Severity::from_risk_score(score);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_generic_constructor_blocks_only_critical() {
        for severity in [Severity::Low, Severity::Medium, Severity::High] {
            let alert =
                SecurityAlert::new("t", AlertType::Scam, severity, "title", "message", None);
            assert!(!alert.blocked);
        }
        let alert = SecurityAlert::new(
            "t",
            AlertType::Blocked,
            Severity::Critical,
            "title",
            "message",
            None,
        );
        assert!(alert.blocked);
        assert!(alert.id.starts_with("t_"));
    }

    #[test]
    fn test_engine_alert_blocking_follows_score() {
        let alert = SecurityAlert::from_analysis("addr", &analysis(69, 1));
        assert!(!alert.blocked);
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.alert_type, AlertType::Suspicious);

        let alert = SecurityAlert::from_analysis("addr", &analysis(70, 1));
        assert!(alert.blocked);
        assert_eq!(alert.severity, Severity::High);

        let alert = SecurityAlert::from_analysis("addr", &analysis(80, 2));
        assert!(alert.blocked);
        assert_eq!(alert.alert_type, AlertType::Scam);
        assert_eq!(alert.severity, Severity::Critical);
    }

    #[test]
    fn test_engine_alert_message() {
        let alert = SecurityAlert::from_analysis("addr", &analysis(45, 3));
        assert!(alert.message.contains("3 threat(s)"));
        assert!(alert.message.contains("45/100"));
        assert_eq!(alert.target_address.as_deref(), Some("addr"));
    }

    #[test]
    fn test_alert_serializes_type_field() {
        let alert = SecurityAlert::new(
            "x",
            AlertType::Phishing,
            Severity::High,
            "t",
            "m",
            Some("abc".to_string()),
        );
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "phishing");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["targetAddress"], "abc");
    }
}
