use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::types::AnalysisResult;

/// Which guard produced a [`SecurityCheck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Send,
    Receive,
    Similarity,
    AiAnalysis,
}

impl CheckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Receive => "receive",
            Self::Similarity => "similarity",
            Self::AiAnalysis => "ai_analysis",
        }
    }
}

/// Audit record for one guard decision. Only logged, never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityCheck {
    pub target_address: String,
    pub check_type: CheckType,
    pub risk_score: u8,
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AnalysisResult>,
    pub timestamp: DateTime<Utc>,
}

impl SecurityCheck {
    pub fn new(target_address: &str, check_type: CheckType, risk_score: u8, blocked: bool) -> Self {
        Self {
            target_address: target_address.to_string(),
            check_type,
            risk_score,
            blocked,
            ai_analysis: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_analysis(mut self, analysis: AnalysisResult) -> Self {
        self.ai_analysis = Some(analysis);
        self
    }
}

/// Emit a check on the `hairy_shield::audit` target.
pub fn record(check: &SecurityCheck) {
    let threats = check
        .ai_analysis
        .as_ref()
        .map(|a| a.threats.len())
        .unwrap_or(0);

    if check.blocked {
        tracing::warn!(
            target: "hairy_shield::audit",
            address = %check.target_address,
            check_type = check.check_type.as_str(),
            risk_score = check.risk_score,
            blocked = check.blocked,
            threats,
            timestamp = %check.timestamp,
            "Security check"
        );
    } else {
        tracing::info!(
            target: "hairy_shield::audit",
            address = %check.target_address,
            check_type = check.check_type.as_str(),
            risk_score = check.risk_score,
            blocked = check.blocked,
            threats,
            timestamp = %check.timestamp,
            "Security check"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(check: &SecurityCheck) -> String {
        let output = Captured::default();
        let writer = output.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || record(check));
        let bytes = output.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let check = SecurityCheck::new("addr", CheckType::AiAnalysis, 12, false);
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["targetAddress"], "addr");
        assert_eq!(json["checkType"], "ai_analysis");
        assert_eq!(json["riskScore"], 12);
        assert!(json.get("aiAnalysis").is_none());
    }

    #[test]
    fn test_record_emits_audit_event() {
        let line = capture(&SecurityCheck::new("cleanaddr", CheckType::Receive, 12, false));
        assert!(line.contains("INFO"));
        assert!(line.contains("hairy_shield::audit"));
        assert!(line.contains("Security check"));
        assert!(line.contains("cleanaddr"));
        assert!(line.contains("risk_score=12"));
        assert!(line.contains("blocked=false"));
    }

    #[test]
    fn test_blocked_check_is_a_warning() {
        let line = capture(&SecurityCheck::new("badaddr", CheckType::Send, 90, true));
        assert!(line.contains("WARN"));
        assert!(line.contains("blocked=true"));
    }
}
