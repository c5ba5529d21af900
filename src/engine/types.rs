use serde::{Deserialize, Serialize};

/// One transfer as the user is about to send (or has received) it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionIntent {
    #[serde(default)]
    pub from_address: String,
    pub to_address: String,
    pub amount: f64,
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default)]
    pub estimated_value: Option<f64>,
}

impl TransactionIntent {
    pub fn new(
        from_address: impl Into<String>,
        to_address: impl Into<String>,
        amount: f64,
        token_symbol: impl Into<String>,
    ) -> Self {
        Self {
            from_address: from_address.into(),
            to_address: to_address.into(),
            amount,
            token_symbol: token_symbol.into(),
            estimated_value: None,
        }
    }

    pub fn with_estimated_value(mut self, value: f64) -> Self {
        self.estimated_value = Some(value);
        self
    }
}

/// Structured flags collected across detectors. Unset flags are omitted from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_similarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zero_transfer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_address: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_value_transfer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspicious_pattern: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_format: Option<bool>,
}

impl PatternFlags {
    /// Union: any flag set in `other` overwrites the same flag here.
    pub fn merge(&mut self, other: &PatternFlags) {
        if other.address_similarity.is_some() {
            self.address_similarity = other.address_similarity;
        }
        if other.zero_transfer.is_some() {
            self.zero_transfer = other.zero_transfer;
        }
        if other.new_address.is_some() {
            self.new_address = other.new_address;
        }
        if other.high_value_transfer.is_some() {
            self.high_value_transfer = other.high_value_transfer;
        }
        if other.suspicious_pattern.is_some() {
            self.suspicious_pattern = other.suspicious_pattern;
        }
        if other.invalid_format.is_some() {
            self.invalid_format = other.invalid_format;
        }
    }
}

/// Output of a single detector.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskFinding {
    pub threats: Vec<String>,
    pub risk_contribution: u32,
    pub patterns: PatternFlags,
}

impl RiskFinding {
    pub fn new(threat: impl Into<String>, risk_contribution: u32, patterns: PatternFlags) -> Self {
        Self {
            threats: vec![threat.into()],
            risk_contribution,
            patterns,
        }
    }
}

/// Aggregate result of analysing one [`TransactionIntent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub risk_score: u8,
    pub threats: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence: f64,
    pub patterns: PatternFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_from_camel_case_json() {
        let intent: TransactionIntent = serde_json::from_str(
            r#"{"fromAddress":"me","toAddress":"you","amount":0,"tokenSymbol":"SOL","estimatedValue":12.5}"#,
        )
        .unwrap();
        assert_eq!(intent.to_address, "you");
        assert_eq!(intent.amount, 0.0);
        assert_eq!(intent.estimated_value, Some(12.5));

        let minimal: TransactionIntent =
            serde_json::from_str(r#"{"toAddress":"you","amount":1}"#).unwrap();
        assert!(minimal.from_address.is_empty());
        assert!(minimal.estimated_value.is_none());
    }

    #[test]
    fn test_missing_amount_is_rejected() {
        let missing = serde_json::from_str::<TransactionIntent>(
            r#"{"toAddress":"you","tokenSymbol":"SOL"}"#,
        );
        assert!(missing.is_err());
    }

    #[test]
    fn test_merge_is_union() {
        let mut flags = PatternFlags {
            zero_transfer: Some(true),
            ..Default::default()
        };
        flags.merge(&PatternFlags {
            address_similarity: Some(0.9),
            ..Default::default()
        });
        assert_eq!(flags.zero_transfer, Some(true));
        assert_eq!(flags.address_similarity, Some(0.9));
        assert!(flags.invalid_format.is_none());
    }

    #[test]
    fn test_unset_flags_are_omitted() {
        let flags = PatternFlags {
            high_value_transfer: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_value(&flags).unwrap();
        assert_eq!(json, serde_json::json!({ "highValueTransfer": true }));
    }
}
