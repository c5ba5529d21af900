use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::alert::{AlertType, SecurityAlert, Severity};
use crate::engine::types::TransactionIntent;
use crate::registry::MaliciousAddressRegistry;

/// Token-symbol fragments associated with scam tokens (matched case-insensitively).
pub const SCAM_TOKEN_KEYWORDS: &[&str] = &[
    "scam",
    "fake",
    "phishing",
    "virus",
    "malware",
    "free",
    "airdrop",
    "winner",
    "congratulations",
];

/// Amounts above this are treated as manipulated or overflowed.
pub const SUSPICIOUS_AMOUNT: f64 = 1e15;

/// Switches for incoming-transfer checks. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiveProtectionConfig {
    pub enabled: bool,
    pub block_unknown_tokens: bool,
    pub block_zero_value_transfers: bool,
    pub block_suspicious_amounts: bool,
    pub quarantine_enabled: bool,
}

impl Default for ReceiveProtectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            block_unknown_tokens: false,
            block_zero_value_transfers: true,
            block_suspicious_amounts: true,
            quarantine_enabled: true,
        }
    }
}

/// Partial update applied on top of the current configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveProtectionUpdate {
    pub enabled: Option<bool>,
    pub block_unknown_tokens: Option<bool>,
    pub block_zero_value_transfers: Option<bool>,
    pub block_suspicious_amounts: Option<bool>,
    pub quarantine_enabled: Option<bool>,
}

impl ReceiveProtectionConfig {
    pub fn apply(&mut self, update: &ReceiveProtectionUpdate) {
        if let Some(v) = update.enabled {
            self.enabled = v;
        }
        if let Some(v) = update.block_unknown_tokens {
            self.block_unknown_tokens = v;
        }
        if let Some(v) = update.block_zero_value_transfers {
            self.block_zero_value_transfers = v;
        }
        if let Some(v) = update.block_suspicious_amounts {
            self.block_suspicious_amounts = v;
        }
        if let Some(v) = update.quarantine_enabled {
            self.quarantine_enabled = v;
        }
    }
}

/// Checks incoming transfers before they are shown as received funds.
pub struct ReceiveGuard {
    config: ReceiveProtectionConfig,
    registry: Arc<MaliciousAddressRegistry>,
}

impl ReceiveGuard {
    pub fn new(config: ReceiveProtectionConfig, registry: Arc<MaliciousAddressRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &ReceiveProtectionConfig {
        &self.config
    }

    pub fn configure(&mut self, update: &ReceiveProtectionUpdate) {
        self.config.apply(update);
        tracing::info!(
            enabled = self.config.enabled,
            block_zero_value_transfers = self.config.block_zero_value_transfers,
            block_suspicious_amounts = self.config.block_suspicious_amounts,
            "Receive protection configured"
        );
    }

    /// First matching check wins: blocked sender, zero value, scam token, huge amount.
    pub async fn check_incoming(&self, intent: &TransactionIntent) -> Option<SecurityAlert> {
        if !self.config.enabled {
            return None;
        }

        let sender = Some(intent.from_address.clone()).filter(|a| !a.is_empty());

        if let Some(address) = &sender {
            if self.registry.is_malicious(address).await {
                tracing::warn!(sender = %address, "Incoming transfer from blocked sender");
                return Some(receive_alert(
                    AlertType::Blocked,
                    Severity::Critical,
                    "Sender blocked",
                    "The sender of this transaction is on the malicious address list".to_string(),
                    sender,
                ));
            }
        }

        if self.config.block_zero_value_transfers && intent.amount == 0.0 {
            return Some(receive_alert(
                AlertType::Suspicious,
                Severity::Medium,
                "Zero-value transfer",
                "Received a transfer with no value, possibly spam or phishing".to_string(),
                sender,
            ));
        }

        if let Some(keyword) = scam_keyword(&intent.token_symbol) {
            tracing::warn!(token = %intent.token_symbol, keyword, "Suspicious incoming token");
            return Some(receive_alert(
                AlertType::Scam,
                Severity::High,
                "Suspicious token detected",
                format!(
                    "The token \"{}\" contains terms associated with scams",
                    intent.token_symbol
                ),
                sender,
            ));
        }

        if self.config.block_suspicious_amounts && intent.amount > SUSPICIOUS_AMOUNT {
            return Some(receive_alert(
                AlertType::Suspicious,
                Severity::High,
                "Extremely large amount",
                "A suspiciously high amount was received, possible manipulation".to_string(),
                sender,
            ));
        }

        None
    }
}

fn scam_keyword(token_symbol: &str) -> Option<&'static str> {
    let symbol = token_symbol.to_lowercase();
    SCAM_TOKEN_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| symbol.contains(keyword))
}

fn receive_alert(
    alert_type: AlertType,
    severity: Severity,
    title: &str,
    message: String,
    sender: Option<String>,
) -> SecurityAlert {
    let prefix = format!("receive_{}", alert_type.as_str());
    SecurityAlert::new(&prefix, alert_type, severity, title, message, sender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::store::{MemoryAddressStore, RiskLevel};

    const SENDER: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";

    async fn guard(config: ReceiveProtectionConfig) -> ReceiveGuard {
        let registry = Arc::new(MaliciousAddressRegistry::new(Arc::new(
            MemoryAddressStore::new(),
        )));
        registry
            .report("BlockedSender", "dusting", RiskLevel::default(), None)
            .await;
        ReceiveGuard::new(config, registry)
    }

    fn incoming(from: &str, amount: f64, token: &str) -> TransactionIntent {
        TransactionIntent::new(from, "me", amount, token)
    }

    #[tokio::test]
    async fn test_clean_transfer_passes() {
        let guard = guard(ReceiveProtectionConfig::default()).await;
        assert!(guard.check_incoming(&incoming(SENDER, 5.0, "USDC")).await.is_none());
    }

    #[tokio::test]
    async fn test_scam_token_is_high_but_not_blocked() {
        let guard = guard(ReceiveProtectionConfig::default()).await;
        let alert = guard
            .check_incoming(&incoming(SENDER, 100.0, "FREEAIRDROP"))
            .await
            .unwrap();
        assert_eq!(alert.alert_type, AlertType::Scam);
        assert_eq!(alert.severity, Severity::High);
        assert!(!alert.blocked);
        assert_eq!(alert.target_address.as_deref(), Some(SENDER));
        assert!(alert.id.starts_with("receive_scam_"));
    }

    #[tokio::test]
    async fn test_blocked_sender_wins() {
        let guard = guard(ReceiveProtectionConfig::default()).await;
        let alert = guard
            .check_incoming(&incoming("blockedsender", 0.0, "FAKE"))
            .await
            .unwrap();
        assert_eq!(alert.alert_type, AlertType::Blocked);
        assert_eq!(alert.severity, Severity::Critical);
        assert!(alert.blocked);
    }

    #[tokio::test]
    async fn test_zero_value_before_token_check() {
        let strict = guard(ReceiveProtectionConfig::default()).await;
        let alert = strict
            .check_incoming(&incoming(SENDER, 0.0, "WINNER"))
            .await
            .unwrap();
        assert_eq!(alert.alert_type, AlertType::Suspicious);
        assert_eq!(alert.severity, Severity::Medium);
        assert!(!alert.blocked);

        let relaxed = guard(ReceiveProtectionConfig {
            block_zero_value_transfers: false,
            ..Default::default()
        })
        .await;
        let alert = relaxed
            .check_incoming(&incoming(SENDER, 0.0, "WINNER"))
            .await
            .unwrap();
        assert_eq!(alert.alert_type, AlertType::Scam);
    }

    #[tokio::test]
    async fn test_huge_amount() {
        let guard = guard(ReceiveProtectionConfig::default()).await;
        let alert = guard
            .check_incoming(&incoming(SENDER, 2e15, "USDC"))
            .await
            .unwrap();
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.alert_type, AlertType::Suspicious);
        assert!(guard.check_incoming(&incoming(SENDER, 1e15, "USDC")).await.is_none());
    }

    #[tokio::test]
    async fn test_disabled_and_partial_update() {
        let mut guard = guard(ReceiveProtectionConfig::default()).await;
        guard.configure(&ReceiveProtectionUpdate {
            enabled: Some(false),
            ..Default::default()
        });
        assert!(!guard.config().enabled);
        assert!(guard.config().block_zero_value_transfers);
        assert!(guard
            .check_incoming(&incoming("blockedsender", 0.0, "SCAM"))
            .await
            .is_none());
    }

    #[test]
    fn test_config_defaults_from_partial_toml() {
        let config: ReceiveProtectionConfig =
            toml::from_str("block_suspicious_amounts = false").unwrap();
        assert!(config.enabled);
        assert!(!config.block_unknown_tokens);
        assert!(!config.block_suspicious_amounts);
        assert!(config.quarantine_enabled);
    }
}
