use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::address::{pattern, similarity};
use crate::alert::{SecurityAlert, Severity};
use crate::audit::{self, CheckType, SecurityCheck};
use crate::config::Config;
use crate::engine::engine::{EngineConfig, RiskEngine};
use crate::engine::types::{AnalysisResult, TransactionIntent};
use crate::receive::{ReceiveGuard, ReceiveProtectionConfig};
use crate::registry::cache::{AddressCache, SystemClock};
use crate::registry::local::LocalAddressStore;
use crate::registry::postgres::PgAddressStore;
use crate::registry::seed;
use crate::registry::store::{AddressStore, FallbackStore, RiskLevel};
use crate::registry::MaliciousAddressRegistry;

/// Send-side and receive-side guards sharing one malicious-address registry.
pub struct Shield {
    pub registry: Arc<MaliciousAddressRegistry>,
    pub engine: RiskEngine,
    pub receive: ReceiveGuard,
}

impl Shield {
    pub fn new(
        engine_config: EngineConfig,
        receive_config: ReceiveProtectionConfig,
        registry: Arc<MaliciousAddressRegistry>,
    ) -> Self {
        Self {
            engine: RiskEngine::new(engine_config, registry.clone()),
            receive: ReceiveGuard::new(receive_config, registry.clone()),
            registry,
        }
    }

    /// Build the shield from configuration: Postgres-backed with a local JSON
    /// fallback when a pool is given, local-only otherwise.
    pub async fn init(config: &Config, pool: Option<PgPool>) -> eyre::Result<Self> {
        let local: Arc<dyn AddressStore> =
            Arc::new(LocalAddressStore::new(&config.registry.local_store_path));

        let store: Arc<dyn AddressStore> = match pool {
            Some(pool) => Arc::new(FallbackStore::new(
                Arc::new(PgAddressStore::new(pool)),
                local,
                Duration::from_millis(config.registry.remote_timeout_ms),
            )),
            None => {
                tracing::info!(
                    path = %config.registry.local_store_path,
                    "No database configured, using local address store only"
                );
                local
            }
        };

        let cache = AddressCache::new(config.registry.cache_ttl_secs, Arc::new(SystemClock));
        let registry = Arc::new(MaliciousAddressRegistry::with_cache(store, cache));

        if let Some(path) = &config.registry.blocklist_path {
            match seed::parse_blocklist_csv(path) {
                Ok(entries) => {
                    let count = registry.import(&entries).await;
                    tracing::info!(count, path = %path, "Blocklist loaded");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load blocklist file, continuing without");
                }
            }
        }

        registry.initialize().await;

        let engine_config = EngineConfig {
            own_address: config.shield.own_address.clone(),
            risk_threshold: config.shield.risk_threshold,
            chain: config.shield.chain_profile(),
        };

        Ok(Self::new(
            engine_config,
            config.receive_protection.clone(),
            registry,
        ))
    }

    /// Full analysis of an outgoing transfer.
    pub async fn analyze(&self, intent: &TransactionIntent) -> AnalysisResult {
        self.engine.analyze(intent).await
    }

    /// Alert for an outgoing transfer, or `None` when it scores below the threshold.
    pub async fn check_send(&self, intent: &TransactionIntent) -> Option<SecurityAlert> {
        self.engine.check_transaction(intent).await
    }

    pub async fn check_receive(&self, intent: &TransactionIntent) -> Option<SecurityAlert> {
        let alert = self.receive.check_incoming(intent).await;
        let (score, blocked) = alert
            .as_ref()
            .map(|a| (nominal_score(a.severity), a.blocked))
            .unwrap_or((0, false));
        audit::record(&SecurityCheck::new(
            &intent.from_address,
            CheckType::Receive,
            score,
            blocked,
        ));
        alert
    }

    /// Dedicated look-alike check of `target` against the configured own address,
    /// falling back to the stand-alone pattern check.
    pub async fn phishing_check(&self, target: &str) -> Option<SecurityAlert> {
        let Some(own) = self.engine.own_address() else {
            return pattern::detect_suspicious_patterns(target);
        };

        let score = similarity::similarity(own, target);
        let alert = similarity::phishing_check(own, target);
        audit::record(&SecurityCheck::new(
            target,
            CheckType::Similarity,
            (score * 100.0).round() as u8,
            alert.as_ref().is_some_and(|a| a.blocked),
        ));
        alert
    }

    pub async fn report(
        &self,
        address: &str,
        reason: &str,
        risk_level: RiskLevel,
        evidence: Option<String>,
    ) -> bool {
        self.registry.report(address, reason, risk_level, evidence).await
    }
}

/// Score logged for a receive-side alert, which carries a severity but no score.
fn nominal_score(severity: Severity) -> u8 {
    match severity {
        Severity::Critical => 100,
        Severity::High => 75,
        Severity::Medium => 50,
        Severity::Low => 25,
    }
}
