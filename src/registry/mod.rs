//! Known-malicious address registry: an in-memory cache in front of an
//! [`AddressStore`], with optimistic reporting.

pub mod cache;
pub mod local;
pub mod postgres;
pub mod seed;
pub mod store;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::alert::{AlertType, SecurityAlert, Severity};

use cache::{AddressCache, Clock, SystemClock, DEFAULT_CACHE_TTL_SECS};
use store::{AddressStore, MaliciousAddressEntry, RiskLevel};

/// Verdict on the sender of an incoming transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderVerdict {
    Safe,
    Blocked,
}

/// Aggregate numbers about reported addresses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityStats {
    pub total_reported: usize,
    pub reports_today: usize,
    pub top_threats: Vec<String>,
}

/// Cached view of known-bad addresses.
///
/// Lookups never fail: when the store cannot be read the registry answers from
/// whatever the cache already holds and logs the problem.
pub struct MaliciousAddressRegistry {
    store: Arc<dyn AddressStore>,
    cache: RwLock<AddressCache>,
}

impl MaliciousAddressRegistry {
    pub fn new(store: Arc<dyn AddressStore>) -> Self {
        Self::with_cache(
            store,
            AddressCache::new(DEFAULT_CACHE_TTL_SECS, Arc::new(SystemClock)),
        )
    }

    pub fn with_cache(store: Arc<dyn AddressStore>, cache: AddressCache) -> Self {
        Self {
            store,
            cache: RwLock::new(cache),
        }
    }

    /// Warm the cache from the store.
    pub async fn initialize(&self) {
        let mut cache = self.cache.write().await;
        self.refresh_locked(&mut cache).await;
    }

    /// Whether `address` is known to be malicious (case-insensitive).
    ///
    /// A cache hit answers immediately. Otherwise a stale cache is refreshed from
    /// the store once before answering.
    pub async fn is_malicious(&self, address: &str) -> bool {
        if self.cache.read().await.contains(address) {
            return true;
        }

        if !self.cache.read().await.is_stale() {
            return false;
        }

        {
            let mut cache = self.cache.write().await;
            // Another caller may have refreshed while we waited for the lock.
            if cache.is_stale() {
                self.refresh_locked(&mut cache).await;
            }
        }

        self.cache.read().await.contains(address)
    }

    async fn refresh_locked(&self, cache: &mut AddressCache) {
        match self.store.list().await {
            Ok(entries) => {
                cache.put_all(entries.iter().map(|e| e.address.as_str()));
                cache.mark_refreshed();
                tracing::info!(
                    entries = entries.len(),
                    cached = cache.len(),
                    store = self.store.name(),
                    "Malicious address cache refreshed"
                );
            }
            Err(e) => {
                tracing::error!(
                    store = self.store.name(),
                    error = %e,
                    "Failed to refresh malicious address cache"
                );
            }
        }
    }

    /// Report an address as malicious.
    ///
    /// The address is cached immediately so this process treats it as malicious
    /// whatever the store outcome. Returns `false` only when the store could not
    /// persist the report on any path.
    pub async fn report(
        &self,
        address: &str,
        reason: &str,
        risk_level: RiskLevel,
        evidence: Option<String>,
    ) -> bool {
        let now = self.now().await;
        let entry =
            MaliciousAddressEntry::new(address, reason, risk_level, now).with_evidence(evidence);

        self.cache.write().await.put(&entry.address);

        match self.store.insert(&entry).await {
            Ok(()) => {
                tracing::info!(
                    address = %entry.address,
                    reason = %reason,
                    risk_level = risk_level.get(),
                    "Malicious address reported"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    address = %entry.address,
                    error = %e,
                    "Failed to persist malicious address report"
                );
                false
            }
        }
    }

    /// Bulk-load entries (seed data), caching each and persisting only addresses
    /// the store does not know yet. Returns the number of new records.
    pub async fn import(&self, entries: &[MaliciousAddressEntry]) -> usize {
        let mut count = 0;
        let mut known = 0;
        for entry in entries {
            self.cache.write().await.put(&entry.address);

            match self.store.get(&entry.address).await {
                Ok(Some(_)) => {
                    known += 1;
                    continue;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    address = %entry.address,
                    error = %e,
                    "Failed to check imported address, inserting anyway"
                ),
            }

            match self.store.insert(entry).await {
                Ok(()) => count += 1,
                Err(e) => tracing::warn!(
                    address = %entry.address,
                    error = %e,
                    "Failed to persist imported address"
                ),
            }
        }
        tracing::info!(
            count,
            known,
            total = entries.len(),
            "Imported malicious addresses"
        );
        count
    }

    /// Every entry the store knows. Empty (and logged) if it cannot be read.
    pub async fn fetch_all(&self) -> Vec<MaliciousAddressEntry> {
        match self.store.list().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list malicious addresses");
                Vec::new()
            }
        }
    }

    /// Look up the stored record for one address.
    pub async fn lookup(&self, address: &str) -> Option<MaliciousAddressEntry> {
        match self.store.get(address).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::error!(address = %address, error = %e, "Failed to look up address");
                None
            }
        }
    }

    /// Drop every cached address and force a refresh on the next miss.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        tracing::info!("Malicious address cache cleared");
    }

    pub async fn cached_count(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Critical, blocking alert when `address` is known to be malicious.
    pub async fn block_check(&self, address: &str) -> Option<SecurityAlert> {
        if !self.is_malicious(address).await {
            return None;
        }

        Some(SecurityAlert::new(
            "blocked",
            AlertType::Blocked,
            Severity::Critical,
            "Address blocked",
            "This address has been reported as malicious by the community",
            Some(address.to_string()),
        ))
    }

    pub async fn validate_sender(&self, address: &str) -> SenderVerdict {
        if self.is_malicious(address).await {
            SenderVerdict::Blocked
        } else {
            SenderVerdict::Safe
        }
    }

    /// Totals, today's reports (UTC day) and the three most common reasons.
    pub async fn stats(&self) -> SecurityStats {
        let entries = self.fetch_all().await;
        let now = self.now().await;
        summarize(&entries, now)
    }

    async fn now(&self) -> DateTime<Utc> {
        let clock: Arc<dyn Clock> = self.cache.read().await.clock().clone();
        clock.now()
    }
}

fn summarize(entries: &[MaliciousAddressEntry], now: DateTime<Utc>) -> SecurityStats {
    let today = now.date_naive();
    let reports_today = entries
        .iter()
        .filter(|e| e.created_at.date_naive() == today)
        .count();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.report_reason.to_lowercase()).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    SecurityStats {
        total_reported: entries.len(),
        reports_today,
        top_threats: ranked.into_iter().take(3).map(|(reason, _)| reason).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cache::ManualClock;
    use chrono::{Duration, TimeZone};
    use store::testing::{CountingStore, UnavailableStore};
    use store::{FallbackStore, MemoryAddressStore};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
    }

    fn registry_with(
        store: Arc<dyn AddressStore>,
    ) -> (MaliciousAddressRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = AddressCache::new(DEFAULT_CACHE_TTL_SECS, clock.clone());
        (MaliciousAddressRegistry::with_cache(store, cache), clock)
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let store = Arc::new(MemoryAddressStore::new());
        store
            .insert(&MaliciousAddressEntry::new(
                "BadGuy",
                "drainer",
                RiskLevel::default(),
                start(),
            ))
            .await
            .unwrap();
        let (registry, _) = registry_with(store);

        assert!(registry.is_malicious("badguy").await);
        assert!(registry.is_malicious("BADGUY").await);
        assert!(!registry.is_malicious("goodguy").await);
    }

    #[tokio::test]
    async fn test_stale_cache_refreshes_exactly_once() {
        let store = Arc::new(CountingStore::default());
        let (registry, clock) = registry_with(store.clone());

        registry.initialize().await;
        assert_eq!(store.list_calls(), 1);

        // fresh cache: misses do not hit the store
        assert!(!registry.is_malicious("unknown").await);
        assert_eq!(store.list_calls(), 1);

        clock.advance(Duration::minutes(6));
        assert!(!registry.is_malicious("unknown").await);
        assert_eq!(store.list_calls(), 2);

        assert!(!registry.is_malicious("unknown").await);
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_refresh_picks_up_new_store_entries() {
        let store = Arc::new(CountingStore::default());
        let (registry, clock) = registry_with(store.clone());
        registry.initialize().await;

        store
            .inner
            .insert(&MaliciousAddressEntry::new(
                "late",
                "reported elsewhere",
                RiskLevel::default(),
                start(),
            ))
            .await
            .unwrap();
        assert!(!registry.is_malicious("late").await);

        clock.advance(Duration::minutes(5));
        assert!(registry.is_malicious("late").await);
    }

    #[tokio::test]
    async fn test_report_is_optimistic_even_when_store_fails() {
        let (registry, _) = registry_with(Arc::new(UnavailableStore));
        let persisted = registry
            .report("Scammer", "fake airdrop", RiskLevel::default(), None)
            .await;
        assert!(!persisted);
        assert!(registry.is_malicious("scammer").await);
    }

    #[tokio::test]
    async fn test_report_falls_back_to_local() {
        let local = Arc::new(MemoryAddressStore::new());
        let store = Arc::new(FallbackStore::new(
            Arc::new(UnavailableStore),
            local.clone(),
            std::time::Duration::from_millis(100),
        ));
        let (registry, _) = registry_with(store);

        let persisted = registry
            .report(
                "Drainer",
                "wallet drainer",
                RiskLevel::new(5).unwrap(),
                Some("tx 5h3k".to_string()),
            )
            .await;
        assert!(persisted);

        let saved = local.get("drainer").await.unwrap().unwrap();
        assert_eq!(saved.risk_level.get(), 5);
        assert_eq!(saved.evidence.as_deref(), Some("tx 5h3k"));
        assert_eq!(saved.created_at, start());
        assert_eq!(registry.fetch_all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_never_fails_lookup() {
        let (registry, _) = registry_with(Arc::new(UnavailableStore));
        assert!(!registry.is_malicious("anything").await);
        assert!(registry.fetch_all().await.is_empty());
        assert!(registry.lookup("anything").await.is_none());
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refresh() {
        let store = Arc::new(CountingStore::default());
        let (registry, _) = registry_with(store.clone());
        registry.report("x", "r", RiskLevel::default(), None).await;
        registry.initialize().await;
        assert_eq!(registry.cached_count().await, 1);

        registry.clear_cache().await;
        assert_eq!(registry.cached_count().await, 0);

        // the report survived in the store, so the refresh brings it back
        assert!(registry.is_malicious("x").await);
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_block_check_and_sender_verdict() {
        let (registry, _) = registry_with(Arc::new(MemoryAddressStore::new()));
        registry.report("evil", "phishing", RiskLevel::default(), None).await;

        let alert = registry.block_check("EVIL").await.unwrap();
        assert_eq!(alert.alert_type, AlertType::Blocked);
        assert_eq!(alert.severity, Severity::Critical);
        assert!(alert.blocked);

        assert!(registry.block_check("fine").await.is_none());
        assert_eq!(registry.validate_sender("evil").await, SenderVerdict::Blocked);
        assert_eq!(registry.validate_sender("fine").await, SenderVerdict::Safe);
    }

    #[tokio::test]
    async fn test_import_leaves_existing_reports_alone() {
        let store = Arc::new(MemoryAddressStore::new());
        let (registry, clock) = registry_with(store.clone());
        registry
            .report("victim", "drainer", RiskLevel::new(5).unwrap(), Some("tx abc".to_string()))
            .await;

        clock.advance(Duration::days(3));
        let imported = registry
            .import(&[
                MaliciousAddressEntry::new("victim", "old list", RiskLevel::new(2).unwrap(), clock.now()),
                MaliciousAddressEntry::new("fresh", "old list", RiskLevel::new(2).unwrap(), clock.now()),
            ])
            .await;
        assert_eq!(imported, 1);

        let saved = store.get("victim").await.unwrap().unwrap();
        assert_eq!(saved.risk_level.get(), 5);
        assert_eq!(saved.report_reason, "drainer");
        assert_eq!(saved.evidence.as_deref(), Some("tx abc"));
        assert_eq!(saved.created_at, start());
        assert_eq!(registry.stats().await.reports_today, 1);
    }

    #[tokio::test]
    async fn test_fresh_cache_miss_skips_the_store() {
        let store = Arc::new(CountingStore::default());
        let (registry, _) = registry_with(store.clone());
        registry.initialize().await;

        for _ in 0..5 {
            assert!(!registry.is_malicious("clean").await);
        }
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_import_caches_and_persists() {
        let store = Arc::new(MemoryAddressStore::new());
        let (registry, _) = registry_with(store.clone());
        let entries = vec![
            MaliciousAddressEntry::new("a1", "drainer", RiskLevel::default(), start()),
            MaliciousAddressEntry::new("a2", "drainer", RiskLevel::default(), start()),
        ];
        assert_eq!(registry.import(&entries).await, 2);
        assert_eq!(registry.cached_count().await, 2);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[test]
    fn test_summarize() {
        let now = start();
        let yesterday = now - Duration::days(1);
        let entries = vec![
            MaliciousAddressEntry::new("a", "Drainer", RiskLevel::default(), now),
            MaliciousAddressEntry::new("b", "drainer", RiskLevel::default(), now),
            MaliciousAddressEntry::new("c", "fake airdrop", RiskLevel::default(), yesterday),
            MaliciousAddressEntry::new("d", "fake airdrop", RiskLevel::default(), yesterday),
            MaliciousAddressEntry::new("e", "impersonation", RiskLevel::default(), now),
            MaliciousAddressEntry::new("f", "dusting", RiskLevel::default(), now),
        ];
        let stats = summarize(&entries, now);
        assert_eq!(stats.total_reported, 6);
        assert_eq!(stats.reports_today, 4);
        assert_eq!(
            stats.top_threats,
            vec!["drainer", "fake airdrop", "dusting"]
        );
    }
}
