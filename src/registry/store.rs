use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{Result, ShieldError};

/// Community risk rating of a reported address, 1 (low) to 5 (severe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RiskLevel(u8);

impl RiskLevel {
    pub fn new(level: u8) -> Result<Self> {
        if (1..=5).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ShieldError::InvalidRiskLevel(level))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for RiskLevel {
    type Error = ShieldError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl From<RiskLevel> for u8 {
    fn from(level: RiskLevel) -> u8 {
        level.0
    }
}

/// A known-bad address as persisted by the stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaliciousAddressEntry {
    /// Always lower-cased.
    pub address: String,
    #[serde(default = "default_blockchain")]
    pub blockchain: String,
    pub report_reason: String,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn default_blockchain() -> String {
    "solana".to_string()
}

impl MaliciousAddressEntry {
    pub fn new(
        address: &str,
        reason: &str,
        risk_level: RiskLevel,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            address: address.to_lowercase(),
            blockchain: default_blockchain(),
            report_reason: reason.to_string(),
            risk_level,
            verified: false,
            reported_by: None,
            evidence: None,
            created_at,
        }
    }

    pub fn with_evidence(mut self, evidence: Option<String>) -> Self {
        self.evidence = evidence;
        self
    }

    /// Fold a later report for the same address into this record.
    ///
    /// The risk level only rises, existing evidence and the first report date are
    /// kept, and the reason follows the latest report.
    pub fn absorb(&mut self, later: &MaliciousAddressEntry) {
        self.report_reason = later.report_reason.clone();
        self.risk_level = self.risk_level.max(later.risk_level);
        self.verified |= later.verified;
        if later.evidence.is_some() {
            self.evidence = later.evidence.clone();
        }
        if self.reported_by.is_none() {
            self.reported_by = later.reported_by.clone();
        }
        self.created_at = self.created_at.min(later.created_at);
    }
}

/// Persistence capability behind the malicious-address registry.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Look up one address (case-insensitive).
    async fn get(&self, address: &str) -> Result<Option<MaliciousAddressEntry>>;

    /// Every entry the store knows about.
    async fn list(&self) -> Result<Vec<MaliciousAddressEntry>>;

    /// Insert or update an entry keyed by its lower-cased address.
    async fn insert(&self, entry: &MaliciousAddressEntry) -> Result<()>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryAddressStore {
    entries: RwLock<HashMap<String, MaliciousAddressEntry>>,
}

impl MemoryAddressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressStore for MemoryAddressStore {
    async fn get(&self, address: &str) -> Result<Option<MaliciousAddressEntry>> {
        Ok(self.entries.read().await.get(&address.to_lowercase()).cloned())
    }

    async fn list(&self) -> Result<Vec<MaliciousAddressEntry>> {
        let mut entries: Vec<_> = self.entries.read().await.values().cloned().collect();
        entries.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(entries)
    }

    async fn insert(&self, entry: &MaliciousAddressEntry) -> Result<()> {
        let key = entry.address.to_lowercase();
        let mut entries = self.entries.write().await;
        match entries.get_mut(&key) {
            Some(existing) => existing.absorb(entry),
            None => {
                let mut entry = entry.clone();
                entry.address = key.clone();
                entries.insert(key, entry);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Remote-first store that degrades to a local one.
///
/// Every primary call is bounded by `timeout`. A failed or slow primary is logged
/// and the fallback answers instead; callers never see the primary's error.
pub struct FallbackStore {
    primary: Arc<dyn AddressStore>,
    fallback: Arc<dyn AddressStore>,
    timeout: Duration,
}

impl FallbackStore {
    pub fn new(
        primary: Arc<dyn AddressStore>,
        fallback: Arc<dyn AddressStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeout,
        }
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ShieldError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

#[async_trait]
impl AddressStore for FallbackStore {
    async fn get(&self, address: &str) -> Result<Option<MaliciousAddressEntry>> {
        match self.bounded(self.primary.get(address)).await {
            Ok(Some(entry)) => Ok(Some(entry)),
            Ok(None) => self.fallback.get(address).await,
            Err(e) => {
                tracing::warn!(
                    store = self.primary.name(),
                    error = %e,
                    "Remote store unavailable, reading locally"
                );
                self.fallback.get(address).await
            }
        }
    }

    /// Union of both stores when the primary answers, the fallback alone otherwise.
    async fn list(&self) -> Result<Vec<MaliciousAddressEntry>> {
        let remote = match self.bounded(self.primary.list()).await {
            Ok(entries) => Some(entries),
            Err(e) => {
                tracing::warn!(
                    store = self.primary.name(),
                    error = %e,
                    "Remote store unavailable, listing local entries only"
                );
                None
            }
        };

        let local = match self.fallback.list().await {
            Ok(entries) => entries,
            Err(e) if remote.is_some() => {
                tracing::warn!(store = self.fallback.name(), error = %e, "Failed to read local entries");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let Some(remote) = remote else {
            return Ok(local);
        };

        let mut merged: HashMap<String, MaliciousAddressEntry> = HashMap::new();
        for entry in local.into_iter().chain(remote) {
            merged.insert(entry.address.to_lowercase(), entry);
        }
        let mut entries: Vec<_> = merged.into_values().collect();
        entries.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(entries)
    }

    async fn insert(&self, entry: &MaliciousAddressEntry) -> Result<()> {
        match self.bounded(self.primary.insert(entry)).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    store = self.primary.name(),
                    address = %entry.address,
                    error = %e,
                    "Remote store unavailable, saving report locally"
                );
                self.fallback.insert(entry).await
            }
        }
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
