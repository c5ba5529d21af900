use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Source of the current time, injectable so freshness can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// Default freshness window of the in-memory set.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// In-memory set of known-bad addresses (lower-cased) with a freshness timestamp.
///
/// Entries are only ever added; `clear` is the single way to drop them.
pub struct AddressCache {
    addresses: HashSet<String>,
    refreshed_at: Option<DateTime<Utc>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl AddressCache {
    pub fn new(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            addresses: HashSet::new(),
            refreshed_at: None,
            ttl: Duration::seconds(ttl_secs as i64),
            clock,
        }
    }

    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(&address.to_lowercase())
    }

    pub fn put(&mut self, address: &str) {
        self.addresses.insert(address.to_lowercase());
    }

    pub fn put_all<'a>(&mut self, addresses: impl IntoIterator<Item = &'a str>) {
        for address in addresses {
            self.put(address);
        }
    }

    /// Stale when never refreshed or when the last refresh is older than the TTL.
    pub fn is_stale(&self) -> bool {
        match self.refreshed_at {
            None => true,
            Some(at) => self.clock.now() - at >= self.ttl,
        }
    }

    pub fn mark_refreshed(&mut self) {
        self.refreshed_at = Some(self.clock.now());
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn clear(&mut self) {
        self.addresses.clear();
        self.refreshed_at = None;
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
