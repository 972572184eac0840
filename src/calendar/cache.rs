use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, NaiveDate, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CacheKey {
    /// sentinel whose expiry marks the whole cache stale
    Refresh,
    Holiday(NaiveDate),
}

/// process-wide set of known holidays with a single refresh sentinel
///
/// Entries expire after a fixed ttl and are never removed early. Readers may race
/// a concurrent `update`; the worst case is a redundant refresh by another caller.
#[derive(Debug)]
pub struct HolidayCache {
    entries: RwLock<HashMap<CacheKey, DateTime<Utc>>>,
    ttl: Duration,
}

impl HolidayCache {
    /// create an empty cache with the refresh sentinel armed from `now`
    pub fn new(ttl: Duration, now: DateTime<Utc>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(CacheKey::Refresh, now + ttl);
        Self {
            entries: RwLock::new(entries),
            ttl,
        }
    }

    /// create an empty cache that asks to be refreshed on first use
    pub fn stale(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_holiday(&self, date: NaiveDate, now: DateTime<Utc>) -> bool {
        self.is_live(CacheKey::Holiday(date), now)
    }

    /// true once the refresh sentinel has expired or was never set
    pub fn should_refresh(&self, now: DateTime<Utc>) -> bool {
        !self.is_live(CacheKey::Refresh, now)
    }

    /// insert every holiday with the standard ttl and re-arm the sentinel
    pub fn update<I>(&self, holidays: I, now: DateTime<Utc>)
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let expires_at = now + self.ttl;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for date in holidays {
            entries.insert(CacheKey::Holiday(date), expires_at);
        }
        entries.insert(CacheKey::Refresh, expires_at);
    }

    /// number of unexpired holiday entries
    pub fn holiday_count(&self, now: DateTime<Utc>) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .filter(|(key, expires_at)| matches!(key, CacheKey::Holiday(_)) && **expires_at > now)
            .count()
    }

    fn is_live(&self, key: CacheKey, now: DateTime<Utc>) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&key)
            .map(|expires_at| *expires_at > now)
            .unwrap_or(false)
    }
}
