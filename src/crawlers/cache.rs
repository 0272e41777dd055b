use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::CacheError;
use crate::results::Page;

/// Format of `Page::crawled_date` on cached pages
pub const CRAWLED_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Key-value store for fetched pages, keyed by URL.
///
/// Implementations must be safe to call from several fetch workers at once.
pub trait PageCache: Send + Sync {
    /// Returns the stored value, or `None` if absent or expired
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key` for `ttl`
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    fn exists(&self, key: &str) -> Result<bool, CacheError>;
}

/// Reads a cached page
pub fn load_page(cache: &dyn PageCache, url: &str) -> Result<Option<Page>, CacheError> {
    match cache.get(url)? {
        Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
        None => Ok(None),
    }
}

/// Stores a page as JSON
pub fn store_page(
    cache: &dyn PageCache,
    url: &str,
    page: &Page,
    ttl: Duration,
) -> Result<(), CacheError> {
    let raw = serde_json::to_vec(page)?;
    cache.set(url, raw, ttl)
}

/// Current UTC time in [`CRAWLED_DATE_FORMAT`]
pub fn crawled_date_now() -> String {
    chrono::Utc::now().format(CRAWLED_DATE_FORMAT).to_string()
}

/// Expiry instant of an entry; `None` never expires
type Expiry = Option<Instant>;

fn is_live(expiry: &Expiry, now: Instant) -> bool {
    expiry.is_none_or(|at| at > now)
}

/// In-process expiring store.
///
/// A TTL too large to be represented as an instant is kept forever.
/// Expired entries are dropped on read and swept on every write.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Vec<u8>, Expiry)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|(_, expiry)| is_live(expiry, now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PageCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Backend("cache lock poisoned".to_string()))?;

        let expired = match entries.get(key) {
            Some((value, expiry)) if is_live(expiry, Instant::now()) => {
                return Ok(Some(value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        Ok(None)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Backend("cache lock poisoned".to_string()))?;
        let now = Instant::now();
        entries.retain(|_, (_, expiry)| is_live(expiry, now));
        entries.insert(key.to_string(), (value, now.checked_add(ttl)));
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }
}
