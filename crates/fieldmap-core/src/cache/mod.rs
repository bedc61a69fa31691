//! Bounded cache for transformation results
//!
//! Entries are keyed by transformation id plus the canonical JSON of the input
//! value and options. Eviction is first-in-first-out by insertion sequence:
//! reads never refresh an entry, while overwriting a key re-inserts it as the
//! newest entry. Entries expire once their age reaches their TTL.
//!
//! The cache does no internal locking; callers that share it across threads
//! wrap it in a mutex.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

mod key;

pub use key::{cache_key, canonical_json};

use crate::transformer::TransformOptions;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// Default maximum number of entries
pub const DEFAULT_CAPACITY: usize = 500;

/// Default entry lifetime (30 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Tunable cache parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSettings {
    /// Maximum number of entries
    pub capacity: usize,
    /// Lifetime of new entries
    #[serde(rename = "ttlMs", with = "duration_ms")]
    pub ttl: Duration,
    /// A disabled cache misses every lookup and stores nothing
    pub enabled: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
            enabled: true,
        }
    }
}

/// Partial settings change; `None` keeps the current value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SettingsUpdate {
    pub capacity: Option<usize>,
    pub ttl: Option<Duration>,
    pub enabled: Option<bool>,
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupCounters {
    pub hits: u64,
    pub misses: u64,
}

impl LookupCounters {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that hit; 0 when nothing was looked up
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

/// Snapshot of cache statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub hit_rate: f64,
    pub capacity: usize,
    /// Counters per transformation id
    #[serde(default)]
    pub by_transformation: BTreeMap<String, LookupCounters>,
}

impl CacheStats {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    created_at: Instant,
    ttl: Duration,
    transformation_id: String,
    sequence: u64,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

/// FIFO + TTL cache of transformation outputs
#[derive(Debug)]
pub struct TransformationCache {
    entries: HashMap<String, CacheEntry>,
    // Insertion sequence -> key, oldest first
    order: BTreeMap<u64, String>,
    next_sequence: u64,
    settings: CacheSettings,
    counters: LookupCounters,
    by_transformation: HashMap<String, LookupCounters>,
}

impl Default for TransformationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformationCache {
    /// Create a cache with default settings
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_sequence: 0,
            settings: CacheSettings::default(),
            counters: LookupCounters::default(),
            by_transformation: HashMap::new(),
        }
    }

    /// Create a cache with custom settings
    pub fn with_settings(settings: CacheSettings) -> Result<Self> {
        validate_capacity(settings.capacity)?;
        let mut cache = Self::new();
        cache.settings = settings;
        Ok(cache)
    }

    /// Look up a cached result
    ///
    /// Expired entries are removed and count as misses. A disabled cache always misses.
    pub fn get(
        &mut self,
        transformation_id: &str,
        value: &Value,
        options: &TransformOptions,
    ) -> Option<Value> {
        if !self.settings.enabled {
            self.record(transformation_id, false);
            return None;
        }

        let key = cache_key(transformation_id, value, options);
        let cached = match self.entries.get(&key).map(CacheEntry::is_expired) {
            Some(true) => {
                self.remove_key(&key);
                None
            }
            Some(false) => self.entries.get(&key).map(|entry| entry.value.clone()),
            None => None,
        };

        self.record(transformation_id, cached.is_some());
        cached
    }

    /// Store a result with the configured TTL
    pub fn set(
        &mut self,
        transformation_id: &str,
        value: &Value,
        options: &TransformOptions,
        result: Value,
    ) {
        self.set_with_ttl(transformation_id, value, options, result, None);
    }

    /// Store a result with an explicit TTL, or the configured one when `None`
    pub fn set_with_ttl(
        &mut self,
        transformation_id: &str,
        value: &Value,
        options: &TransformOptions,
        result: Value,
        ttl: Option<Duration>,
    ) {
        if !self.settings.enabled {
            return;
        }

        let key = cache_key(transformation_id, value, options);
        // Overwrites move to the back of the queue
        self.remove_key(&key);
        while self.entries.len() >= self.settings.capacity {
            if !self.evict_oldest() {
                break;
            }
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.order.insert(sequence, key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                value: result,
                created_at: Instant::now(),
                ttl: ttl.unwrap_or(self.settings.ttl),
                transformation_id: transformation_id.to_string(),
                sequence,
            },
        );
    }

    /// Return the cached result, or compute and store it
    ///
    /// Errors from `compute` are passed through and nothing is stored.
    pub fn get_or_compute<E>(
        &mut self,
        transformation_id: &str,
        value: &Value,
        options: &TransformOptions,
        compute: impl FnOnce() -> std::result::Result<Value, E>,
    ) -> std::result::Result<Value, E> {
        if let Some(cached) = self.get(transformation_id, value, options) {
            return Ok(cached);
        }
        let result = compute()?;
        self.set(transformation_id, value, options, result.clone());
        Ok(result)
    }

    /// Remove one entry; returns whether it existed
    pub fn invalidate(
        &mut self,
        transformation_id: &str,
        value: &Value,
        options: &TransformOptions,
    ) -> bool {
        let key = cache_key(transformation_id, value, options);
        self.remove_key(&key)
    }

    /// Remove every entry produced by one transformation; returns how many were removed
    pub fn invalidate_all(&mut self, transformation_id: &str) -> usize {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.transformation_id == transformation_id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &keys {
            self.remove_key(key);
        }
        keys.len()
    }

    /// Drop every entry whose TTL has elapsed; returns how many were removed
    pub fn purge_expired(&mut self) -> usize {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &keys {
            self.remove_key(key);
        }
        keys.len()
    }

    /// Drop all entries and reset statistics
    pub fn clear(&mut self) {
        self.clear_entries();
        self.reset_stats();
    }

    /// Drop all entries, keeping hit and miss counters
    pub fn clear_entries(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Reset hit and miss counters, keeping entries
    pub fn reset_stats(&mut self) {
        self.counters = LookupCounters::default();
        self.by_transformation.clear();
    }

    /// Current statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits,
            misses: self.counters.misses,
            size: self.entries.len(),
            hit_rate: self.counters.hit_rate(),
            capacity: self.settings.capacity,
            by_transformation: self
                .by_transformation
                .iter()
                .map(|(id, counters)| (id.clone(), *counters))
                .collect(),
        }
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    /// Apply a partial settings change
    ///
    /// Shrinking the capacity evicts the oldest entries immediately. A TTL change
    /// applies to entries stored afterwards.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> Result<CacheSettings> {
        if let Some(capacity) = update.capacity {
            validate_capacity(capacity)?;
            self.settings.capacity = capacity;
        }
        if let Some(ttl) = update.ttl {
            self.settings.ttl = ttl;
        }
        if let Some(enabled) = update.enabled {
            self.settings.enabled = enabled;
        }

        let mut evicted = 0;
        while self.entries.len() > self.settings.capacity && self.evict_oldest() {
            evicted += 1;
        }
        tracing::debug!(
            capacity = self.settings.capacity,
            ttl_ms = self.settings.ttl.as_millis() as u64,
            enabled = self.settings.enabled,
            evicted,
            "cache settings updated"
        );
        Ok(self.settings)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record(&mut self, transformation_id: &str, hit: bool) {
        let per_id = self
            .by_transformation
            .entry(transformation_id.to_string())
            .or_default();
        if hit {
            self.counters.hits += 1;
            per_id.hits += 1;
        } else {
            self.counters.misses += 1;
            per_id.misses += 1;
        }
    }

    fn remove_key(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.order.remove(&entry.sequence);
                true
            }
            None => false,
        }
    }

    fn evict_oldest(&mut self) -> bool {
        match self.order.pop_first() {
            Some((_, key)) => {
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }
}

fn validate_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 {
        return Err(Error::configuration("cache capacity must be at least 1"));
    }
    Ok(())
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
