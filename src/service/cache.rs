// ============================================================================
// Cache Store
// ============================================================================
// Map en mémoire (coin, range) -> (série, instant du fetch)
//
// - put() écrase sans condition et horodate
// - get() retourne l'entrée même périmée (fallback en cas d'échec)
// - get_fresh() ne retourne que les entrées dans la fenêtre de fraîcheur
//
// LIMITATION CONNUE : aucune éviction. Le cache vit le temps du processus et
// grossit avec le nombre de (coin, range) consultés, ce qui reste petit pour
// un dashboard local.
// ============================================================================

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::models::{PriceSeries, TimeRange};

/// Clé composite (coin, range)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub coin_id: String,
    pub range: TimeRange,
}

impl SeriesKey {
    pub fn new(coin_id: impl Into<String>, range: TimeRange) -> Self {
        Self {
            coin_id: coin_id.into(),
            range,
        }
    }

    /// Clé texte du cache : "bitcoin:1d"
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.coin_id, self.range.label())
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cache_key())
    }
}

/// Une série en cache et l'instant où elle a été récupérée
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub series: PriceSeries,
    pub fetched_at: Instant,
}

impl CacheEntry {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    /// Fraîche si now - fetched_at < freshness
    pub fn is_fresh(&self, now: Instant, freshness: Duration) -> bool {
        self.age(now) < freshness
    }
}

/// Cache des historiques de prix
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    freshness: Duration,
}

impl CacheStore {
    pub fn new(freshness: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            freshness,
        }
    }

    /// Entrée pour une clé, fraîche ou non
    pub fn get(&self, key: &SeriesKey) -> Option<&CacheEntry> {
        self.entries.get(&key.cache_key())
    }

    /// Entrée pour une clé, seulement si elle est encore fraîche
    pub fn get_fresh(&self, key: &SeriesKey, now: Instant) -> Option<&CacheEntry> {
        self.get(key)
            .filter(|entry| entry.is_fresh(now, self.freshness))
    }

    /// Écrase l'entrée et l'horodate maintenant
    pub fn put(&mut self, key: &SeriesKey, series: PriceSeries) {
        self.put_at(key, series, Instant::now());
    }

    pub fn put_at(&mut self, key: &SeriesKey, series: PriceSeries, fetched_at: Instant) {
        self.entries
            .insert(key.cache_key(), CacheEntry { series, fetched_at });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
