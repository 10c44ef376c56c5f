//! Thought cache
//!
//! Pure-function memoization of inference replies. The same role and
//! (normalized) conversation map to the same value within the TTL window.
//! Capacity is bounded with least-recently-used eviction.

use crate::config::CachePolicy;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use swarm_domain::{CacheKey, ConversationTurn};
use tokio::time::Instant;
use tracing::debug;

/// One memoized reply.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub role: String,
    pub fingerprint: CacheKey,
    pub value: String,
    pub inserted_at: Instant,
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Shared LRU cache of inference replies keyed by [`CacheKey`].
pub struct ThoughtCache {
    entries: Option<Mutex<LruCache<CacheKey, CacheEntry>>>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ThoughtCache {
    pub fn new(policy: &CachePolicy) -> Self {
        let entries = match NonZeroUsize::new(policy.capacity) {
            Some(capacity) if policy.enabled => Some(Mutex::new(LruCache::new(capacity))),
            _ => None,
        };
        Self {
            entries,
            ttl: policy.ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(&CachePolicy::disabled())
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Look up the reply for `role` and `messages`.
    pub fn get(&self, role: &str, messages: &[ConversationTurn]) -> Option<String> {
        let entries = self.entries.as_ref()?;
        let key = CacheKey::derive(role, messages);

        let mut entries = entries.lock();
        let expired = match entries.get(&key) {
            Some(entry) if !self.is_expired(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Thought cache hit for {} ({})", role, &key.as_str()[..12]);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(&key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store `value` for `role` and `messages`.
    pub fn set(&self, role: &str, messages: &[ConversationTurn], value: impl Into<String>) {
        let Some(entries) = self.entries.as_ref() else {
            return;
        };
        let key = CacheKey::derive(role, messages);
        let entry = CacheEntry {
            role: role.to_string(),
            fingerprint: key.clone(),
            value: value.into(),
            inserted_at: Instant::now(),
        };
        entries.lock().put(key, entry);
    }

    /// Drop the entry for `role` and `messages`, if any.
    pub fn invalidate(&self, role: &str, messages: &[ConversationTurn]) {
        if let Some(entries) = &self.entries {
            entries.lock().pop(&CacheKey::derive(role, messages));
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.as_ref().map_or(0, |e| e.lock().len()),
        }
    }

    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().clear();
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(text: &str) -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::system("You are the Strategist"),
            ConversationTurn::user(text),
        ]
    }

    #[tokio::test]
    async fn test_round_trip() {
        let cache = ThoughtCache::new(&CachePolicy::default());
        assert_eq!(cache.get("specialist:strategy", &conversation("goal")), None);

        cache.set("specialist:strategy", &conversation("goal"), "Focus on SMBs");
        assert_eq!(
            cache.get("specialist:strategy", &conversation("goal")).as_deref(),
            Some("Focus on SMBs")
        );

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hit_ratio(), 0.5);
    }

    #[tokio::test]
    async fn test_message_order_does_not_matter() {
        let cache = ThoughtCache::new(&CachePolicy::default());
        let forward = conversation("goal");
        let mut reversed = forward.clone();
        reversed.reverse();

        cache.set("planner", &forward, "plan");
        assert_eq!(cache.get("planner", &reversed).as_deref(), Some("plan"));
    }

    #[tokio::test]
    async fn test_role_isolation() {
        let cache = ThoughtCache::new(&CachePolicy::default());
        cache.set("specialist:qa", &conversation("goal"), "qa says");
        assert_eq!(cache.get("specialist:creative", &conversation("goal")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let cache = ThoughtCache::new(&CachePolicy {
            ttl: Some(Duration::from_secs(10)),
            ..CachePolicy::default()
        });
        cache.set("planner", &conversation("goal"), "plan");

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(cache.get("planner", &conversation("goal")).is_some());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(cache.get("planner", &conversation("goal")).is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = ThoughtCache::new(&CachePolicy {
            capacity: 2,
            ..CachePolicy::default()
        });
        cache.set("r", &conversation("a"), "A");
        cache.set("r", &conversation("b"), "B");
        // touch "a" so "b" becomes least recently used
        assert!(cache.get("r", &conversation("a")).is_some());
        cache.set("r", &conversation("c"), "C");

        assert!(cache.get("r", &conversation("a")).is_some());
        assert!(cache.get("r", &conversation("b")).is_none());
        assert!(cache.get("r", &conversation("c")).is_some());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = ThoughtCache::new(&CachePolicy::default());
        cache.set("planner", &conversation("goal"), "not json");
        cache.invalidate("planner", &conversation("goal"));
        assert!(cache.get("planner", &conversation("goal")).is_none());
    }

    #[tokio::test]
    async fn test_disabled_cache_never_hits() {
        let cache = ThoughtCache::disabled();
        cache.set("r", &conversation("a"), "A");
        assert_eq!(cache.get("r", &conversation("a")), None);
        assert!(!cache.is_enabled());
        assert_eq!(cache.stats().entries, 0);
    }
}
