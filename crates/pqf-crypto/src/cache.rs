//! Concurrent key cache with per-entry TTL, batch eviction, and a
//! background sweep thread.
//!
//! Entries are keyed by `(kind, source id)`, so the same identifier can
//! cache its public and private halves independently. Expiry is enforced
//! both lazily on `get` and by the sweeper, which wakes every
//! `sweep_interval` and drops everything past its deadline. Keys live behind
//! `Arc`s; eviction drops the cache's reference and the key material itself
//! is freed once the last caller is done with it.

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::debug;

use pqf_core::CacheConfig;

use crate::keys::{HybridPrivateKey, HybridPublicKey, SignaturePublicKey, SignatureSecretKey};

/// Which of the four key roles an entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    HybridPublic,
    HybridPrivate,
    SignaturePublic,
    SignaturePrivate,
}

/// A shared, immutable key as stored in the cache.
#[derive(Clone)]
pub enum CachedKey {
    HybridPublic(Arc<HybridPublicKey>),
    HybridPrivate(Arc<HybridPrivateKey>),
    SignaturePublic(Arc<SignaturePublicKey>),
    SignaturePrivate(Arc<SignatureSecretKey>),
}

impl CachedKey {
    pub fn kind(&self) -> KeyKind {
        match self {
            CachedKey::HybridPublic(_) => KeyKind::HybridPublic,
            CachedKey::HybridPrivate(_) => KeyKind::HybridPrivate,
            CachedKey::SignaturePublic(_) => KeyKind::SignaturePublic,
            CachedKey::SignaturePrivate(_) => KeyKind::SignaturePrivate,
        }
    }
}

impl std::fmt::Debug for CachedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CachedKey").field(&self.kind()).finish()
    }
}

struct CacheEntry {
    key: CachedKey,
    inserted_at: Instant,
    expires_at: Instant,
}

struct Sweeper {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Thread-safe key cache; wrap it in an `Arc` to share across threads.
pub struct KeyCache {
    entries: Arc<Mutex<HashMap<(KeyKind, String), CacheEntry>>>,
    max_entries: usize,
    default_ttl: Duration,
    sweeper: Mutex<Option<Sweeper>>,
}

impl KeyCache {
    /// Build a cache and start its background sweep thread. The thread
    /// stops when [`KeyCache::shutdown`] is called or the cache is dropped.
    pub fn new(config: CacheConfig) -> Self {
        let entries = Arc::new(Mutex::new(HashMap::new()));
        let sweeper = Self::spawn_sweeper(Arc::clone(&entries), config.sweep_interval());
        Self {
            entries,
            max_entries: config.max_entries.max(1),
            default_ttl: config.ttl(),
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    fn spawn_sweeper(
        entries: Arc<Mutex<HashMap<(KeyKind, String), CacheEntry>>>,
        interval: Duration,
    ) -> Sweeper {
        let (stop, rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("pqf-key-sweep".into())
            .spawn(move || loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let now = Instant::now();
                        let mut map = entries.lock().unwrap_or_else(|p| p.into_inner());
                        let before = map.len();
                        map.retain(|_, entry| entry.expires_at > now);
                        let swept = before - map.len();
                        if swept > 0 {
                            debug!(swept, remaining = map.len(), "key cache sweep");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }
            })
            .expect("failed to spawn key cache sweep thread");
        Sweeper { stop, handle }
    }

    /// Fetch an unexpired entry. An expired entry is removed and reported
    /// as a miss.
    pub fn get(&self, kind: KeyKind, source_id: &str) -> Option<CachedKey> {
        let mut map = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let lookup = (kind, source_id.to_owned());
        match map.get(&lookup) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.key.clone()),
            Some(_) => {
                map.remove(&lookup);
                None
            }
            None => None,
        }
    }

    /// Insert a key with the default TTL.
    pub fn put(&self, source_id: &str, key: CachedKey) {
        self.put_with_ttl(source_id, key, self.default_ttl);
    }

    /// Insert a key with an explicit TTL. If the cache is full, a batch of
    /// the oldest and expired entries (20% of capacity, at least one) is
    /// evicted first.
    pub fn put_with_ttl(&self, source_id: &str, key: CachedKey, ttl: Duration) {
        let kind = key.kind();
        let now = Instant::now();
        let mut map = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let lookup = (kind, source_id.to_owned());
        if !map.contains_key(&lookup) && map.len() >= self.max_entries {
            Self::evict_batch(&mut map, self.max_entries, now);
        }
        map.insert(
            lookup,
            CacheEntry {
                key,
                inserted_at: now,
                expires_at: now + ttl,
            },
        );
    }

    fn evict_batch(
        map: &mut HashMap<(KeyKind, String), CacheEntry>,
        max_entries: usize,
        now: Instant,
    ) {
        let batch = (max_entries / 5).max(1);

        let expired: Vec<_> = map
            .iter()
            .filter(|(_, e)| e.expires_at <= now)
            .map(|(k, _)| k.clone())
            .collect();
        let mut evicted = 0;
        for k in expired.into_iter().take(batch) {
            map.remove(&k);
            evicted += 1;
        }

        while evicted < batch {
            let oldest = map
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    map.remove(&k);
                    evicted += 1;
                }
                None => break,
            }
        }
        debug!(evicted, remaining = map.len(), "key cache eviction");
    }

    /// Remove one entry. No-op if absent.
    pub fn remove(&self, kind: KeyKind, source_id: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&(kind, source_id.to_owned()));
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop the sweep thread and wait for it. Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(Sweeper { stop, handle }) = sweeper {
            let _ = stop.send(());
            let _ = handle.join();
        }
    }
}

impl Drop for KeyCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}
