//! Key loading behind a trait, with a caching decorator.
//!
//! [`KeyStore`] is the seam between the engine and wherever keys actually
//! live (files, a KMS, a test fixture). [`CachedKeyStore`] wraps any store
//! with the TTL cache so repeated encrypt/decrypt calls against the same
//! identity skip the backing store.

use std::sync::Arc;

use tracing::debug;

use pqf_core::{CacheConfig, PqfError, PqfResult};

use crate::cache::{CachedKey, KeyCache, KeyKind};
use crate::keys::{HybridPrivateKey, HybridPublicKey, SignaturePublicKey, SignatureSecretKey};

/// Source of key material, addressed by `(kind, source id)`.
pub trait KeyStore: Send + Sync {
    /// Load the requested key. Implementations return
    /// [`PqfError::Key`] when the identity is unknown or the material is
    /// malformed.
    fn load(&self, kind: KeyKind, source_id: &str) -> PqfResult<CachedKey>;
}

/// A [`KeyStore`] fronted by a [`KeyCache`].
pub struct CachedKeyStore<S> {
    store: S,
    cache: KeyCache,
}

impl<S: KeyStore> CachedKeyStore<S> {
    pub fn new(store: S, config: CacheConfig) -> Self {
        Self {
            store,
            cache: KeyCache::new(config),
        }
    }

    /// Cache-first load. A backing store that returns a key of the wrong
    /// kind is a configuration bug and reported as [`PqfError::Key`].
    pub fn load(&self, kind: KeyKind, source_id: &str) -> PqfResult<CachedKey> {
        if let Some(key) = self.cache.get(kind, source_id) {
            return Ok(key);
        }
        debug!(?kind, source_id, "key cache miss, loading from store");
        let key = self.store.load(kind, source_id)?;
        if key.kind() != kind {
            return Err(PqfError::Key(format!(
                "key store returned {:?} for a {kind:?} request (source {source_id})",
                key.kind()
            )));
        }
        self.cache.put(source_id, key.clone());
        Ok(key)
    }

    pub fn hybrid_public(&self, source_id: &str) -> PqfResult<Arc<HybridPublicKey>> {
        match self.load(KeyKind::HybridPublic, source_id)? {
            CachedKey::HybridPublic(key) => Ok(key),
            _ => unreachable!("load() checks the kind"),
        }
    }

    pub fn hybrid_private(&self, source_id: &str) -> PqfResult<Arc<HybridPrivateKey>> {
        match self.load(KeyKind::HybridPrivate, source_id)? {
            CachedKey::HybridPrivate(key) => Ok(key),
            _ => unreachable!("load() checks the kind"),
        }
    }

    pub fn signature_public(&self, source_id: &str) -> PqfResult<Arc<SignaturePublicKey>> {
        match self.load(KeyKind::SignaturePublic, source_id)? {
            CachedKey::SignaturePublic(key) => Ok(key),
            _ => unreachable!("load() checks the kind"),
        }
    }

    pub fn signature_secret(&self, source_id: &str) -> PqfResult<Arc<SignatureSecretKey>> {
        match self.load(KeyKind::SignaturePrivate, source_id)? {
            CachedKey::SignaturePrivate(key) => Ok(key),
            _ => unreachable!("load() checks the kind"),
        }
    }

    /// Forget one cached entry; the next load hits the backing store.
    pub fn invalidate(&self, kind: KeyKind, source_id: &str) {
        self.cache.remove(kind, source_id);
    }

    pub fn cache(&self) -> &KeyCache {
        &self.cache
    }
}
