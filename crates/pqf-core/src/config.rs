use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Key cache tuning (embeddable in a host application's config file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached keys before batch eviction kicks in
    /// (default: 100)
    pub max_entries: usize,
    /// Entry time-to-live in seconds (default: 3600 = 1 hour)
    pub ttl_secs: u64,
    /// Background sweep interval in seconds (default: 300 = 5 minutes)
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            ttl_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
