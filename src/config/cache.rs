//! Conversation cache configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Age-based eviction settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Entries unused for longer than this are evicted (default 7 days)
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,

    /// Minimum time between sweeps (default 1 hour)
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_age_secs == 0 {
            return Err(ValidationError::InvalidCacheInterval("max_age_secs"));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(ValidationError::InvalidCacheInterval("cleanup_interval_secs"));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

fn default_max_age() -> u64 {
    7 * 24 * 60 * 60
}

fn default_cleanup_interval() -> u64 {
    60 * 60
}
