//! YAML configuration.
//!
//! ```yaml
//! namespace: novelcache
//! fast_tier:
//!   max_entries: 512
//! durable:
//!   type: FeOxDb
//!   path: /var/lib/novelcache
//!   max_memory: 16777216
//! orchestrator:
//!   auto_refresh: 5m
//!   dedupe_in_flight: true
//!   refresh_horizon: 30m
//! sweep_on_start: true
//! ```
//!
//! Every section is optional. Without a `durable` section the durable tier is
//! in-memory storage limited to [`DEFAULT_MEMORY_QUOTA`] bytes.

use std::path::PathBuf;
use std::time::Duration;

use novelcache_backend::{FastTier, KeyValueStorage, MemoryStorage};
use novelcache_core::{DEFAULT_NAMESPACE, REFRESH_HORIZON};
use novelcache_moka::MokaFastTier;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::coordinator::{CacheCoordinator, CacheCoordinatorBuilder, DEFAULT_FAST_TIER_ENTRIES};
use crate::error::ConfigError;
use crate::orchestrator::{DataOrchestrator, DataOrchestratorBuilder};
use crate::refresh::RefreshHandle;

/// Memory storage quota used when no `durable` section is given.
pub const DEFAULT_MEMORY_QUOTA: usize = 5 * 1024 * 1024;

/// Coordinator with type-erased durable storage, as built from configuration.
pub type ConfiguredCoordinator = CacheCoordinator<MokaFastTier, Box<dyn KeyValueStorage>>;

/// Top-level cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CacheConfig {
    /// Key namespace shared by both tiers.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Fast tier settings.
    #[serde(default)]
    pub fast_tier: FastTierConfig,
    /// Durable tier storage.
    #[serde(default)]
    pub durable: DurableConfig,
    /// Orchestrator settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Whether expired durable records are swept when the coordinator is built.
    #[serde(default = "default_true")]
    pub sweep_on_start: bool,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            fast_tier: FastTierConfig::default(),
            durable: DurableConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            sweep_on_start: true,
        }
    }
}

/// Fast tier settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FastTierConfig {
    /// Maximum number of entries before least recently used ones are evicted.
    pub max_entries: u64,
}

impl Default for FastTierConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_FAST_TIER_ENTRIES,
        }
    }
}

/// Durable tier storage backend.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum DurableConfig {
    /// Process-local storage, optionally limited in bytes.
    Memory {
        /// Byte quota over keys and values. Unbounded when absent.
        #[serde(default)]
        quota_bytes: Option<usize>,
    },
    /// FeOxDB storage. Requires the `feoxdb` feature.
    FeOxDb {
        /// Database file or directory. In-memory when absent.
        #[serde(default)]
        path: Option<PathBuf>,
        /// Maximum database file size in bytes.
        #[serde(default)]
        max_file_size: Option<u64>,
        /// Maximum memory used by the store in bytes.
        #[serde(default)]
        max_memory: Option<usize>,
    },
}

impl Default for DurableConfig {
    fn default() -> Self {
        DurableConfig::Memory {
            quota_bytes: Some(DEFAULT_MEMORY_QUOTA),
        }
    }
}

impl DurableConfig {
    /// Opens the configured storage.
    pub fn into_storage(self) -> Result<Box<dyn KeyValueStorage>, ConfigError> {
        match self {
            DurableConfig::Memory { quota_bytes: None } => Ok(Box::new(MemoryStorage::new())),
            DurableConfig::Memory {
                quota_bytes: Some(0),
            } => Err(ConfigError::InvalidValue {
                field: "durable.quota_bytes",
                reason: "must be greater than zero".to_string(),
            }),
            DurableConfig::Memory {
                quota_bytes: Some(quota),
            } => Ok(Box::new(MemoryStorage::with_quota(quota))),
            #[cfg(feature = "feoxdb")]
            DurableConfig::FeOxDb {
                path,
                max_file_size,
                max_memory,
            } => {
                use novelcache_feoxdb::FeOxDbStorage;

                let mut builder = FeOxDbStorage::builder();
                if let Some(path) = path {
                    builder = builder.path(path);
                }
                if let Some(bytes) = max_file_size {
                    builder = builder.max_file_size(bytes);
                }
                if let Some(bytes) = max_memory {
                    builder = builder.max_memory(bytes);
                }
                Ok(Box::new(builder.build()?))
            }
            #[cfg(not(feature = "feoxdb"))]
            DurableConfig::FeOxDb { .. } => {
                Err(ConfigError::BackendNotAvailable("FeOxDb".to_string()))
            }
        }
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Auto-refresh tick period. Auto-refresh is off when absent.
    #[serde(default, with = "humantime_serde")]
    pub auto_refresh: Option<Duration>,
    /// Whether concurrent loads of the same key share one fetch.
    #[serde(default = "default_true")]
    pub dedupe_in_flight: bool,
    /// Time after a successful pass before auto-refresh runs again.
    #[serde(default = "default_refresh_horizon", with = "humantime_serde")]
    pub refresh_horizon: Duration,
}

fn default_refresh_horizon() -> Duration {
    REFRESH_HORIZON
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            auto_refresh: None,
            dedupe_in_flight: true,
            refresh_horizon: REFRESH_HORIZON,
        }
    }
}

impl OrchestratorConfig {
    /// Applies these settings to an orchestrator builder.
    pub fn apply<F, S>(&self, builder: DataOrchestratorBuilder<F, S>) -> DataOrchestratorBuilder<F, S>
    where
        F: FastTier + 'static,
        S: KeyValueStorage + 'static,
    {
        builder
            .dedupe_in_flight(self.dedupe_in_flight)
            .refresh_horizon(self.refresh_horizon)
    }

    /// Starts auto-refresh if an interval is configured.
    pub fn spawn_auto_refresh<F, S>(
        &self,
        orchestrator: &DataOrchestrator<F, S>,
    ) -> Option<RefreshHandle>
    where
        F: FastTier + 'static,
        S: KeyValueStorage + 'static,
    {
        self.auto_refresh
            .map(|interval| orchestrator.auto_refresh(interval))
    }
}

impl CacheConfig {
    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Builder for the configured coordinator, for callers that still want to
    /// replace the clock.
    pub fn coordinator_builder(
        &self,
    ) -> Result<CacheCoordinatorBuilder<MokaFastTier, Box<dyn KeyValueStorage>>, ConfigError> {
        if self.fast_tier.max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fast_tier.max_entries",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.namespace.is_empty() || self.namespace.contains(':') {
            return Err(ConfigError::InvalidValue {
                field: "namespace",
                reason: "must be non-empty and must not contain `:`".to_string(),
            });
        }
        let fast = MokaFastTier::builder()
            .max_entries(self.fast_tier.max_entries)
            .build();
        let storage = self.durable.clone().into_storage()?;
        info!(
            namespace = %self.namespace,
            storage = storage.label(),
            max_entries = self.fast_tier.max_entries,
            "configured cache"
        );
        Ok(CacheCoordinator::builder()
            .namespace(self.namespace.as_str())
            .fast_tier(fast)
            .storage(storage)
            .sweep_on_start(self.sweep_on_start))
    }

    /// Builds the configured coordinator.
    pub fn build_coordinator(&self) -> Result<ConfiguredCoordinator, ConfigError> {
        Ok(self.coordinator_builder()?.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = CacheConfig::from_yaml("{}").unwrap();
        assert_eq!(config, CacheConfig::default());
        assert_eq!(
            config.durable,
            DurableConfig::Memory {
                quota_bytes: Some(DEFAULT_MEMORY_QUOTA)
            }
        );
    }

    #[test]
    fn zero_quota_is_rejected() {
        let Err(err) = DurableConfig::Memory {
            quota_bytes: Some(0),
        }
        .into_storage() else {
            panic!("zero quota must be rejected");
        };
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "durable.quota_bytes",
                ..
            }
        ));
    }
}
