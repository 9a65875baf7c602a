//! Relayer configuration, loaded from JSON.

use std::path::Path;
use std::time::Duration;

use fisher_types::{FisherError, OptimizerConfig, Result, constants};
use serde::{Deserialize, Serialize};

/// How a batch picks operations from the pending queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Arrival order.
    #[default]
    Fifo,
    /// Highest priority score first, ties in arrival order.
    Priority,
}

/// Batch policy plus service timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayerConfig {
    pub optimizer: OptimizerConfig,
    /// Tick interval of the background batch loop.
    pub batch_interval_ms: u64,
    /// Pending queue capacity.
    pub max_pending: usize,
    pub ordering: OrderingPolicy,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            optimizer: OptimizerConfig::default(),
            batch_interval_ms: constants::DEFAULT_BATCH_INTERVAL_MS,
            max_pending: constants::DEFAULT_MAX_PENDING,
            ordering: OrderingPolicy::default(),
        }
    }
}

impl RelayerConfig {
    /// Read and validate a JSON config file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            min_batch = config.optimizer.min_batch_size,
            max_batch = config.optimizer.max_batch_size,
            interval_ms = config.batch_interval_ms,
            ordering = ?config.ordering,
            "Relayer config loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.optimizer.validate()?;
        if self.batch_interval_ms == 0 {
            return Err(FisherError::Configuration(
                "batch_interval_ms must be positive".into(),
            ));
        }
        if self.max_pending < self.optimizer.max_batch_size {
            return Err(FisherError::Configuration(format!(
                "max_pending {} is below max_batch_size {}",
                self.max_pending, self.optimizer.max_batch_size
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }
}
