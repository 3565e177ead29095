//! Batch limits and job settings.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default cap on bookings any single property may contribute to one batch.
pub const DEFAULT_MAX_PER_PROPERTY: usize = 2;

/// Default base name for batch files.
pub const DEFAULT_BATCH_NAME: &str = "batch";

/// Batch size presets matching the deployment profiles in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchProfile {
    /// 1,000 bookings per batch
    Standard,
    /// 250 bookings per batch
    Compact,
    /// Custom booking count
    Custom(usize),
}

impl BatchProfile {
    /// Returns the batch size for this profile.
    pub fn max_batch_size(self) -> usize {
        match self {
            BatchProfile::Standard => 1_000,
            BatchProfile::Compact => 250,
            BatchProfile::Custom(n) => n,
        }
    }
}

impl From<BatchProfile> for usize {
    fn from(profile: BatchProfile) -> Self {
        profile.max_batch_size()
    }
}

/// How the partitioner drains the booking pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionStrategy {
    /// Scan the remaining pool in input order once per batch.
    #[default]
    PoolScan,
    /// Drain per-property queues in first-appearance order.
    RoundRobin,
}

/// The two constraints every batch must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLimits {
    pub max_batch_size: usize,
    pub max_per_property: usize,
}

impl BatchLimits {
    pub fn new(max_batch_size: usize, max_per_property: usize) -> Self {
        Self {
            max_batch_size,
            max_per_property,
        }
    }
}

/// Configuration for one batching job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum bookings per batch.
    pub max_batch_size: usize,
    /// Maximum bookings per property within a batch.
    pub max_per_property: usize,
    /// Base name used for batch file names.
    pub batch_name: String,
    /// Field delimiter of the input and output files.
    pub delimiter: u8,
    pub strategy: PartitionStrategy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::with_profile(BatchProfile::Standard)
    }
}

impl BatchConfig {
    /// Creates a BatchConfig with the given profile's batch size.
    pub fn with_profile(profile: BatchProfile) -> Self {
        Self {
            max_batch_size: profile.max_batch_size(),
            max_per_property: DEFAULT_MAX_PER_PROPERTY,
            batch_name: DEFAULT_BATCH_NAME.to_string(),
            delimiter: b',',
            strategy: PartitionStrategy::default(),
        }
    }

    /// Sets the max_batch_size limit.
    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Sets the max_per_property limit.
    pub fn max_per_property(mut self, count: usize) -> Self {
        self.max_per_property = count;
        self
    }

    /// Sets the base name for batch files.
    pub fn batch_name(mut self, name: impl Into<String>) -> Self {
        self.batch_name = name.into();
        self
    }

    /// Sets the field delimiter.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the partition strategy.
    pub fn strategy(mut self, strategy: PartitionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn limits(&self) -> BatchLimits {
        BatchLimits::new(self.max_batch_size, self.max_per_property)
    }

    /// Rejects settings under which a job cannot place any booking or
    /// cannot produce usable file names.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_batch_size == 0 {
            return Err(AppError::InvalidConfig(
                "max_batch_size must be at least 1".into(),
            ));
        }
        if self.max_per_property == 0 {
            return Err(AppError::InvalidConfig(
                "max_per_property must be at least 1".into(),
            ));
        }
        let name = self.batch_name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidConfig("batch_name must not be empty".into()));
        }
        if name.contains(|c: char| c == '/' || c == '\\') || name == "." || name == ".." {
            return Err(AppError::InvalidConfig(format!(
                "batch_name '{}' must not contain path separators",
                name
            )));
        }
        if matches!(self.delimiter, b'"' | b'\n' | b'\r') {
            return Err(AppError::InvalidConfig(
                "delimiter must not be a quote or line break".into(),
            ));
        }
        Ok(())
    }
}
