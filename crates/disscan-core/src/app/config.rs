//! Pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::CoreError;

pub const DEFAULT_WORKERS: usize = 2;

/// Largest bounded capacity the queue can represent.
pub const MAX_QUEUE_CAPACITY: usize = Semaphore::MAX_PERMITS;

/// `{ workers ≥ 1 (2), queue_capacity ≥ 0 (0 = unbounded), timeout (none) }`
///
/// Deserializes from e.g. `{"workers": 8, "queue_capacity": 100,
/// "timeout_ms": 300000}`; missing keys take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    #[serde(rename = "timeout_ms", with = "timeout_ms")]
    pub timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: 0,
            timeout: None,
        }
    }
}

impl PoolConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_bounded(&self) -> bool {
        self.queue_capacity > 0
    }

    /// Fail fast on values the pool can't run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.workers == 0 {
            return Err(CoreError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(CoreError::InvalidConfig(format!(
                "queue_capacity {} exceeds the maximum of {MAX_QUEUE_CAPACITY}",
                self.queue_capacity
            )));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(CoreError::InvalidConfig(
                "timeout must be positive (leave it unset to disable)".to_string(),
            ));
        }
        Ok(())
    }
}

mod timeout_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
