//! Configuration model for the mover daemon.
//!
//! The service binary deserializes this from layered configuration sources;
//! the core only sees the validated, typed queue pairs. The pair list is
//! static for the process lifetime; there is no hot-reload.

use queue_mover_runtime::{QueuePair, QueueUrl};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoverConfig {
    /// Ordered list of queue pairs to move messages between
    #[serde(default)]
    pub queues: Vec<QueuePairConfig>,
}

/// One source/destination queue pairing, as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuePairConfig {
    pub source: String,
    pub destination: String,
}

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no queue pairs configured")]
    NoQueues,

    #[error("queue pair {index}: invalid {role} queue URL '{url}': {message}")]
    InvalidQueueUrl {
        index: usize,
        role: &'static str,
        url: String,
        message: String,
    },

    #[error("queue pair {index}: source and destination are the same queue: {url}")]
    SelfPair { index: usize, url: String },
}

impl MoverConfig {
    /// Validate the configuration, producing the typed pair list
    pub fn validate(&self) -> Result<Vec<QueuePair>, ConfigError> {
        if self.queues.is_empty() {
            return Err(ConfigError::NoQueues);
        }

        let mut pairs = Vec::with_capacity(self.queues.len());
        for (index, pair) in self.queues.iter().enumerate() {
            let source = QueueUrl::new(pair.source.clone()).map_err(|e| {
                ConfigError::InvalidQueueUrl {
                    index,
                    role: "source",
                    url: pair.source.clone(),
                    message: e.to_string(),
                }
            })?;
            let destination = QueueUrl::new(pair.destination.clone()).map_err(|e| {
                ConfigError::InvalidQueueUrl {
                    index,
                    role: "destination",
                    url: pair.destination.clone(),
                    message: e.to_string(),
                }
            })?;

            if source == destination {
                return Err(ConfigError::SelfPair {
                    index,
                    url: pair.source.clone(),
                });
            }

            pairs.push(QueuePair::new(source, destination));
        }

        Ok(pairs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
