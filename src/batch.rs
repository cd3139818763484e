// src/batch.rs
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::processing::{Batch, WorkerDeadline};

/// Batch settings read from a JSON file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub total_count: usize,
    #[serde(default)]
    pub unit_size: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub worker_deadline: WorkerDeadline,
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl BatchConfig {
    /// Config for `total_count` items with every other field at its default.
    pub fn new(total_count: usize) -> Self {
        Self {
            total_count,
            unit_size: 0,
            timeout_ms: default_timeout_ms(),
            worker_deadline: WorkerDeadline::default(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch config {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid batch config {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn to_batch(&self) -> Batch {
        Batch::new(self.total_count, self.unit_size, self.timeout())
            .with_worker_deadline(self.worker_deadline)
    }
}
