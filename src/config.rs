//! Pipeline configuration.
//!
//! Values come from (lowest to highest precedence) built-in defaults, an
//! optional JSON file and `MODCHAIN_*` environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `MODCHAIN_WORKER_THREADS` | `worker_threads` |
//! | `MODCHAIN_THREAD_NAME_PREFIX` | `thread_name_prefix` |
//! | `MODCHAIN_STATUS_SCHEME` | `status_scheme` (comma-separated) |
//! | `MODCHAIN_INLINE_TRANSFORMS` | `inline_transforms` |

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use modchain_resolver::{DefaultVersionOracle, DEFAULT_STATUS_SCHEME};
use modchain_transform::{InlineWorkerQueue, RayonWorkerQueue, WorkerQueue};
use modchain_types::env_utils::{env_flag, env_list, env_var};
use serde::{Deserialize, Serialize};

pub const ENV_WORKER_THREADS: &str = "MODCHAIN_WORKER_THREADS";
pub const ENV_THREAD_NAME_PREFIX: &str = "MODCHAIN_THREAD_NAME_PREFIX";
pub const ENV_STATUS_SCHEME: &str = "MODCHAIN_STATUS_SCHEME";
pub const ENV_INLINE_TRANSFORMS: &str = "MODCHAIN_INLINE_TRANSFORMS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Transform worker threads; 0 lets the pool pick one per core.
    #[serde(default)]
    pub worker_threads: usize,
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
    /// Statuses from least to most mature, used by `latest.<status>`.
    #[serde(default = "default_status_scheme")]
    pub status_scheme: Vec<String>,
    /// Run transforms on the calling thread instead of a worker pool.
    #[serde(default)]
    pub inline_transforms: bool,
}

fn default_thread_name_prefix() -> String {
    "modchain-transform".to_string()
}

fn default_status_scheme() -> Vec<String> {
    DEFAULT_STATUS_SCHEME.iter().map(|s| s.to_string()).collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            thread_name_prefix: default_thread_name_prefix(),
            status_scheme: default_status_scheme(),
            inline_transforms: false,
        }
    }
}

impl PipelineConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().apply_env_overrides()
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse pipeline config")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON in {}", path.display()))
    }

    /// Read `path` if given (defaults otherwise), then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        Ok(config.apply_env_overrides())
    }

    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(threads) = env_var(ENV_WORKER_THREADS) {
            self.worker_threads = threads;
        }
        if let Some(prefix) = env_var::<String>(ENV_THREAD_NAME_PREFIX) {
            if !prefix.is_empty() {
                self.thread_name_prefix = prefix;
            }
        }
        let scheme = env_list(ENV_STATUS_SCHEME);
        if !scheme.is_empty() {
            self.status_scheme = scheme;
        }
        if let Some(inline) = env_flag(ENV_INLINE_TRANSFORMS) {
            self.inline_transforms = inline;
        }
        self
    }

    pub fn version_oracle(&self) -> DefaultVersionOracle {
        DefaultVersionOracle::with_status_scheme(self.status_scheme.clone())
    }

    pub fn worker_queue(&self) -> Result<Arc<dyn WorkerQueue>> {
        if self.inline_transforms {
            return Ok(Arc::new(InlineWorkerQueue));
        }
        let pool = RayonWorkerQueue::new(self.worker_threads, &self.thread_name_prefix)?;
        Ok(Arc::new(pool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = PipelineConfig::from_json_str(r#"{"worker_threads": 3}"#).unwrap();
        assert_eq!(config.worker_threads, 3);
        assert_eq!(config.thread_name_prefix, "modchain-transform");
        assert_eq!(config.status_scheme, vec!["integration", "milestone", "release"]);
        assert!(!config.inline_transforms);
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let err = PipelineConfig::from_json_str("{ nope").unwrap_err();
        assert!(err.to_string().contains("Failed to parse pipeline config"));
    }

    #[test]
    fn test_oracle_uses_scheme() {
        let config = PipelineConfig {
            status_scheme: vec!["snapshot".into(), "stable".into()],
            ..PipelineConfig::default()
        };
        assert_eq!(config.version_oracle().status_scheme(), ["snapshot", "stable"]);
    }
}
