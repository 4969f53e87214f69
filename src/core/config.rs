use crate::core::errors::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Search run configuration with all tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of concurrent probe workers
    pub workers: usize,
    /// Upper bound on a single probe (None = unbounded)
    pub probe_timeout_ms: Option<u64>,
    /// Progress sampling interval
    pub progress_interval_ms: u64,
    /// Overall deadline for the run (None = until found or exhausted)
    pub run_timeout_ms: Option<u64>,
    /// Maximum characters of probe detail kept in the attempt log
    pub response_truncate: usize,
    /// Optional JSON-lines attempt log
    pub attempt_log_path: Option<PathBuf>,
    /// Buffered progress snapshots before new ones are dropped
    pub progress_channel_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: 64,
            probe_timeout_ms: Some(10_000),
            progress_interval_ms: 500,
            run_timeout_ms: None,
            response_truncate: 80,
            attempt_log_path: None,
            progress_channel_capacity: 64,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(SearchError::configuration_field(
                "workers must be greater than 0",
                "workers",
            ));
        }
        if self.probe_timeout_ms == Some(0) {
            return Err(SearchError::configuration_field(
                "probe_timeout_ms must be greater than 0 when set",
                "probe_timeout_ms",
            ));
        }
        if self.progress_interval_ms == 0 {
            return Err(SearchError::configuration_field(
                "progress_interval_ms must be greater than 0",
                "progress_interval_ms",
            ));
        }
        if self.run_timeout_ms == Some(0) {
            return Err(SearchError::configuration_field(
                "run_timeout_ms must be greater than 0 when set",
                "run_timeout_ms",
            ));
        }
        if self.response_truncate == 0 {
            return Err(SearchError::configuration_field(
                "response_truncate must be greater than 0",
                "response_truncate",
            ));
        }
        if self.progress_channel_capacity == 0 {
            return Err(SearchError::configuration_field(
                "progress_channel_capacity must be greater than 0",
                "progress_channel_capacity",
            ));
        }
        Ok(())
    }

    /// Small pool with short timeouts, for tests and local runs
    pub fn conservative() -> Self {
        Self {
            workers: 4,
            probe_timeout_ms: Some(2_000),
            progress_interval_ms: 100,
            ..Self::default()
        }
    }

    /// Wide pool for high-latency oracles
    pub fn aggressive() -> Self {
        Self {
            workers: 300,
            probe_timeout_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Parse a configuration from YAML; missing keys take default values.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SearchError::io(format!("read config {}", path.display()), e))?;
        Self::from_yaml_str(&contents)
    }

    /// Set the worker count (at least one worker is always used).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.probe_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    pub fn with_attempt_log(mut self, path: Option<PathBuf>) -> Self {
        self.attempt_log_path = path;
        self
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout_ms.map(Duration::from_millis)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.probe_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.progress_interval(), Duration::from_millis(500));
        assert!(config.run_timeout().is_none());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(SearchConfig::conservative().validate().is_ok());
        assert!(SearchConfig::aggressive().validate().is_ok());
    }

    #[test]
    fn test_minimum_workers() {
        let config = SearchConfig::default().with_workers(0);
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = SearchConfig::default();
        config.workers = 0;
        assert!(matches!(
            config.validate(),
            Err(SearchError::Configuration { .. })
        ));

        let config = SearchConfig::default().with_probe_timeout(Some(Duration::ZERO));
        assert!(config.validate().is_err());

        let mut config = SearchConfig::default();
        config.response_truncate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_partial_override() {
        let yaml = "workers: 12\nprobe_timeout_ms: 1500\nattempt_log_path: attempts.jsonl\n";
        let config = SearchConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.workers, 12);
        assert_eq!(config.probe_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.attempt_log_path, Some(PathBuf::from("attempts.jsonl")));
        assert_eq!(config.progress_interval_ms, 500);
    }

    #[test]
    fn test_yaml_invalid_values_rejected() {
        assert!(SearchConfig::from_yaml_str("workers: 0\n").is_err());
        assert!(SearchConfig::from_yaml_str("workers: [1, 2]\n").is_err());
    }
}
