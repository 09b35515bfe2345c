use serde::{Deserialize, Serialize};

fn default_log_level() -> String {
    "info".to_string()
}

fn default_snapshot_dir() -> String {
    "snapshots".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Periodic per-day composition dumps. An interval of 0 disables them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub interval_days: u64,
    #[serde(default = "default_snapshot_dir")]
    pub output_dir: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            interval_days: 0,
            output_dir: default_snapshot_dir(),
        }
    }
}
