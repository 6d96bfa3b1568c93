use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogConfig {
    /// Write to `<log_dir>/watcher.log` instead of stdout
    #[serde(default)]
    pub log_to_file: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// `EnvFilter` directive used when `RUST_LOG` is not set
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_to_file: false,
            log_dir: default_log_dir(),
            filter: default_filter(),
        }
    }
}

impl LogConfig {
    pub fn validate(&self) -> Result<()> {
        if self.filter.trim().is_empty() {
            return Err(Error::InvalidConfig("log filter cannot be empty".into()));
        }
        if self.log_to_file && self.log_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "log_dir is required when log_to_file is enabled".into(),
            ));
        }
        Ok(())
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_filter() -> String {
    "info".to_string()
}
