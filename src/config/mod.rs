//! Configuration for the watcher binary.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`TM__SECTION__FIELD`)
//! - Component-wise validation
//!
//! The library types never read these settings themselves. The binary turns
//! them into constructor arguments.
mod http_server;
mod log;
mod watcher;
pub use http_server::*;
pub use log::*;
pub use watcher::*;


use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

const ENV_PREFIX: &str = "TM";

/// Main configuration container
///
/// Sources are merged in order (later overrides earlier):
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Watched namespace and event channel sizing
    #[serde(default)]
    pub watcher: WatcherConfig,
    /// HTTP endpoint for metrics and cached artifacts
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Log destination and filter
    #[serde(default)]
    pub log: LogConfig,
}

impl Settings {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// # Note
    /// Validation is deferred so callers can still apply
    /// [`Settings::with_override_config`]. Call [`Settings::validate`] before
    /// use.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("TM__WATCHER__NAMESPACE", "ambassador");
    /// let settings = Settings::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let settings: Self = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Applies additional overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.watcher.validate()?;
        self.http.validate()?;
        self.log.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
