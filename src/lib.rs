//! Keeps the traffic-manager ConfigMap documents cached in memory.
//!
//! [`ConfigWatcher`] opens a Kubernetes watch on the single `traffic-manager`
//! ConfigMap, applies every change event to a [`ConfigCache`], and reopens the
//! watch whenever the API server closes the stream. Readers fetch the current
//! `client.yaml` and `traffic-manager.yaml` at any time from any task.
//!
//! ```ignore
//! let source = KubeConfigMapSource::try_default(64).await?;
//! let watcher = Arc::new(ConfigWatcher::new("ambassador", source));
//! let shutdown = CancellationToken::new();
//!
//! tokio::spawn({
//!     let watcher = watcher.clone();
//!     let shutdown = shutdown.clone();
//!     async move { watcher.run(shutdown).await }
//! });
//!
//! let client_yaml: Option<Bytes> = watcher.client_config_yaml();
//! ```

mod cache;
mod config;
mod constants;
mod errors;
mod metrics;
mod server;
mod watch;
mod watcher;

pub use cache::*;
pub use config::*;
pub use constants::*;
pub use errors::*;
pub use metrics::*;
pub use server::*;
pub use watch::*;
pub use watcher::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
