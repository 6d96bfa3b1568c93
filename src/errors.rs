//! Error hierarchy for the ConfigMap watcher.
//!
//! Only [`Error::WatchOpen`] ends a running watch loop. Stream closure and
//! malformed events are absorbed by the loop and never surface here.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration source could not be read or deserialized
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration loaded but failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Transport failures outside the watch loop (e.g. building the client)
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// Opening a watch subscription failed. Fatal and never retried.
    #[error("unable to create configmap watcher for {namespace}/{name}: {source}")]
    WatchOpen {
        namespace: String,
        name: String,
        #[source]
        source: WatchError,
    },

    /// HTTP server could not be started
    #[error("Server error: {0}")]
    Server(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised by a [`crate::ConfigMapSource`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Kubernetes client or API failure
    #[error(transparent)]
    Client(#[from] kube::Error),

    /// The transport refused to open the subscription
    #[error("watch rejected: {0}")]
    Rejected(String),

    /// A line of the watch stream was neither an event nor a Status object
    #[error("malformed watch event: {0}")]
    Decode(#[from] serde_json::Error),
}
