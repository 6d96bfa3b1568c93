use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_EVENT_BUFFER_SIZE;
use crate::constants::DEFAULT_NAMESPACE;
use crate::Error;
use crate::Result;

/// Longest valid RFC 1123 label, which is what Kubernetes allows for namespaces
const MAX_NAMESPACE_LEN: usize = 63;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatcherConfig {
    /// Namespace holding the traffic-manager ConfigMap
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Capacity of the channel between the API stream and the watch loop
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            event_buffer_size: default_event_buffer_size(),
        }
    }
}

impl WatcherConfig {
    /// # Errors
    /// Returns `Error::InvalidConfig` when the namespace is not a valid
    /// RFC 1123 label or the buffer size is 0.
    pub fn validate(&self) -> Result<()> {
        validate_namespace(&self.namespace)?;

        if self.event_buffer_size == 0 {
            return Err(Error::InvalidConfig("event_buffer_size must be greater than 0".into()));
        }
        Ok(())
    }
}

pub(crate) fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(Error::InvalidConfig("namespace cannot be empty".into()));
    }
    if namespace.len() > MAX_NAMESPACE_LEN {
        return Err(Error::InvalidConfig(format!(
            "namespace {} is longer than {} characters",
            namespace, MAX_NAMESPACE_LEN
        )));
    }

    let valid_chars = namespace
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    let alnum_edges = namespace
        .bytes()
        .next()
        .zip(namespace.bytes().last())
        .map(|(first, last)| first != b'-' && last != b'-')
        .unwrap_or(false);
    if !valid_chars || !alnum_edges {
        return Err(Error::InvalidConfig(format!(
            "namespace {} must consist of lower case alphanumeric characters or '-', and start and end with an alphanumeric character",
            namespace
        )));
    }
    Ok(())
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}
