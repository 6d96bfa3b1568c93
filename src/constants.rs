// -
// Watched resource

/// Name of the single ConfigMap this crate watches
pub const CONFIG_MAP_NAME: &str = "traffic-manager";

/// ConfigMap data keys, one per cached artifact
pub const CLIENT_CONFIG_FILE_NAME: &str = "client.yaml";
pub const TRAFFIC_MANAGER_CONFIG_FILE_NAME: &str = "traffic-manager.yaml";

// -
// Defaults

pub(crate) const DEFAULT_NAMESPACE: &str = "ambassador";
pub(crate) const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

/// Log file written when `log.log_to_file` is enabled
pub const LOG_FILE_NAME: &str = "watcher.log";
