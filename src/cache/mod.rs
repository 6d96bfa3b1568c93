//! In-memory store of the cached ConfigMap documents.
//!
//! Two artifact slots live behind a single reader/writer lock. A refresh
//! replaces both slots in one write so a reader never sees one slot from an
//! older event and the other from a newer one.

#[cfg(test)]
mod cache_test;

use std::collections::BTreeMap;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::debug;

use crate::CLIENT_CONFIG_FILE_NAME;
use crate::TRAFFIC_MANAGER_CONFIG_FILE_NAME;

/// Point-in-time view of both artifact slots. `None` means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub client: Option<Bytes>,
    pub traffic_manager: Option<Bytes>,
}

impl Artifacts {
    /// Extracts both documents from a ConfigMap data map. A missing map or a
    /// missing key leaves the slot absent. Content is not validated.
    pub fn from_data(data: Option<&BTreeMap<String, String>>) -> Self {
        let lookup = |key: &str| {
            data.and_then(|d| d.get(key))
                .map(|yml| Bytes::from(yml.clone()))
        };
        Artifacts {
            client: lookup(CLIENT_CONFIG_FILE_NAME),
            traffic_manager: lookup(TRAFFIC_MANAGER_CONFIG_FILE_NAME),
        }
    }
}

#[derive(Debug, Default)]
pub struct ConfigCache {
    artifacts: RwLock<Artifacts>,
}

impl ConfigCache {
    /// Both slots start absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces both slots from `data`. `None` is used for deletions and
    /// clears everything.
    pub fn refresh(
        &self,
        data: Option<&BTreeMap<String, String>>,
    ) {
        let next = Artifacts::from_data(data);
        log_refresh("client", next.client.as_ref());
        log_refresh("traffic-manager", next.traffic_manager.as_ref());

        *self.artifacts.write() = next;
    }

    pub fn client_config_yaml(&self) -> Option<Bytes> {
        self.artifacts.read().client.clone()
    }

    pub fn traffic_manager_config_yaml(&self) -> Option<Bytes> {
        self.artifacts.read().traffic_manager.clone()
    }

    /// Both slots read under one shared lock.
    pub fn snapshot(&self) -> Artifacts {
        self.artifacts.read().clone()
    }
}

fn log_refresh(
    artifact: &str,
    content: Option<&Bytes>,
) {
    match content {
        Some(yml) => debug!(
            "Refreshed {} config: {}",
            artifact,
            String::from_utf8_lossy(yml)
        ),
        None => debug!("Cleared {} config", artifact),
    }
}
