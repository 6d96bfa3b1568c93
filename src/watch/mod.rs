//! Transport boundary for ConfigMap watch subscriptions.
//!
//! A [`ConfigMapSource`] opens one subscription scoped to a single named
//! ConfigMap and hands back an [`EventStream`]. The stream closes (rather than
//! blocking forever) when the underlying connection drops; the watch loop
//! treats that as "reconnect needed".
//!
//! Raw transport events are decided into the closed [`ChangeEvent`] sum type
//! once, at this boundary. A payload that is not a ConfigMap is carried as
//! `None` so the consumer can drop it without inspecting anything else.

mod kube_source;
pub use kube_source::*;


use std::collections::BTreeMap;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

use crate::WatchError;

/// Receive side of one watch subscription
pub type EventStream = mpsc::Receiver<ChangeEvent>;

/// The parts of a ConfigMap the cache cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMapSnapshot {
    pub name: String,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Added(Option<ConfigMapSnapshot>),
    Modified(Option<ConfigMapSnapshot>),
    Deleted(Option<ConfigMapSnapshot>),
    Other,
}

impl ChangeEvent {
    /// Label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Added(_) => "ADDED",
            ChangeEvent::Modified(_) => "MODIFIED",
            ChangeEvent::Deleted(_) => "DELETED",
            ChangeEvent::Other => "OTHER",
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConfigMapSource: Send + Sync + 'static {
    /// Opens a watch on the ConfigMap `name` in `namespace`.
    ///
    /// # Errors
    /// Any error means the subscription could not be established. Callers
    /// treat it as fatal.
    async fn watch(
        &self,
        namespace: &str,
        name: &str,
    ) -> std::result::Result<EventStream, WatchError>;
}
