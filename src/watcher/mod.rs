//! Watch loop that keeps [`ConfigCache`] in step with the traffic-manager
//! ConfigMap.
//!
//! The Kubernetes API server does not keep a watch open forever, so every time
//! the event stream closes a fresh subscription is opened. This continues until
//! the shutdown token is cancelled. There is no backoff: reconnects are
//! immediate.
//!
//! ```text
//!            open ok                       stream closed
//! Reconnecting ──────▶ Listening(events) ─────────────────▶ Reconnecting
//!      │                     │
//!      │ cancelled           │ cancelled
//!      ▼                     ▼
//!   Stopped ◀────────────────┘
//!
//! open failed ──▶ Err(Error::WatchOpen)
//! ```


use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;

use crate::ChangeEvent;
use crate::ConfigCache;
use crate::ConfigMapSource;
use crate::Error;
use crate::EventStream;
use crate::Result;
use crate::ARTIFACT_SIZE_METRIC;
use crate::CONFIG_MAP_EVENTS_METRIC;
use crate::CONFIG_MAP_NAME;
use crate::WATCH_OPENED_METRIC;

/// Public contract of the ConfigMap watcher.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Watcher: Send + Sync + 'static {
    /// Runs until `shutdown` is cancelled (`Ok`) or a subscription cannot be
    /// opened (`Err`).
    async fn run(
        &self,
        shutdown: CancellationToken,
    ) -> Result<()>;

    /// Current `client.yaml`, or `None` if never set or last cleared
    fn client_config_yaml(&self) -> Option<Bytes>;

    /// Current `traffic-manager.yaml`, or `None` if never set or last cleared
    fn traffic_manager_config_yaml(&self) -> Option<Bytes>;
}

/// Why [`ConfigWatcher::handle_events`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandlerExit {
    /// Shutdown requested; do not reconnect
    Shutdown,
    /// Stream closed; reconnect
    StreamClosed,
}

enum WatchState {
    Reconnecting,
    Listening(EventStream),
    Stopped,
}

pub struct ConfigWatcher<S>
where
    S: ConfigMapSource,
{
    namespace: String,
    source: S,
    cache: ConfigCache,
}

impl<S> ConfigWatcher<S>
where
    S: ConfigMapSource,
{
    pub fn new(
        namespace: impl Into<String>,
        source: S,
    ) -> Self {
        ConfigWatcher {
            namespace: namespace.into(),
            source,
            cache: ConfigCache::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn watch_loop(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<()> {
        let mut state = WatchState::Reconnecting;
        loop {
            state = match state {
                WatchState::Reconnecting => {
                    if shutdown.is_cancelled() {
                        WatchState::Stopped
                    } else {
                        self.open(shutdown).await?
                    }
                }
                WatchState::Listening(events) => match self.handle_events(shutdown, events).await {
                    HandlerExit::Shutdown => WatchState::Stopped,
                    HandlerExit::StreamClosed => {
                        info!("Watch on ConfigMap {} closed, restarting", CONFIG_MAP_NAME);
                        WatchState::Reconnecting
                    }
                },
                WatchState::Stopped => return Ok(()),
            };
        }
    }

    /// Opens one subscription. Cancellation during the open wins and stops the
    /// loop cleanly.
    async fn open(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<WatchState> {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => Ok(WatchState::Stopped),
            opened = self.source.watch(&self.namespace, CONFIG_MAP_NAME) => match opened {
                Ok(events) => {
                    WATCH_OPENED_METRIC.inc();
                    debug!("Opened watch on ConfigMap {}/{}", self.namespace, CONFIG_MAP_NAME);
                    Ok(WatchState::Listening(events))
                }
                Err(e) => {
                    error!("unable to create configmap watcher: {}", e);
                    Err(Error::WatchOpen {
                        namespace: self.namespace.clone(),
                        name: CONFIG_MAP_NAME.to_string(),
                        source: e,
                    })
                }
            }
        }
    }

    /// Applies events from one subscription in arrival order until the stream
    /// closes or shutdown is requested. Shutdown takes priority over a pending
    /// event.
    pub(crate) async fn handle_events(
        &self,
        shutdown: &CancellationToken,
        mut events: EventStream,
    ) -> HandlerExit {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return HandlerExit::Shutdown,
                event = events.recv() => match event {
                    Some(event) => self.apply(event),
                    None => return HandlerExit::StreamClosed,
                }
            }
        }
    }

    /// Events of an unexpected kind or without a ConfigMap payload are dropped.
    fn apply(
        &self,
        event: ChangeEvent,
    ) {
        let kind = event.kind();
        CONFIG_MAP_EVENTS_METRIC.with_label_values(&[kind]).inc();

        match event {
            ChangeEvent::Deleted(Some(config_map)) => {
                debug!("{} {}", kind, config_map.name);
                self.cache.refresh(None);
            }
            ChangeEvent::Added(Some(config_map)) | ChangeEvent::Modified(Some(config_map)) => {
                debug!("{} {}", kind, config_map.name);
                self.cache.refresh(Some(&config_map.data));
            }
            _ => {
                trace!("ignoring {} event", kind);
                return;
            }
        }
        self.record_artifact_sizes();
    }

    fn record_artifact_sizes(&self) {
        let artifacts = self.cache.snapshot();
        let size = |slot: &Option<Bytes>| slot.as_ref().map_or(0, |b| b.len() as i64);
        ARTIFACT_SIZE_METRIC
            .with_label_values(&["client"])
            .set(size(&artifacts.client));
        ARTIFACT_SIZE_METRIC
            .with_label_values(&["traffic-manager"])
            .set(size(&artifacts.traffic_manager));
    }
}

#[async_trait]
impl<S> Watcher for ConfigWatcher<S>
where
    S: ConfigMapSource,
{
    async fn run(
        &self,
        shutdown: CancellationToken,
    ) -> Result<()> {
        info!("Started watcher for ConfigMap {}", CONFIG_MAP_NAME);
        let result = self.watch_loop(&shutdown).await;
        info!("Ended watcher for ConfigMap {}", CONFIG_MAP_NAME);
        result
    }

    fn client_config_yaml(&self) -> Option<Bytes> {
        self.cache.client_config_yaml()
    }

    fn traffic_manager_config_yaml(&self) -> Option<Bytes> {
        self.cache.traffic_manager_config_yaml()
    }
}
