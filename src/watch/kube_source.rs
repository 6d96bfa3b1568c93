use std::io;

use async_trait::async_trait;
use futures::AsyncBufReadExt;
use futures::Stream;
use futures::StreamExt;
use futures::TryStreamExt;
use http_body_util::BodyExt;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::WatchEvent;
use kube::api::WatchParams;
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::core::Request;
use kube::Client;
use kube::Resource;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::warn;

use super::ChangeEvent;
use super::ConfigMapSnapshot;
use super::ConfigMapSource;
use super::EventStream;
use crate::Result;
use crate::WatchError;

/// Watches ConfigMaps through the Kubernetes API server.
///
/// Each call to [`ConfigMapSource::watch`] issues one streaming GET. The API
/// server closes these connections periodically, at which point the returned
/// channel closes too.
#[derive(Clone)]
pub struct KubeConfigMapSource {
    client: Client,
    buffer_size: usize,
}

impl KubeConfigMapSource {
    pub fn new(
        client: Client,
        buffer_size: usize,
    ) -> Self {
        Self {
            client,
            buffer_size,
        }
    }

    /// Builds a client from the in-cluster environment or the local kubeconfig.
    pub async fn try_default(buffer_size: usize) -> Result<Self> {
        let client = Client::try_default().await.map_err(WatchError::Client)?;
        Ok(Self::new(client, buffer_size))
    }
}

#[async_trait]
impl ConfigMapSource for KubeConfigMapSource {
    /// Returns once the API server has answered the watch request.
    ///
    /// A non-2xx answer (RBAC denial, missing namespace, server error) is an
    /// open failure, not an empty stream.
    async fn watch(
        &self,
        namespace: &str,
        name: &str,
    ) -> std::result::Result<EventStream, WatchError> {
        let target = format!("{namespace}/{name}");
        let params = WatchParams::default().fields(&format!("metadata.name={name}"));
        let request = Request::new(ConfigMap::url_path(&(), Some(namespace)))
            .watch(&params, "0")
            .map_err(kube::Error::BuildRequest)?;

        let response = self.client.send(request.map(Body::from)).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.into_body().collect().await?.to_bytes();
            return Err(rejection(status.as_u16(), &body));
        }

        let lines = response
            .into_body()
            .into_data_stream()
            .map_err(io::Error::other)
            .into_async_read()
            .lines();

        let (event_tx, event_rx) = mpsc::channel(self.buffer_size);
        tokio::spawn(forward_events(target, lines, event_tx));
        Ok(event_rx)
    }
}

/// Decodes one JSON watch event per line into `event_tx`.
///
/// Stops on stream end, on the first undecodable line, or as soon as the
/// receiver is dropped, so the connection never outlives its subscriber.
async fn forward_events<S>(
    target: String,
    mut lines: S,
    event_tx: mpsc::Sender<ChangeEvent>,
) where
    S: Stream<Item = io::Result<String>> + Send + Unpin,
{
    loop {
        let line = tokio::select! {
            biased;
            _ = event_tx.closed() => {
                debug!("receiver for {} dropped, release watch connection", target);
                return;
            }
            line = lines.next() => line,
        };

        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                warn!("watch on {} failed: {}", target, e);
                break;
            }
            None => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = match decode_event(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!("watch on {} failed: {}", target, e);
                break;
            }
        };
        if event_tx.send(event).await.is_err() {
            debug!("receiver for {} dropped, stop forwarding", target);
            return;
        }
    }
    debug!("watch stream for {} ended", target);
}

pub(crate) fn decode_event(line: &str) -> std::result::Result<ChangeEvent, WatchError> {
    match serde_json::from_str::<WatchEvent<ConfigMap>>(line) {
        Ok(event) => Ok(event.into()),
        // A bare Status object replaces the event stream when the server
        // gives up on the watch mid-flight.
        Err(e) => match serde_json::from_str::<ErrorResponse>(line) {
            Ok(status) => Err(WatchError::Client(kube::Error::Api(status))),
            Err(_) => Err(WatchError::Decode(e)),
        },
    }
}

fn rejection(
    status: u16,
    body: &[u8],
) -> WatchError {
    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(response) => WatchError::Client(kube::Error::Api(response)),
        Err(_) => WatchError::Rejected(format!(
            "HTTP {}: {}",
            status,
            String::from_utf8_lossy(body).trim()
        )),
    }
}

impl From<ConfigMap> for ConfigMapSnapshot {
    fn from(config_map: ConfigMap) -> Self {
        ConfigMapSnapshot {
            name: config_map.metadata.name.unwrap_or_default(),
            data: config_map.data.unwrap_or_default(),
        }
    }
}

impl From<WatchEvent<ConfigMap>> for ChangeEvent {
    fn from(event: WatchEvent<ConfigMap>) -> Self {
        match event {
            WatchEvent::Added(m) => ChangeEvent::Added(Some(m.into())),
            WatchEvent::Modified(m) => ChangeEvent::Modified(Some(m.into())),
            WatchEvent::Deleted(m) => ChangeEvent::Deleted(Some(m.into())),
            // Bookmarks and server-side error statuses carry no ConfigMap
            _ => ChangeEvent::Other,
        }
    }
}
