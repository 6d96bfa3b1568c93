//! HTTP surface for the cached artifacts and Prometheus metrics.
//!
//! - `GET /metrics`
//! - `GET /config/client.yaml`
//! - `GET /config/traffic-manager.yaml`
//!
//! Artifact routes answer 404 while the slot is absent. They only call the
//! [`Watcher`] accessors, so a request never waits on more than one refresh.

#[cfg(test)]
mod server_test;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::info;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

use crate::metrics::encode_metrics;
use crate::Error;
use crate::Result;
use crate::Watcher;

const YAML_CONTENT_TYPE: &str = "application/yaml";

pub fn routes(
    watcher: Arc<dyn Watcher>
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let metrics = warp::path!("metrics").and(warp::get()).map(encode_metrics);

    let client = warp::path!("config" / "client.yaml")
        .and(warp::get())
        .and(with_watcher(watcher.clone()))
        .map(|watcher: Arc<dyn Watcher>| artifact_reply(watcher.client_config_yaml()));

    let traffic_manager = warp::path!("config" / "traffic-manager.yaml")
        .and(warp::get())
        .and(with_watcher(watcher))
        .map(|watcher: Arc<dyn Watcher>| artifact_reply(watcher.traffic_manager_config_yaml()));

    metrics.or(client).or(traffic_manager)
}

fn with_watcher(
    watcher: Arc<dyn Watcher>
) -> impl Filter<Extract = (Arc<dyn Watcher>,), Error = Infallible> + Clone {
    warp::any().map(move || watcher.clone())
}

fn artifact_reply(artifact: Option<Bytes>) -> Response {
    match artifact {
        Some(yaml) => warp::reply::with_header(yaml.to_vec(), "content-type", YAML_CONTENT_TYPE)
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serves [`routes`] on `listen_addr` until `shutdown` is cancelled.
pub async fn start_server(
    listen_addr: SocketAddr,
    watcher: Arc<dyn Watcher>,
    shutdown: CancellationToken,
) -> Result<()> {
    let (addr, server) = warp::serve(routes(watcher))
        .try_bind_with_graceful_shutdown(listen_addr, async move {
            shutdown.cancelled().await;
        })
        .map_err(|e| Error::Server(format!("failed to bind {}: {}", listen_addr, e)))?;

    info!("HTTP server listening on {}", addr);
    server.await;
    info!("HTTP server stopped");
    Ok(())
}
