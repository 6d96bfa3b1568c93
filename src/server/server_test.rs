use std::sync::Arc;

use bytes::Bytes;
use warp::http::StatusCode;

use super::*;
use crate::MockWatcher;

fn mock_watcher(
    client: Option<&'static str>,
    traffic_manager: Option<&'static str>,
) -> Arc<dyn Watcher> {
    let mut watcher = MockWatcher::new();
    watcher
        .expect_client_config_yaml()
        .returning(move || client.map(|s| Bytes::from_static(s.as_bytes())));
    watcher
        .expect_traffic_manager_config_yaml()
        .returning(move || traffic_manager.map(|s| Bytes::from_static(s.as_bytes())));
    Arc::new(watcher)
}

#[tokio::test]
async fn client_route_should_return_cached_yaml() {
    let filter = routes(mock_watcher(Some("a: 1"), None));

    let res = warp::test::request()
        .method("GET")
        .path("/config/client.yaml")
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"a: 1");
    assert_eq!(
        res.headers().get("content-type").map(|v| v.as_bytes()),
        Some(YAML_CONTENT_TYPE.as_bytes())
    );
}

#[tokio::test]
async fn traffic_manager_route_should_return_cached_yaml() {
    let filter = routes(mock_watcher(None, Some("b: 2")));

    let res = warp::test::request()
        .method("GET")
        .path("/config/traffic-manager.yaml")
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"b: 2");
}

#[tokio::test]
async fn absent_artifact_should_return_not_found() {
    let filter = routes(mock_watcher(None, None));

    for path in ["/config/client.yaml", "/config/traffic-manager.yaml"] {
        let res = warp::test::request()
            .method("GET")
            .path(path)
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "path {path}");
    }
}

#[tokio::test]
async fn metrics_route_should_expose_registry() {
    crate::WATCH_OPENED_METRIC.inc();
    let filter = routes(mock_watcher(None, None));

    let res = warp::test::request()
        .method("GET")
        .path("/metrics")
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = String::from_utf8_lossy(res.body());
    assert!(body.contains("config_map_watch_opened_total"));
}

#[tokio::test]
async fn start_server_should_stop_on_cancellation() {
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(start_server(
        ([127, 0, 0, 1], 0).into(),
        mock_watcher(None, None),
        shutdown.clone(),
    ));

    shutdown.cancel();
    let result = tokio::time::timeout(std::time::Duration::from_secs(2), handle)
        .await
        .expect("server should stop after cancellation")
        .expect("server task should not panic");

    assert!(result.is_ok());
}
