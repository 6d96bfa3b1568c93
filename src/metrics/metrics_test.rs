use super::*;

fn create_test_registry() -> Registry {
    let registry = Registry::new_custom(Some("tm".to_string()), None).unwrap();
    register_custom_metrics(&registry);
    registry
}

#[test]
fn test_custom_registry() {
    let registry = create_test_registry();

    CONFIG_MAP_EVENTS_METRIC.with_label_values(&["ADDED"]).inc();
    ARTIFACT_SIZE_METRIC.with_label_values(&["client"]).set(4);
    let metrics = &registry.gather();
    assert!(!metrics.is_empty());

    let metric_names: Vec<_> = metrics.iter().map(|m| m.get_name()).collect();
    assert!(
        metric_names.contains(&"tm_config_map_events_total"),
        "Missing tm_config_map_events_total"
    );
    assert!(
        metric_names.contains(&"tm_config_artifact_size_bytes"),
        "Missing tm_config_artifact_size_bytes"
    );
}

#[test]
fn test_counter_increment() {
    let before = CONFIG_MAP_EVENTS_METRIC.with_label_values(&["BOOKMARK_TEST"]).get();

    CONFIG_MAP_EVENTS_METRIC.with_label_values(&["BOOKMARK_TEST"]).inc();
    CONFIG_MAP_EVENTS_METRIC.with_label_values(&["BOOKMARK_TEST"]).inc();

    let value = CONFIG_MAP_EVENTS_METRIC.with_label_values(&["BOOKMARK_TEST"]).get();
    assert_eq!(value, before + 2, "Counter should increment correctly");
}

#[test]
fn test_encode_metrics_uses_text_format() {
    WATCH_OPENED_METRIC.inc();

    let body = encode_metrics();

    assert!(body.contains("# TYPE config_map_watch_opened_total counter"));
}
