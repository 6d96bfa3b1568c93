use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGaugeVec;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;
use tracing::error;

#[cfg(test)]
mod metrics_test;

lazy_static! {
    pub static ref CONFIG_MAP_EVENTS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("config_map_events_total", "ConfigMap watch events received, by kind"),
        &["kind"]
    )
    .expect("Should succeed to create metric");

    pub static ref WATCH_OPENED_METRIC: IntCounter = IntCounter::new(
        "config_map_watch_opened_total",
        "ConfigMap watch subscriptions opened, including reconnects"
    )
    .expect("Should succeed to create metric");

    pub static ref ARTIFACT_SIZE_METRIC: IntGaugeVec = IntGaugeVec::new(
        Opts::new("config_artifact_size_bytes", "Size of each cached artifact, 0 when absent"),
        &["artifact"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        register_custom_metrics(&registry);
        registry
    };
}

pub(crate) fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(CONFIG_MAP_EVENTS_METRIC.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCH_OPENED_METRIC.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(ARTIFACT_SIZE_METRIC.clone()))
        .expect("collector can be registered");
}

/// Renders [`REGISTRY`] in the Prometheus text format.
pub fn encode_metrics() -> String {
    encode_registry(&REGISTRY)
}

pub(crate) fn encode_registry(registry: &Registry) -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    };
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
