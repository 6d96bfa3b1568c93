//! Helpers shared by the unit tests in this crate.

use std::collections::BTreeMap;

use tokio::sync::mpsc;

use crate::ChangeEvent;
use crate::ConfigMapSnapshot;
use crate::EventStream;
use crate::CONFIG_MAP_NAME;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

pub(crate) fn data_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub(crate) fn snapshot(entries: &[(&str, &str)]) -> ConfigMapSnapshot {
    ConfigMapSnapshot {
        name: CONFIG_MAP_NAME.to_string(),
        data: data_map(entries),
    }
}

/// Stream that yields `events` in order and then reports closed.
pub(crate) fn closed_stream(events: Vec<ChangeEvent>) -> EventStream {
    let (tx, rx) = mpsc::channel(events.len().max(1));
    for event in events {
        tx.try_send(event).expect("buffer sized to fit all events");
    }
    rx
}

/// Stream that stays open for as long as the returned sender is alive.
pub(crate) fn open_stream() -> (mpsc::Sender<ChangeEvent>, EventStream) {
    mpsc::channel(16)
}
