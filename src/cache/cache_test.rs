use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use super::*;
use crate::test_utils::data_map;

#[test]
fn new_cache_should_start_with_both_slots_absent() {
    let cache = ConfigCache::new();

    assert_eq!(cache.client_config_yaml(), None);
    assert_eq!(cache.traffic_manager_config_yaml(), None);
    assert_eq!(cache.snapshot(), Artifacts::default());
}

#[test]
fn refresh_should_store_both_documents() {
    let cache = ConfigCache::new();
    let data = data_map(&[
        (CLIENT_CONFIG_FILE_NAME, "a: 1"),
        (TRAFFIC_MANAGER_CONFIG_FILE_NAME, "b: 2"),
    ]);

    cache.refresh(Some(&data));

    assert_eq!(cache.client_config_yaml(), Some(Bytes::from("a: 1")));
    assert_eq!(
        cache.traffic_manager_config_yaml(),
        Some(Bytes::from("b: 2"))
    );
}

#[test]
fn refresh_should_clear_slot_when_key_is_missing() {
    let cache = ConfigCache::new();
    cache.refresh(Some(&data_map(&[
        (CLIENT_CONFIG_FILE_NAME, "a: 1"),
        (TRAFFIC_MANAGER_CONFIG_FILE_NAME, "b: 2"),
    ])));

    cache.refresh(Some(&data_map(&[(TRAFFIC_MANAGER_CONFIG_FILE_NAME, "b: 3")])));

    assert_eq!(cache.client_config_yaml(), None);
    assert_eq!(
        cache.traffic_manager_config_yaml(),
        Some(Bytes::from("b: 3"))
    );
}

#[test]
fn refresh_with_no_data_should_clear_everything() {
    let cache = ConfigCache::new();
    cache.refresh(Some(&data_map(&[
        (CLIENT_CONFIG_FILE_NAME, "a: 1"),
        (TRAFFIC_MANAGER_CONFIG_FILE_NAME, "b: 2"),
    ])));

    cache.refresh(None);

    assert_eq!(cache.snapshot(), Artifacts::default());
}

#[test]
fn refresh_should_ignore_unrelated_keys_and_keep_content_verbatim() {
    let cache = ConfigCache::new();
    cache.refresh(Some(&data_map(&[
        ("agent.yaml", "x: y"),
        (CLIENT_CONFIG_FILE_NAME, "{{ not: [yaml"),
    ])));

    assert_eq!(
        cache.client_config_yaml(),
        Some(Bytes::from("{{ not: [yaml"))
    );
    assert_eq!(cache.traffic_manager_config_yaml(), None);
}

#[test]
fn empty_document_should_be_present_not_absent() {
    let cache = ConfigCache::new();
    cache.refresh(Some(&data_map(&[(CLIENT_CONFIG_FILE_NAME, "")])));

    assert_eq!(cache.client_config_yaml(), Some(Bytes::new()));
}

#[test]
fn concurrent_readers_should_never_observe_a_torn_refresh() {
    let cache = Arc::new(ConfigCache::new());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            let done = done.clone();
            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let artifacts = cache.snapshot();
                    assert_eq!(artifacts.client, artifacts.traffic_manager);
                }
            })
        })
        .collect();

    for i in 0..2000 {
        let value = format!("generation: {i}");
        if i % 7 == 0 {
            cache.refresh(None);
        } else {
            cache.refresh(Some(&data_map(&[
                (CLIENT_CONFIG_FILE_NAME, value.as_str()),
                (TRAFFIC_MANAGER_CONFIG_FILE_NAME, value.as_str()),
            ])));
        }
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        reader.join().expect("reader panicked");
    }
}
