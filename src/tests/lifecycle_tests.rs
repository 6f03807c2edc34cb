//! Tests for subscription and teardown
//!
//! These tests drive the reconciler through a real in-process event bus:
//! raw JSON payloads in, published snapshots out.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_test::{assert_err, assert_ok};

use super::test_backend::{reconciler_with, FakeBackend};
use crate::backend::bus::LocalEventBus;
use crate::backend::events::{
    Notification, CHANNELS, MODEL_DOWNLOAD_COMPLETE, MODEL_DOWNLOAD_PROGRESS,
    MODEL_EXTRACTION_STARTED, MODEL_STATE_CHANGED,
};
use crate::error::StatusError;
use crate::status::{LocalState, StatusSnapshot, TranscriptionState};

const WAIT: Duration = Duration::from_secs(2);

async fn wait_for_snapshot<F>(rx: &mut tokio::sync::watch::Receiver<StatusSnapshot>, predicate: F)
where
    F: FnMut(&StatusSnapshot) -> bool,
{
    let result = timeout(WAIT, rx.wait_for(predicate)).await;
    assert!(result.is_ok(), "timed out waiting for snapshot");
    assert_ok!(result.unwrap().map(|_| ()));
}

/// Test that bus payloads flow through the queue into the snapshot
#[tokio::test]
async fn test_bus_notifications_reach_snapshot() {
    let backend = Arc::new(FakeBackend::with_default_models());
    backend.set_recording(true);
    let reconciler = reconciler_with(backend.clone());
    reconciler.initialize().await;

    let bus = Arc::new(LocalEventBus::new());
    assert_ok!(reconciler.subscribe(bus.clone()));
    assert!(reconciler.is_subscribed());
    for channel in CHANNELS {
        assert_eq!(bus.listener_count(channel), 1);
    }

    let mut rx = reconciler.watch();
    bus.emit(
        MODEL_DOWNLOAD_PROGRESS,
        &json!({"model_id": "small.en", "downloaded": 1024, "total": 4096, "percentage": 25.0}),
    );
    wait_for_snapshot(&mut rx, |s| s.display == "Downloading 25%").await;

    bus.emit(MODEL_DOWNLOAD_COMPLETE, &"small.en");
    wait_for_snapshot(&mut rx, |s| !s.is_downloading("small.en")).await;

    bus.emit(MODEL_EXTRACTION_STARTED, &"base.en");
    wait_for_snapshot(&mut rx, |s| s.is_extracting("base.en")).await;
    assert_eq!(reconciler.snapshot().display, "Extracting Base (English)...");

    reconciler.settle().await;
    assert_eq!(backend.call_count("set_active_model"), 0);
}

/// Test that notifications are applied in arrival order
#[tokio::test]
async fn test_notifications_apply_in_order() {
    let backend = Arc::new(FakeBackend::with_default_models());
    let reconciler = reconciler_with(backend);
    let bus = Arc::new(LocalEventBus::new());
    assert_ok!(reconciler.subscribe(bus.clone()));

    let mut rx = reconciler.watch();
    bus.emit(MODEL_STATE_CHANGED, &json!({"event_type": "loading_started"}));
    bus.emit(
        MODEL_STATE_CHANGED,
        &json!({"event_type": "loading_completed", "model_id": "large-v3-turbo"}),
    );
    bus.emit(MODEL_STATE_CHANGED, &json!({"event_type": "unloaded"}));

    wait_for_snapshot(&mut rx, |s| {
        s.state == TranscriptionState::Local(LocalState::Unloaded)
            && s.current_model_id.as_deref() == Some("large-v3-turbo")
    })
    .await;
}

/// Test that malformed payloads are dropped without stopping the queue
#[tokio::test]
async fn test_malformed_payload_is_dropped() {
    let backend = Arc::new(FakeBackend::with_default_models());
    let reconciler = reconciler_with(backend);
    let bus = Arc::new(LocalEventBus::new());
    assert_ok!(reconciler.subscribe(bus.clone()));

    let mut rx = reconciler.watch();
    bus.emit_raw(MODEL_DOWNLOAD_PROGRESS, "{not json");
    bus.emit(MODEL_STATE_CHANGED, &json!({"event_type": "loading_started"}));

    wait_for_snapshot(&mut rx, |s| {
        s.state == TranscriptionState::Local(LocalState::Loading)
    })
    .await;
    assert!(reconciler.snapshot().download_progress.is_empty());
}

/// Test that subscribing twice keeps a single registration
#[tokio::test]
async fn test_subscribe_twice_is_ignored() {
    let backend = Arc::new(FakeBackend::new());
    let reconciler = reconciler_with(backend);
    let bus = Arc::new(LocalEventBus::new());

    assert_ok!(reconciler.subscribe(bus.clone()));
    assert_ok!(reconciler.subscribe(bus.clone()));
    assert_eq!(bus.listener_count(MODEL_STATE_CHANGED), 1);
}

/// Test that teardown unregisters everything and is idempotent
#[tokio::test]
async fn test_teardown_is_idempotent_and_final() {
    let backend = Arc::new(FakeBackend::with_default_models());
    backend.set_current_model(Ok(Some("base.en")));
    backend.set_loaded_model(Some("base.en"));
    let reconciler = reconciler_with(backend.clone());
    reconciler.initialize().await;

    let bus = Arc::new(LocalEventBus::new());
    assert_ok!(reconciler.subscribe(bus.clone()));

    reconciler.teardown();
    reconciler.teardown();

    assert!(!reconciler.is_alive());
    assert!(!reconciler.is_subscribed());
    for channel in CHANNELS {
        assert_eq!(bus.listener_count(channel), 0);
    }
    assert_eq!(bus.emit(MODEL_STATE_CHANGED, &json!({"event_type": "unloaded"})), 0);

    // Late notifications and commands are ignored
    reconciler
        .handle_notification(Notification::LoadingFailed {
            error: Some("late".to_string()),
        })
        .await;
    assert_eq!(
        reconciler.state().await,
        TranscriptionState::Local(LocalState::Ready)
    );

    let result = reconciler.select_model("large-v3-turbo").await;
    assert!(matches!(result, Err(StatusError::TornDown)));
    assert_eq!(backend.call_count("set_active_model"), 0);

    assert_err!(reconciler.subscribe(bus.clone()));
}

/// Test that teardown before any subscription is safe
#[tokio::test]
async fn test_teardown_without_subscription() {
    let backend = Arc::new(FakeBackend::new());
    let reconciler = reconciler_with(backend);

    reconciler.teardown();
    assert!(!reconciler.is_alive());
}

/// Test that an auto-selection pending at teardown never selects
#[tokio::test]
async fn test_pending_auto_select_cancelled_by_teardown() {
    let backend = Arc::new(FakeBackend::with_default_models());
    let reconciler = crate::reconciler::StatusReconciler::new(
        backend.clone(),
        crate::config::TrackerConfig {
            auto_select_delay: Duration::from_millis(50),
            ..crate::config::TrackerConfig::default()
        },
    );

    reconciler
        .handle_notification(Notification::DownloadComplete {
            model_id: "small.en".to_string(),
        })
        .await;
    reconciler.teardown();
    reconciler.settle().await;

    assert_eq!(backend.call_count("is_recording"), 0);
    assert_eq!(backend.call_count("set_active_model"), 0);
}
