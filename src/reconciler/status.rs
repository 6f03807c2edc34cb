//! Event reconciler
//!
//! Merges backend query results and push notifications into the single
//! [`TranscriptionState`] plus the download/extraction bookkeeping, and
//! dispatches user commands (select/download/delete) back to the backend.
//!
//! Notifications are handled one at a time in arrival order. State is only
//! locked between backend calls, never across them, so a query result and an
//! interleaved push notification simply race for the same slot: last write
//! wins. The one exception is the provider branch: a local status query never
//! switches the state away from a configured cloud provider.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock as StdRwLock, Weak};
use std::time::Instant;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use super::auto_select::{AutoSelectDecision, AutoSelectPolicy};
use super::lifecycle::SubscriptionSet;
use crate::backend::bus::{EventBus, EventHandler, Subscription};
use crate::backend::events::{self, Notification, CHANNELS};
use crate::backend::{TranscriptionBackend, TranscriptionConfig};
use crate::config::TrackerConfig;
use crate::error::{StatusError, StatusResult};
use crate::models::{ModelCatalog, ModelDescriptor};
use crate::status::{
    resolve_display, DisplayContext, DownloadTracker, LocalState, ProviderName, StateMachine,
    StatusSnapshot, TranscriptionState,
};
use crate::utils::logger::{
    log_complete, log_failed, log_model_operation, log_start, log_with_context,
};

/// Callback used to surface command failures to the presentation layer
pub type ErrorSink = Arc<dyn Fn(&StatusError) + Send + Sync>;

/// Outcome of a transcription config query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    Cloud,
    Local,
    /// A cloud provider was active and the backend now reports local mode
    SwitchedToLocal,
}

struct TrackerState {
    machine: StateMachine,
    catalog: ModelCatalog,
    downloads: DownloadTracker,
    extracting: BTreeSet<String>,
    /// `download_model` calls still awaiting the backend
    requested: HashSet<String>,
    /// Requested downloads the user cancelled; their late errors/progress are ignored
    cancelling: HashSet<String>,
    current_model_id: Option<String>,
    dropdown_open: bool,
}

impl TrackerState {
    fn new(config: &TrackerConfig) -> Self {
        Self {
            machine: StateMachine::new(),
            catalog: ModelCatalog::new(),
            downloads: DownloadTracker::new(config),
            extracting: BTreeSet::new(),
            requested: HashSet::new(),
            cancelling: HashSet::new(),
            current_model_id: None,
            dropdown_open: false,
        }
    }

    fn snapshot(&self) -> StatusSnapshot {
        let state = self.machine.current().clone();
        let display = resolve_display(&DisplayContext {
            state: &state,
            current_model_id: self.current_model_id.as_deref(),
            catalog: &self.catalog,
            downloads: self.downloads.entries(),
            extracting: &self.extracting,
        });

        StatusSnapshot {
            display: display.to_string(),
            status: state.tag(),
            error: state.error().map(str::to_string),
            state,
            current_model_id: self.current_model_id.clone(),
            models: self.catalog.models_by_size().into_iter().cloned().collect(),
            download_progress: self.downloads.entries().clone(),
            download_speeds: self.downloads.speeds_mb_per_sec(),
            extracting: self.extracting.iter().cloned().collect(),
            dropdown_open: self.dropdown_open,
        }
    }

    /// `Downloading`/`Extracting` with nothing left to show for it
    fn has_stale_transfer_status(&self) -> bool {
        match self.machine.current() {
            TranscriptionState::Local(LocalState::Downloading) => self.downloads.is_empty(),
            TranscriptionState::Local(LocalState::Extracting) => self.extracting.is_empty(),
            _ => false,
        }
    }

    /// Local status implied by the selected and the loaded model
    fn local_status_for(&self, current: Option<&str>, loaded: Option<&str>) -> LocalState {
        match (current, loaded) {
            (Some(current), Some(loaded)) if current == loaded => LocalState::Ready,
            (Some(_), _) => LocalState::Unloaded,
            (None, Some(_)) => LocalState::Ready,
            (None, None) if self.catalog.has_downloaded_models() => LocalState::Unloaded,
            (None, None) => LocalState::NoModel,
        }
    }
}

struct Shared {
    backend: Arc<dyn TranscriptionBackend>,
    policy: AutoSelectPolicy,
    state: Mutex<TrackerState>,
    snapshot_tx: watch::Sender<StatusSnapshot>,
    alive: Arc<AtomicBool>,
    torn_down: AtomicBool,
    error_sink: StdRwLock<Option<ErrorSink>>,
    subscriptions: StdMutex<Option<SubscriptionSet>>,
    pending: StdMutex<Vec<JoinHandle<()>>>,
}

/// Cheap-to-clone handle to the reconciler
#[derive(Clone)]
pub struct StatusReconciler {
    shared: Arc<Shared>,
}

impl StatusReconciler {
    pub fn new(backend: Arc<dyn TranscriptionBackend>, config: TrackerConfig) -> Self {
        let state = TrackerState::new(&config);
        let (snapshot_tx, _) = watch::channel(state.snapshot());

        Self {
            shared: Arc::new(Shared {
                backend,
                policy: AutoSelectPolicy::from_config(&config),
                state: Mutex::new(state),
                snapshot_tx,
                alive: Arc::new(AtomicBool::new(true)),
                torn_down: AtomicBool::new(false),
                error_sink: StdRwLock::new(None),
                subscriptions: StdMutex::new(None),
                pending: StdMutex::new(Vec::new()),
            }),
        }
    }

    pub fn set_error_sink(&self, sink: ErrorSink) {
        if let Ok(mut slot) = self.shared.error_sink.write() {
            *slot = Some(sink);
        }
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Latest published snapshot
    pub fn snapshot(&self) -> StatusSnapshot {
        self.shared.snapshot_tx.borrow().clone()
    }

    /// Receiver that observes every published snapshot
    pub fn watch(&self) -> watch::Receiver<StatusSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    pub async fn state(&self) -> TranscriptionState {
        self.shared.state.lock().await.machine.current().clone()
    }

    pub async fn current_model_id(&self) -> Option<String> {
        self.shared.state.lock().await.current_model_id.clone()
    }

    pub async fn models(&self) -> Vec<ModelDescriptor> {
        let state = self.shared.state.lock().await;
        state.catalog.models_by_size().into_iter().cloned().collect()
    }

    /// Apply a mutation and publish the resulting snapshot atomically
    async fn update<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut TrackerState) -> R,
    {
        let mut state = self.shared.state.lock().await;
        let result = f(&mut state);
        self.shared.snapshot_tx.send_replace(state.snapshot());
        result
    }

    fn report_error(&self, err: &StatusError) {
        if !self.is_alive() {
            log::debug!("[StatusReconciler] Dropping error after teardown: {}", err);
            return;
        }
        log::error!("[StatusReconciler] {}", err);
        if let Ok(slot) = self.shared.error_sink.read() {
            if let Some(sink) = slot.as_ref() {
                sink(err);
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Catalog refresh, then provider config, then local status.
    ///
    /// The local status is only committed when the config query did not
    /// report a cloud provider. A failed config query keeps the current
    /// branch and still commits the local status.
    pub async fn initialize(&self) {
        log_start("STATUS_INIT");
        let started = Instant::now();

        let _ = self.refresh_catalog().await;

        match self.refresh_config().await {
            Ok(ConfigChange::Cloud) => {
                log::info!("[StatusReconciler] Cloud provider configured, skipping local status query");
            }
            Ok(_) => {
                let _ = self.refresh_local_status().await;
            }
            Err(StatusError::TornDown) => return,
            Err(e) => {
                log::warn!(
                    "[StatusReconciler] Provider mode unknown ({}), keeping current branch",
                    e
                );
                let _ = self.refresh_local_status().await;
            }
        }

        log_complete("STATUS_INIT", started.elapsed().as_millis());
    }

    /// Replace the catalog with the backend's current model list
    pub async fn refresh_catalog(&self) -> StatusResult<()> {
        let models = self.shared.backend.list_models().await.map_err(|e| {
            let err = StatusError::query("list_models", e);
            log_failed("CATALOG_REFRESH", &err.to_string());
            err
        })?;
        if !self.is_alive() {
            return Err(StatusError::TornDown);
        }

        self.update(move |s| s.catalog.replace(models)).await;
        Ok(())
    }

    /// Query the provider configuration and move between branches
    pub async fn refresh_config(&self) -> StatusResult<ConfigChange> {
        let config = self
            .shared
            .backend
            .get_transcription_config()
            .await
            .map_err(|e| {
                let err = StatusError::query("get_transcription_config", e);
                log_failed("CONFIG_QUERY", &err.to_string());
                err
            })?;
        if !self.is_alive() {
            return Err(StatusError::TornDown);
        }

        match config {
            TranscriptionConfig::Cloud(cloud) => {
                let name = ProviderName::new(cloud.display_name()).map_err(|e| {
                    log::warn!("[StatusReconciler] Ignoring cloud config without provider: {}", e);
                    e
                })?;
                log::info!(
                    "[StatusReconciler] Cloud provider active: {} (model: {})",
                    name,
                    cloud.model
                );
                self.update(move |s| s.machine.set_cloud(name)).await;
                Ok(ConfigChange::Cloud)
            }
            TranscriptionConfig::Local => {
                let switched = self
                    .update(|s| {
                        if s.machine.current().is_cloud() {
                            s.machine.set_local(LocalState::Unloaded);
                            true
                        } else {
                            false
                        }
                    })
                    .await;
                if switched {
                    log::info!("[StatusReconciler] Switched from cloud provider to local engine");
                    Ok(ConfigChange::SwitchedToLocal)
                } else {
                    Ok(ConfigChange::Local)
                }
            }
        }
    }

    /// Query selected and loaded model and commit the implied local status
    pub async fn refresh_local_status(&self) -> StatusResult<LocalState> {
        let current = match self.shared.backend.get_current_model().await {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                let err = StatusError::query("get_current_model", e);
                log_failed("LOCAL_STATUS_QUERY", &err.to_string());
                if self.is_alive() {
                    self.update(|s| {
                        s.machine.commit_local_query(LocalState::Unloaded);
                    })
                    .await;
                }
                return Err(err);
            }
        };

        let loaded = match self.shared.backend.get_loaded_model().await {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                log::warn!(
                    "[StatusReconciler] Loaded model query failed, assuming nothing loaded: {}",
                    e
                );
                None
            }
        };

        if !self.is_alive() {
            return Err(StatusError::TornDown);
        }

        let next = self
            .update(move |s| {
                let next = s.local_status_for(current.as_deref(), loaded.as_deref());
                if let Some(id) = current.or(loaded) {
                    s.current_model_id = Some(id);
                }
                s.machine.commit_local_query(next.clone());
                next
            })
            .await;

        log_with_context(
            log::Level::Info,
            "[StatusReconciler] Local status query resolved",
            &[("status", next.status().as_str())],
        );
        Ok(next)
    }

    /// Re-read the selected model id without touching the status
    pub async fn refresh_current_model(&self) -> StatusResult<Option<String>> {
        let current = self
            .shared
            .backend
            .get_current_model()
            .await
            .map_err(|e| StatusError::query("get_current_model", e))?
            .filter(|id| !id.is_empty());
        if !self.is_alive() {
            return Err(StatusError::TornDown);
        }

        let id = current.clone();
        self.update(move |s| {
            if id.is_some() {
                s.current_model_id = id;
            }
        })
        .await;
        Ok(current)
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Apply one backend notification
    pub async fn handle_notification(&self, notification: Notification) {
        if !self.is_alive() {
            log::debug!(
                "[StatusReconciler] Ignoring '{}' after teardown",
                notification.channel()
            );
            return;
        }

        match notification {
            Notification::LoadingStarted => {
                self.update(|s| s.machine.set_local(LocalState::Loading)).await;
            }
            Notification::LoadingCompleted { model_id } => {
                if let Some(id) = &model_id {
                    log_model_operation("LOAD", id, "READY", None);
                }
                self.update(move |s| {
                    s.machine.set_local(LocalState::Ready);
                    if model_id.is_some() {
                        s.current_model_id = model_id;
                    }
                })
                .await;
            }
            Notification::LoadingFailed { error } => {
                let message = error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "Failed to load model".to_string());
                log::warn!("[StatusReconciler] Model loading failed: {}", message);
                self.update(move |s| s.machine.set_local(LocalState::Error(message)))
                    .await;
            }
            Notification::Unloaded => {
                self.update(|s| s.machine.set_local(LocalState::Unloaded)).await;
            }
            Notification::DownloadProgress {
                model_id,
                downloaded,
                total,
                percentage,
            } => {
                let now = Instant::now();
                self.update(move |s| {
                    if s.cancelling.contains(&model_id) {
                        return;
                    }
                    s.downloads
                        .update(&model_id, downloaded, total, percentage, now);
                    s.machine.set_local(LocalState::Downloading);
                })
                .await;
            }
            Notification::DownloadComplete { model_id } => {
                log_model_operation("DOWNLOAD", &model_id, "COMPLETE", None);
                let id = model_id.clone();
                self.update(move |s| {
                    s.downloads.remove(&id);
                    s.cancelling.remove(&id);
                })
                .await;
                let _ = self.refresh_catalog().await;
                self.schedule_auto_select(model_id);
            }
            Notification::ExtractionStarted { model_id } => {
                log_model_operation("EXTRACT", &model_id, "STARTED", None);
                self.update(move |s| {
                    s.extracting.insert(model_id);
                    s.machine.set_local(LocalState::Extracting);
                })
                .await;
            }
            Notification::ExtractionCompleted { model_id } => {
                log_model_operation("EXTRACT", &model_id, "COMPLETE", None);
                let id = model_id.clone();
                self.update(move |s| {
                    s.extracting.remove(&id);
                })
                .await;
                let _ = self.refresh_catalog().await;
                self.schedule_auto_select(model_id);
            }
            Notification::ExtractionFailed { model_id, error } => {
                log_model_operation("EXTRACT", &model_id, "FAILED", Some(&error));
                self.update(move |s| {
                    s.extracting.remove(&model_id);
                    s.machine
                        .set_local(LocalState::Error(format!("failed to extract: {}", error)));
                })
                .await;
            }
            Notification::SettingsChanged { setting } => {
                log::debug!(
                    "[StatusReconciler] Settings changed ({}), re-reading provider config",
                    setting.as_deref().unwrap_or("all")
                );
                // Only the provider branch follows settings; local status is
                // left to engine notifications
                let _ = self.refresh_config().await;
            }
        }
    }

    fn schedule_auto_select(&self, model_id: String) {
        let reconciler = self.clone();
        let handle = tokio::spawn(async move {
            reconciler.auto_select(&model_id).await;
        });
        if let Ok(mut pending) = self.shared.pending.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
    }

    /// Promote a freshly available model unless a recording is running
    pub async fn auto_select(&self, model_id: &str) -> AutoSelectDecision {
        let decision = self
            .shared
            .policy
            .evaluate(self.shared.backend.as_ref(), model_id, &self.shared.alive)
            .await;
        match decision {
            AutoSelectDecision::Promote => {}
            AutoSelectDecision::SkipRecording | AutoSelectDecision::SkipRecordingUnknown => {
                self.recover_stale_status().await;
                return decision;
            }
            AutoSelectDecision::Cancelled => return decision,
        }

        if let Err(e) = self.refresh_current_model().await {
            log::warn!("[AutoSelect] Could not refresh current model: {}", e);
        }
        if !self.is_alive() {
            return AutoSelectDecision::Cancelled;
        }

        log_model_operation("AUTO_SELECT", model_id, "PROMOTING", None);
        // Failures are already surfaced through the error sink
        let _ = self.select_model(model_id).await;
        decision
    }

    /// Re-query the engine when a transfer status outlived its transfers
    async fn recover_stale_status(&self) {
        if !self.is_alive() {
            return;
        }
        let stale = self.shared.state.lock().await.has_stale_transfer_status();
        if stale {
            log::debug!("[StatusReconciler] No transfers left, re-reading local status");
            let _ = self.refresh_local_status().await;
        }
    }

    /// Wait for outstanding auto-selection tasks
    pub async fn settle(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = match self.shared.pending.lock() {
                Ok(mut pending) => pending.drain(..).collect(),
                Err(_) => return,
            };
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    log::warn!("[AutoSelect] Task ended abnormally: {}", e);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Make `model_id` the active local model.
    ///
    /// `CurrentModelId` is updated before the backend confirms. Re-selecting
    /// after a failure moves the engine from `error` back to `loading`.
    pub async fn select_model(&self, model_id: &str) -> StatusResult<()> {
        if !self.is_alive() {
            return Err(StatusError::TornDown);
        }
        log_model_operation("SELECT", model_id, "REQUESTED", None);

        let id = model_id.to_string();
        let previous = self
            .update(move |s| {
                let previous = s.current_model_id.replace(id);
                if matches!(
                    s.machine.current(),
                    TranscriptionState::Local(LocalState::Error(_))
                ) {
                    s.machine.set_local(LocalState::Loading);
                }
                previous
            })
            .await;

        match self.shared.backend.set_active_model(model_id).await {
            Ok(()) => {
                log_model_operation("SELECT", model_id, "OK", None);
                Ok(())
            }
            Err(e) => {
                let err = StatusError::command("select_model", model_id, e);
                if self.is_alive() {
                    let message = err.user_message();
                    let id = model_id.to_string();
                    self.update(move |s| {
                        // Only roll back if nothing confirmed another model meanwhile
                        if s.current_model_id.as_deref() == Some(id.as_str()) {
                            s.current_model_id = previous;
                        }
                        s.machine.set_local(LocalState::Error(message));
                    })
                    .await;
                }
                self.report_error(&err);
                Err(err)
            }
        }
    }

    /// Ask the backend to download a model. Progress arrives as notifications.
    pub async fn download_model(&self, model_id: &str) -> StatusResult<()> {
        if !self.is_alive() {
            return Err(StatusError::TornDown);
        }
        log_model_operation("DOWNLOAD", model_id, "REQUESTED", None);

        let id = model_id.to_string();
        self.update(move |s| {
            s.cancelling.remove(&id);
            s.requested.insert(id);
        })
        .await;

        let result = self.shared.backend.download_model(model_id).await;
        let id = model_id.to_string();
        let is_err = result.is_err();
        let was_cancelled = self
            .update(move |s| {
                s.requested.remove(&id);
                if is_err {
                    s.downloads.remove(&id);
                }
                s.cancelling.remove(&id)
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                if was_cancelled {
                    log_model_operation("DOWNLOAD", model_id, "CANCELLED", None);
                    return Ok(());
                }

                let err = StatusError::command("download_model", model_id, e);
                if self.is_alive() {
                    let message = err.user_message();
                    self.update(move |s| s.machine.set_local(LocalState::Error(message)))
                        .await;
                }
                self.report_error(&err);
                Err(err)
            }
        }
    }

    /// Cancel a running download and drop its progress and speed entries
    pub async fn cancel_download(&self, model_id: &str) -> StatusResult<()> {
        if !self.is_alive() {
            return Err(StatusError::TornDown);
        }
        // Only a request still in flight can deliver late progress or errors
        let id = model_id.to_string();
        self.update(move |s| {
            if s.requested.contains(&id) {
                s.cancelling.insert(id);
            }
        })
        .await;

        if let Err(e) = self.shared.backend.cancel_download(model_id).await {
            let id = model_id.to_string();
            self.update(move |s| {
                s.cancelling.remove(&id);
            })
            .await;
            let err = StatusError::command("cancel_download", model_id, e);
            self.report_error(&err);
            return Err(err);
        }

        log_model_operation("DOWNLOAD", model_id, "CANCEL_REQUESTED", None);
        let id = model_id.to_string();
        self.update(move |s| {
            s.downloads.remove(&id);
        })
        .await;

        self.recover_stale_status().await;
        Ok(())
    }

    /// Delete a downloaded model and refresh the catalog
    pub async fn delete_model(&self, model_id: &str) -> StatusResult<()> {
        if !self.is_alive() {
            return Err(StatusError::TornDown);
        }

        if let Err(e) = self.shared.backend.delete_model(model_id).await {
            let err = StatusError::command("delete_model", model_id, e);
            self.report_error(&err);
            return Err(err);
        }
        log_model_operation("DELETE", model_id, "OK", None);

        let id = model_id.to_string();
        self.update(move |s| {
            if s.current_model_id.as_deref() == Some(id.as_str()) {
                s.current_model_id = None;
                if !s.machine.current().is_cloud() {
                    s.machine.set_local(LocalState::Unloaded);
                }
            }
        })
        .await;

        let _ = self.refresh_catalog().await;
        Ok(())
    }

    /// Store a new provider configuration and follow it
    pub async fn set_transcription_config(&self, config: TranscriptionConfig) -> StatusResult<()> {
        if !self.is_alive() {
            return Err(StatusError::TornDown);
        }

        if let Err(e) = self.shared.backend.set_transcription_config(config).await {
            let err = StatusError::command("set_transcription_config", "transcription config", e);
            self.report_error(&err);
            return Err(err);
        }

        self.refresh_config().await.map(|_| ())
    }

    /// Track the model dropdown; opening it refreshes the catalog
    pub async fn set_dropdown_open(&self, open: bool) {
        self.update(move |s| s.dropdown_open = open).await;
        if open && self.is_alive() {
            let _ = self.refresh_catalog().await;
        }
    }

    // ------------------------------------------------------------------
    // Subscription lifecycle
    // ------------------------------------------------------------------

    /// Register handlers for every backend notification channel.
    ///
    /// Must be called from within a tokio runtime. Calling it twice keeps
    /// the first registration.
    pub fn subscribe(&self, bus: Arc<dyn EventBus>) -> StatusResult<()> {
        if self.shared.torn_down.load(Ordering::SeqCst) {
            return Err(StatusError::TornDown);
        }

        let mut slot = self
            .shared
            .subscriptions
            .lock()
            .map_err(|_| StatusError::InvalidState("subscription registry poisoned".to_string()))?;
        if slot.is_some() {
            log::warn!("[StatusReconciler] Already subscribed, ignoring second subscribe()");
            return Ok(());
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

        let subscriptions: Vec<Subscription> = CHANNELS
            .iter()
            .map(|channel| {
                let tx = tx.clone();
                let channel_name = channel.to_string();
                let handler: EventHandler = Arc::new(move |payload: &str| {
                    match events::decode(&channel_name, payload) {
                        Ok(notification) => {
                            if tx.send(notification).is_err() {
                                log::debug!(
                                    "[StatusReconciler] Queue closed, dropping '{}'",
                                    channel_name
                                );
                            }
                        }
                        Err(e) => log::warn!("[StatusReconciler] Dropping notification: {}", e),
                    }
                });
                Subscription::new(bus.clone(), channel, handler)
            })
            .collect();
        drop(tx);

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let pump = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                let reconciler = StatusReconciler { shared };
                if !reconciler.is_alive() {
                    break;
                }
                reconciler.handle_notification(notification).await;
            }
            log::debug!("[StatusReconciler] Notification pump stopped");
        });

        log::info!(
            "[StatusReconciler] Subscribed to {} notification channels",
            subscriptions.len()
        );
        *slot = Some(SubscriptionSet::new(
            subscriptions,
            self.shared.alive.clone(),
            pump,
        ));
        Ok(())
    }

    pub fn is_subscribed(&self) -> bool {
        self.shared
            .subscriptions
            .lock()
            .map(|slot| slot.as_ref().map(|s| s.is_active()).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Unregister all handlers and stop accepting results. Idempotent.
    pub fn teardown(&self) {
        if self.shared.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.alive.store(false, Ordering::SeqCst);

        let set = match self.shared.subscriptions.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(mut set) = set {
            set.release();
        }
        log::info!("[StatusReconciler] Torn down");
    }
}
