//! Transcription engine status tracking for the VoiceTypr model picker.
//!
//! [`StatusReconciler`] merges backend queries, backend push notifications
//! and user commands into one [`TranscriptionState`] and publishes a
//! render-ready [`StatusSnapshot`] after every change.

pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod reconciler;
pub mod status;
pub mod utils;

#[cfg(test)]
mod tests;

pub use backend::bus::{EventBus, LocalEventBus, Subscription};
pub use backend::events::Notification;
pub use backend::{CloudProviderConfig, TranscriptionBackend, TranscriptionConfig};
pub use config::TrackerConfig;
pub use error::{StatusError, StatusResult};
pub use models::{ModelCatalog, ModelDescriptor};
pub use reconciler::{AutoSelectDecision, ConfigChange, ErrorSink, StatusReconciler};
pub use status::{LocalState, LocalStatus, StatusDisplay, StatusSnapshot, TranscriptionState};

/// Install a stderr logger for hosts that don't bring their own.
///
/// Debug builds log at debug level, release builds at info; `RUST_LOG`
/// overrides both. Calling it more than once is harmless.
pub fn init_logging() {
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
