//! Backend seam
//!
//! The desktop backend owns downloading, extraction and model loading. This
//! crate only issues queries/commands through [`TranscriptionBackend`] and
//! reacts to the notifications it pushes over an [`bus::EventBus`].

pub mod bus;
pub mod config;
pub mod events;

use async_trait::async_trait;

use crate::models::ModelDescriptor;
pub use config::{CloudProviderConfig, TranscriptionConfig};

/// Queries and commands offered by the desktop backend.
///
/// Every call yields the data or the backend's error text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, String>;

    async fn get_transcription_config(&self) -> Result<TranscriptionConfig, String>;

    /// Id of the model selected for local transcription, if any
    async fn get_current_model(&self) -> Result<Option<String>, String>;

    /// Id of the model the local engine currently has in memory, if any
    async fn get_loaded_model(&self) -> Result<Option<String>, String>;

    async fn set_active_model(&self, model_id: &str) -> Result<(), String>;

    async fn download_model(&self, model_id: &str) -> Result<(), String>;

    async fn cancel_download(&self, model_id: &str) -> Result<(), String>;

    async fn delete_model(&self, model_id: &str) -> Result<(), String>;

    async fn set_transcription_config(&self, config: TranscriptionConfig) -> Result<(), String>;

    async fn is_recording(&self) -> Result<bool, String>;
}
