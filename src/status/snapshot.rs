//! Render-ready view of the tracker, published after every change

use serde::Serialize;
use std::collections::HashMap;

use super::progress::DownloadProgressEntry;
use crate::models::ModelDescriptor;
use super::state::{StatusTag, TranscriptionState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Status line for the model button
    pub display: String,
    pub status: StatusTag,
    #[serde(skip)]
    pub state: TranscriptionState,
    pub error: Option<String>,
    pub current_model_id: Option<String>,
    /// Catalog ordered by size, for the model dropdown
    pub models: Vec<ModelDescriptor>,
    pub download_progress: HashMap<String, DownloadProgressEntry>,
    /// Smoothed download speeds in MB/s
    pub download_speeds: HashMap<String, f64>,
    /// Models being extracted, sorted
    pub extracting: Vec<String>,
    pub dropdown_open: bool,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        let state = TranscriptionState::default();
        Self {
            display: String::new(),
            status: state.tag(),
            state,
            error: None,
            current_model_id: None,
            models: Vec::new(),
            download_progress: HashMap::new(),
            download_speeds: HashMap::new(),
            extracting: Vec::new(),
            dropdown_open: false,
        }
    }
}

impl StatusSnapshot {
    pub fn is_downloading(&self, model_id: &str) -> bool {
        self.download_progress.contains_key(model_id)
    }

    pub fn is_extracting(&self, model_id: &str) -> bool {
        self.extracting.iter().any(|id| id == model_id)
    }
}
