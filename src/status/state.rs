//! Transcription state machine
//!
//! One [`TranscriptionState`] exists per client session. It is either the
//! cloud branch (a configured remote provider, always ready) or the local
//! branch with its load/download/extract automaton. Invalid combinations
//! (cloud without a provider, an error text on a non-error status) cannot be
//! constructed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{StatusError, StatusResult};

/// Status of the local engine as reported to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalStatus {
    Ready,
    Loading,
    Downloading,
    Extracting,
    Error,
    Unloaded,
    /// No model is needed (nothing selected and nothing downloaded yet)
    #[serde(rename = "none")]
    NoModel,
}

impl LocalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocalStatus::Ready => "ready",
            LocalStatus::Loading => "loading",
            LocalStatus::Downloading => "downloading",
            LocalStatus::Extracting => "extracting",
            LocalStatus::Error => "error",
            LocalStatus::Unloaded => "unloaded",
            LocalStatus::NoModel => "none",
        }
    }
}

/// Non-empty display name of a cloud provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProviderName(String);

impl ProviderName {
    pub fn new(name: impl Into<String>) -> StatusResult<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(StatusError::InvalidState(
                "cloud provider name must not be empty".to_string(),
            ));
        }
        Ok(ProviderName(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Local branch of the state. The error text only exists on `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalState {
    Ready,
    Loading,
    Downloading,
    Extracting,
    Error(String),
    Unloaded,
    NoModel,
}

impl LocalState {
    pub fn status(&self) -> LocalStatus {
        match self {
            LocalState::Ready => LocalStatus::Ready,
            LocalState::Loading => LocalStatus::Loading,
            LocalState::Downloading => LocalStatus::Downloading,
            LocalState::Extracting => LocalStatus::Extracting,
            LocalState::Error(_) => LocalStatus::Error,
            LocalState::Unloaded => LocalStatus::Unloaded,
            LocalState::NoModel => LocalStatus::NoModel,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LocalState::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Whether `next` follows the documented local automaton.
    ///
    /// Notifications still win when this returns false; the check only
    /// feeds diagnostics.
    pub fn is_expected_transition(&self, next: &LocalState) -> bool {
        use LocalState::*;
        match (self, next) {
            (_, Error(_)) => true,
            (a, b) if a.status() == b.status() => true,
            (NoModel, Downloading) | (Unloaded, Downloading) | (Error(_), Downloading) => true,
            (Downloading, Extracting) | (Downloading, Loading) => true,
            (Extracting, Loading) => true,
            (Loading, Ready) => true,
            (Ready, Unloaded) | (Unloaded, Ready) => true,
            (Ready, Loading) | (Unloaded, Loading) | (Error(_), Loading) => true,
            (Ready, Downloading) => true,
            (NoModel, Loading) => true,
            _ => false,
        }
    }
}

/// The single authoritative engine state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionState {
    Cloud { provider_name: ProviderName },
    Local(LocalState),
}

impl Default for TranscriptionState {
    fn default() -> Self {
        TranscriptionState::Local(LocalState::Unloaded)
    }
}

impl TranscriptionState {
    pub fn cloud(provider_name: impl Into<String>) -> StatusResult<Self> {
        Ok(TranscriptionState::Cloud {
            provider_name: ProviderName::new(provider_name)?,
        })
    }

    pub fn is_cloud(&self) -> bool {
        matches!(self, TranscriptionState::Cloud { .. })
    }

    pub fn tag(&self) -> StatusTag {
        match self {
            TranscriptionState::Cloud { .. } => StatusTag::Cloud,
            TranscriptionState::Local(local) => StatusTag::Local(local.status()),
        }
    }

    pub fn local_status(&self) -> Option<LocalStatus> {
        match self {
            TranscriptionState::Local(local) => Some(local.status()),
            TranscriptionState::Cloud { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TranscriptionState::Local(local) => local.error(),
            TranscriptionState::Cloud { .. } => None,
        }
    }
}

/// Flat status tag: one of the local statuses, or `cloud`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTag {
    Cloud,
    Local(LocalStatus),
}

impl StatusTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTag::Cloud => "cloud",
            StatusTag::Local(status) => status.as_str(),
        }
    }
}

impl fmt::Display for StatusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatusTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Owner of the current state. Every write replaces the whole value.
#[derive(Debug, Default)]
pub struct StateMachine {
    current: TranscriptionState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &TranscriptionState {
        &self.current
    }

    /// Move to a local state unconditionally (push notifications, commands)
    pub fn set_local(&mut self, next: LocalState) {
        if let TranscriptionState::Local(previous) = &self.current {
            if !previous.is_expected_transition(&next) {
                log::debug!(
                    "[StateMachine] Unusual local transition {} -> {}",
                    previous.status().as_str(),
                    next.status().as_str()
                );
            }
        }
        self.replace(TranscriptionState::Local(next));
    }

    /// Commit a local status that came from a status query.
    ///
    /// Skipped while the cloud branch is active: a local query result never
    /// switches the provider. Returns whether the state was written.
    pub fn commit_local_query(&mut self, next: LocalState) -> bool {
        if self.current.is_cloud() {
            log::info!(
                "[StateMachine] Ignoring local status '{}' while cloud provider is active",
                next.status().as_str()
            );
            return false;
        }
        self.set_local(next);
        true
    }

    pub fn set_cloud(&mut self, provider_name: ProviderName) {
        self.replace(TranscriptionState::Cloud { provider_name });
    }

    fn replace(&mut self, next: TranscriptionState) {
        if self.current != next {
            log::debug!(
                "[StateMachine] {} -> {}",
                self.current.tag(),
                next.tag()
            );
        }
        self.current = next;
    }
}
