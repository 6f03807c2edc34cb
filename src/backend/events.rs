//! Backend notification channels and payload decoding

use serde::Deserialize;

use crate::error::{StatusError, StatusResult};

pub const MODEL_STATE_CHANGED: &str = "model-state-changed";
pub const MODEL_DOWNLOAD_PROGRESS: &str = "model-download-progress";
pub const MODEL_DOWNLOAD_COMPLETE: &str = "model-download-complete";
pub const MODEL_EXTRACTION_STARTED: &str = "model-extraction-started";
pub const MODEL_EXTRACTION_COMPLETED: &str = "model-extraction-completed";
pub const MODEL_EXTRACTION_FAILED: &str = "model-extraction-failed";
pub const SETTINGS_CHANGED: &str = "settings-changed";

/// Every channel the reconciler listens on
pub const CHANNELS: [&str; 7] = [
    MODEL_STATE_CHANGED,
    MODEL_DOWNLOAD_PROGRESS,
    MODEL_DOWNLOAD_COMPLETE,
    MODEL_EXTRACTION_STARTED,
    MODEL_EXTRACTION_COMPLETED,
    MODEL_EXTRACTION_FAILED,
    SETTINGS_CHANGED,
];

/// A decoded backend notification
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    LoadingStarted,
    LoadingCompleted { model_id: Option<String> },
    LoadingFailed { error: Option<String> },
    Unloaded,
    DownloadProgress {
        model_id: String,
        downloaded: u64,
        total: u64,
        percentage: f64,
    },
    DownloadComplete { model_id: String },
    ExtractionStarted { model_id: String },
    ExtractionCompleted { model_id: String },
    ExtractionFailed { model_id: String, error: String },
    SettingsChanged { setting: Option<String> },
}

impl Notification {
    /// Channel this notification arrives on
    pub fn channel(&self) -> &'static str {
        match self {
            Notification::LoadingStarted
            | Notification::LoadingCompleted { .. }
            | Notification::LoadingFailed { .. }
            | Notification::Unloaded => MODEL_STATE_CHANGED,
            Notification::DownloadProgress { .. } => MODEL_DOWNLOAD_PROGRESS,
            Notification::DownloadComplete { .. } => MODEL_DOWNLOAD_COMPLETE,
            Notification::ExtractionStarted { .. } => MODEL_EXTRACTION_STARTED,
            Notification::ExtractionCompleted { .. } => MODEL_EXTRACTION_COMPLETED,
            Notification::ExtractionFailed { .. } => MODEL_EXTRACTION_FAILED,
            Notification::SettingsChanged { .. } => SETTINGS_CHANGED,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ModelStateEventType {
    LoadingStarted,
    LoadingCompleted,
    LoadingFailed,
    Unloaded,
}

#[derive(Debug, Deserialize)]
struct ModelStateChangedPayload {
    event_type: ModelStateEventType,
    #[serde(default)]
    model_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DownloadProgressPayload {
    model_id: String,
    downloaded: f64,
    total: f64,
    #[serde(default)]
    percentage: f64,
}

#[derive(Debug, Deserialize)]
struct ExtractionFailedPayload {
    model_id: String,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsChangedPayload {
    #[serde(default)]
    setting: Option<String>,
}

/// Model id payloads are a bare string; an object form is tolerated
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelIdPayload {
    Bare(String),
    Object { model_id: String },
}

impl ModelIdPayload {
    fn into_id(self) -> String {
        match self {
            ModelIdPayload::Bare(id) | ModelIdPayload::Object { model_id: id } => id,
        }
    }
}

/// Byte counts arrive as JSON numbers; negatives and NaN read as zero
fn byte_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

fn parse<T: for<'de> Deserialize<'de>>(channel: &str, payload: &str) -> StatusResult<T> {
    serde_json::from_str(payload).map_err(|e| StatusError::Payload {
        channel: channel.to_string(),
        message: e.to_string(),
    })
}

fn parse_model_id(channel: &str, payload: &str) -> StatusResult<String> {
    let id = parse::<ModelIdPayload>(channel, payload)?.into_id();
    if id.is_empty() {
        return Err(StatusError::Payload {
            channel: channel.to_string(),
            message: "empty model id".to_string(),
        });
    }
    Ok(id)
}

/// Decode a raw JSON payload received on `channel`
pub fn decode(channel: &str, payload: &str) -> StatusResult<Notification> {
    match channel {
        MODEL_STATE_CHANGED => {
            let p: ModelStateChangedPayload = parse(channel, payload)?;
            Ok(match p.event_type {
                ModelStateEventType::LoadingStarted => Notification::LoadingStarted,
                ModelStateEventType::LoadingCompleted => Notification::LoadingCompleted {
                    model_id: p.model_id.filter(|id| !id.is_empty()),
                },
                ModelStateEventType::LoadingFailed => Notification::LoadingFailed { error: p.error },
                ModelStateEventType::Unloaded => Notification::Unloaded,
            })
        }
        MODEL_DOWNLOAD_PROGRESS => {
            let p: DownloadProgressPayload = parse(channel, payload)?;
            Ok(Notification::DownloadProgress {
                model_id: p.model_id,
                downloaded: byte_count(p.downloaded),
                total: byte_count(p.total),
                percentage: p.percentage,
            })
        }
        MODEL_DOWNLOAD_COMPLETE => Ok(Notification::DownloadComplete {
            model_id: parse_model_id(channel, payload)?,
        }),
        MODEL_EXTRACTION_STARTED => Ok(Notification::ExtractionStarted {
            model_id: parse_model_id(channel, payload)?,
        }),
        MODEL_EXTRACTION_COMPLETED => Ok(Notification::ExtractionCompleted {
            model_id: parse_model_id(channel, payload)?,
        }),
        MODEL_EXTRACTION_FAILED => {
            let p: ExtractionFailedPayload = parse(channel, payload)?;
            Ok(Notification::ExtractionFailed {
                model_id: p.model_id,
                error: p.error,
            })
        }
        SETTINGS_CHANGED => {
            // The backend emits an empty payload for bulk saves
            let p: Option<SettingsChangedPayload> = if payload.trim().is_empty() {
                None
            } else {
                parse(channel, payload)?
            };
            Ok(Notification::SettingsChanged {
                setting: p.unwrap_or_default().setting,
            })
        }
        other => Err(StatusError::Payload {
            channel: other.to_string(),
            message: "unknown channel".to_string(),
        }),
    }
}
