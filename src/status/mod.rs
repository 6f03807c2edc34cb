//! Engine status: state machine, download tracking and display resolution

pub mod display;
pub mod progress;
pub mod snapshot;
pub mod speed;
pub mod state;

pub use display::{resolve_display, DisplayContext, StatusDisplay};
pub use progress::{clamp_percentage, DownloadProgressEntry, DownloadTracker};
pub use snapshot::StatusSnapshot;
pub use speed::{DownloadSpeedSample, SpeedEstimator};
pub use state::{LocalState, LocalStatus, ProviderName, StateMachine, StatusTag, TranscriptionState};
