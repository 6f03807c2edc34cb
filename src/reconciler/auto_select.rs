//! Auto-selection policy
//!
//! When a download or extraction finishes, the new model is promoted to
//! active unless a recording is in progress. The recording check and the
//! later select command are not atomic: a recording that starts between the
//! two still gets the model swap. A missed or late auto-switch is cheap (the
//! user can switch manually), so the window is accepted rather than fenced.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::backend::TranscriptionBackend;
use crate::config::TrackerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSelectDecision {
    Promote,
    /// A recording is in progress; never swap models under it
    SkipRecording,
    /// Recording state could not be queried; treated like a recording
    SkipRecordingUnknown,
    /// The tracker was torn down while waiting
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
pub struct AutoSelectPolicy {
    delay: Duration,
}

impl AutoSelectPolicy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.auto_select_delay)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the debounce, then decide whether `model_id` may be promoted
    pub async fn evaluate(
        &self,
        backend: &dyn TranscriptionBackend,
        model_id: &str,
        alive: &AtomicBool,
    ) -> AutoSelectDecision {
        // Let backend bookkeeping settle before re-querying
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if !alive.load(Ordering::SeqCst) {
            return AutoSelectDecision::Cancelled;
        }

        let recording = backend.is_recording().await;
        if !alive.load(Ordering::SeqCst) {
            return AutoSelectDecision::Cancelled;
        }

        match recording {
            Ok(false) => AutoSelectDecision::Promote,
            Ok(true) => {
                log::info!(
                    "[AutoSelect] Recording in progress, not switching to '{}'",
                    model_id
                );
                AutoSelectDecision::SkipRecording
            }
            Err(e) => {
                log::warn!(
                    "[AutoSelect] Could not check recording state ({}), not switching to '{}'",
                    e,
                    model_id
                );
                AutoSelectDecision::SkipRecordingUnknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockTranscriptionBackend;

    fn policy() -> AutoSelectPolicy {
        AutoSelectPolicy::new(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_promotes_when_not_recording() {
        let mut backend = MockTranscriptionBackend::new();
        backend.expect_is_recording().times(1).returning(|| Ok(false));

        let alive = AtomicBool::new(true);
        let decision = policy().evaluate(&backend, "base.en", &alive).await;
        assert_eq!(decision, AutoSelectDecision::Promote);
    }

    #[tokio::test]
    async fn test_skips_while_recording_without_selecting() {
        let mut backend = MockTranscriptionBackend::new();
        backend.expect_is_recording().times(1).returning(|| Ok(true));
        backend.expect_set_active_model().never();

        let alive = AtomicBool::new(true);
        let decision = policy().evaluate(&backend, "base.en", &alive).await;
        assert_eq!(decision, AutoSelectDecision::SkipRecording);
    }

    #[tokio::test]
    async fn test_query_failure_is_treated_as_recording() {
        let mut backend = MockTranscriptionBackend::new();
        backend
            .expect_is_recording()
            .returning(|| Err("recorder unavailable".to_string()));

        let alive = AtomicBool::new(true);
        let decision = policy().evaluate(&backend, "base.en", &alive).await;
        assert_eq!(decision, AutoSelectDecision::SkipRecordingUnknown);
    }

    #[tokio::test]
    async fn test_cancelled_after_teardown_without_querying() {
        let mut backend = MockTranscriptionBackend::new();
        backend.expect_is_recording().never();

        let alive = AtomicBool::new(false);
        let decision = policy().evaluate(&backend, "base.en", &alive).await;
        assert_eq!(decision, AutoSelectDecision::Cancelled);
    }

    #[tokio::test]
    async fn test_waits_for_debounce() {
        let mut backend = MockTranscriptionBackend::new();
        backend.expect_is_recording().returning(|| Ok(false));

        let alive = AtomicBool::new(true);
        let started = std::time::Instant::now();
        let decision = AutoSelectPolicy::new(Duration::from_millis(30))
            .evaluate(&backend, "base.en", &alive)
            .await;
        assert_eq!(decision, AutoSelectDecision::Promote);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
