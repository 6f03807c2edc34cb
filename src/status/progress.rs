//! Per-model download progress
//!
//! Progress entries and speed samples share one keyed store so an id is
//! always inserted into and removed from both together.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

use super::speed::SpeedEstimator;
use crate::config::TrackerConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgressEntry {
    pub downloaded: u64,
    pub total: u64,
    /// Server-reported percentage, unclamped
    pub percentage: f64,
}

impl DownloadProgressEntry {
    /// Percentage clamped to 0..=100; non-finite values read as 0
    pub fn clamped_percentage(&self) -> f64 {
        clamp_percentage(self.percentage)
    }
}

pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct DownloadTracker {
    entries: HashMap<String, DownloadProgressEntry>,
    speeds: SpeedEstimator,
}

impl DownloadTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            entries: HashMap::new(),
            speeds: SpeedEstimator::from_config(config),
        }
    }

    /// Upsert the progress entry and feed the speed estimator.
    ///
    /// Returns the smoothed speed in MB/s.
    pub fn update(
        &mut self,
        model_id: &str,
        downloaded: u64,
        total: u64,
        percentage: f64,
        now: Instant,
    ) -> f64 {
        self.entries.insert(
            model_id.to_string(),
            DownloadProgressEntry {
                downloaded,
                total,
                percentage,
            },
        );
        self.speeds.record(model_id, downloaded, now);
        self.speeds.speed_mb_per_sec(model_id).unwrap_or(0.0)
    }

    /// Drop progress and speed for a model. Returns whether anything existed.
    pub fn remove(&mut self, model_id: &str) -> bool {
        let had_entry = self.entries.remove(model_id).is_some();
        let had_speed = self.speeds.remove(model_id);
        had_entry || had_speed
    }

    pub fn get(&self, model_id: &str) -> Option<&DownloadProgressEntry> {
        self.entries.get(model_id)
    }

    pub fn entries(&self) -> &HashMap<String, DownloadProgressEntry> {
        &self.entries
    }

    pub fn speed_mb_per_sec(&self, model_id: &str) -> Option<f64> {
        self.speeds.speed_mb_per_sec(model_id)
    }

    pub fn speeds_mb_per_sec(&self) -> HashMap<String, f64> {
        self.speeds.speeds_mb_per_sec()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
