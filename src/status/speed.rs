//! Download speed estimator
//!
//! Turns the irregular cumulative-bytes stream of each download into a
//! smoothed throughput figure. Samples arriving faster than the configured
//! interval are ignored for speed purposes, and the result is an exponential
//! moving average so the number shown to the user does not jump around.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::TrackerConfig;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Per-model sampling state, discarded with the download's progress entry
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSpeedSample {
    pub started_at: Instant,
    pub last_sample_at: Instant,
    pub last_bytes: u64,
    /// Smoothed speed in bytes per second, never negative
    pub speed_bps: f64,
}

#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    min_interval: Duration,
    smoothing: f64,
    samples: HashMap<String, DownloadSpeedSample>,
}

impl Default for SpeedEstimator {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}

impl SpeedEstimator {
    pub fn new(min_interval: Duration, smoothing: f64) -> Self {
        Self {
            min_interval,
            smoothing: smoothing.clamp(0.0, 0.99),
            samples: HashMap::new(),
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.speed_sample_interval, config.speed_smoothing)
    }

    /// Feed a cumulative byte count observed at `now`.
    ///
    /// Returns the current smoothed speed in bytes per second.
    pub fn record(&mut self, model_id: &str, bytes: u64, now: Instant) -> f64 {
        let Some(sample) = self.samples.get_mut(model_id) else {
            self.samples.insert(
                model_id.to_string(),
                DownloadSpeedSample {
                    started_at: now,
                    last_sample_at: now,
                    last_bytes: bytes,
                    speed_bps: 0.0,
                },
            );
            return 0.0;
        };

        let elapsed = now.saturating_duration_since(sample.last_sample_at);
        if elapsed <= self.min_interval {
            return sample.speed_bps;
        }

        let elapsed_secs = elapsed.as_secs_f64();
        // Cumulative bytes can appear to regress on backend restarts
        let raw_rate = ((bytes as f64 - sample.last_bytes as f64) / elapsed_secs).max(0.0);

        sample.speed_bps = if sample.speed_bps == 0.0 {
            raw_rate
        } else {
            sample.speed_bps * self.smoothing + raw_rate * (1.0 - self.smoothing)
        };
        sample.last_sample_at = now;
        sample.last_bytes = bytes;

        sample.speed_bps
    }

    pub fn sample(&self, model_id: &str) -> Option<&DownloadSpeedSample> {
        self.samples.get(model_id)
    }

    pub fn speed_bytes_per_sec(&self, model_id: &str) -> Option<f64> {
        self.samples.get(model_id).map(|s| s.speed_bps)
    }

    pub fn speed_mb_per_sec(&self, model_id: &str) -> Option<f64> {
        self.speed_bytes_per_sec(model_id).map(|bps| bps / BYTES_PER_MB)
    }

    /// Current speeds in MB/s keyed by model id
    pub fn speeds_mb_per_sec(&self) -> HashMap<String, f64> {
        self.samples
            .iter()
            .map(|(id, s)| (id.clone(), s.speed_bps / BYTES_PER_MB))
            .collect()
    }

    pub fn remove(&mut self, model_id: &str) -> bool {
        self.samples.remove(model_id).is_some()
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.samples.contains_key(model_id)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
