//! Tunables for the status tracker
//!
//! Defaults match what the desktop client ships with. Development builds can
//! override them through environment variables (optionally from a `.env` file).

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const AUTO_SELECT_DELAY_ENV: &str = "VOICETYPR_AUTO_SELECT_DELAY_MS";
pub const SPEED_SAMPLE_INTERVAL_ENV: &str = "VOICETYPR_SPEED_SAMPLE_INTERVAL_MS";
pub const SPEED_SMOOTHING_ENV: &str = "VOICETYPR_SPEED_SMOOTHING";

const DEFAULT_AUTO_SELECT_DELAY_MS: u64 = 1000;
const DEFAULT_SPEED_SAMPLE_INTERVAL_MS: u64 = 500;
const DEFAULT_SPEED_SMOOTHING: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Debounce between a completed download/extraction and auto-selection
    #[serde(rename = "auto_select_delay_ms", with = "millis")]
    pub auto_select_delay: Duration,
    /// Samples closer together than this are not used for speed
    #[serde(rename = "speed_sample_interval_ms", with = "millis")]
    pub speed_sample_interval: Duration,
    /// Weight kept from the previous speed estimate (0.0..1.0)
    pub speed_smoothing: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            auto_select_delay: Duration::from_millis(DEFAULT_AUTO_SELECT_DELAY_MS),
            speed_sample_interval: Duration::from_millis(DEFAULT_SPEED_SAMPLE_INTERVAL_MS),
            speed_smoothing: DEFAULT_SPEED_SMOOTHING,
        }
    }
}

impl TrackerConfig {
    /// Build a config from the environment, falling back to defaults
    pub fn from_env() -> Self {
        match dotenv::dotenv() {
            Ok(path) => log::debug!("[TrackerConfig] Loaded .env from {:?}", path),
            Err(e) => log::debug!("[TrackerConfig] No .env file loaded: {}", e),
        }

        let mut config = Self::default();

        if let Some(ms) = read_env::<u64>(AUTO_SELECT_DELAY_ENV) {
            config.auto_select_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>(SPEED_SAMPLE_INTERVAL_ENV) {
            config.speed_sample_interval = Duration::from_millis(ms);
        }
        if let Some(weight) = read_env::<f64>(SPEED_SMOOTHING_ENV) {
            config.speed_smoothing = weight;
        }

        config.sanitized()
    }

    /// Clamp values that would make the estimator misbehave
    pub fn sanitized(mut self) -> Self {
        if !self.speed_smoothing.is_finite() || !(0.0..1.0).contains(&self.speed_smoothing) {
            let clamped = if self.speed_smoothing.is_finite() {
                self.speed_smoothing.clamp(0.0, 0.99)
            } else {
                DEFAULT_SPEED_SMOOTHING
            };
            log::warn!(
                "[TrackerConfig] Smoothing weight {} out of range, using {}",
                self.speed_smoothing,
                clamped
            );
            self.speed_smoothing = clamped;
        }
        self
    }
}

fn read_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("[TrackerConfig] Ignoring malformed {}='{}'", key, raw);
            None
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
