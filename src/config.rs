use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::metrics::{DEFAULT_ANOMALY_THRESHOLD, DEFAULT_MIN_RACES};
use crate::errors::StatsError;

/// How the period speed is derived from the lean feed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpeedMethod {
    /// Recover the period-only speed from two cumulative `avg * played` products.
    #[default]
    Weighted,
    /// Use the current snapshot's average speed as-is.
    Snapshot,
}

/// Comparison used when checking a race delta against the anomaly threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CutoffMode {
    /// Drop deltas `>= threshold`; the threshold itself is treated as glitched.
    #[default]
    AtOrAbove,
    /// Drop deltas `> threshold`; the threshold itself is kept.
    Above,
}

impl CutoffMode {
    /// True if `delta` must be dropped as anomalous under this mode.
    pub fn is_anomalous(self, delta: i64, threshold: u64) -> bool {
        let threshold = i64::try_from(threshold).unwrap_or(i64::MAX);
        match self {
            Self::AtOrAbove => delta >= threshold,
            Self::Above => delta > threshold,
        }
    }
}

/// Top-level configuration recognized by the metric engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsConfig {
    /// Largest plausible race delta for one snapshot interval.
    pub anomaly_threshold: u64,
    /// Speed derivation used for event rows.
    pub speed_method: SpeedMethod,
    /// Whether a delta equal to `anomaly_threshold` is dropped.
    pub anomaly_cutoff: CutoffMode,
    /// Minimum race delta kept by `board::retain_min_races`.
    pub min_races: i64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
            speed_method: SpeedMethod::Weighted,
            anomaly_cutoff: CutoffMode::AtOrAbove,
            min_races: DEFAULT_MIN_RACES,
        }
    }
}

impl StatsConfig {
    /// Parse a JSON config document. Missing fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, StatsError> {
        serde_json::from_str(raw)
            .map_err(|err| StatsError::Configuration(format!("invalid config JSON: {err}")))
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StatsError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            StatsError::Configuration(format!(
                "failed reading config file {}: {err}",
                path.display()
            ))
        })?;
        Self::from_json_str(&raw)
    }

    /// Override the anomaly threshold.
    pub fn with_anomaly_threshold(mut self, threshold: u64) -> Self {
        self.anomaly_threshold = threshold;
        self
    }

    /// Override the speed derivation method.
    pub fn with_speed_method(mut self, method: SpeedMethod) -> Self {
        self.speed_method = method;
        self
    }

    /// Override the anomaly cutoff comparison.
    pub fn with_anomaly_cutoff(mut self, mode: CutoffMode) -> Self {
        self.anomaly_cutoff = mode;
        self
    }

    /// Override the post-filter minimum race delta.
    pub fn with_min_races(mut self, min_races: i64) -> Self {
        self.min_races = min_races;
        self
    }

    /// True if `delta` exceeds the configured anomaly cutoff.
    pub fn is_anomalous(&self, delta: i64) -> bool {
        self.anomaly_cutoff.is_anomalous(delta, self.anomaly_threshold)
    }
}
