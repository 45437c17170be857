// Analysis configuration
//
// Thresholds default to the values the pipeline was tuned with; both can be
// overridden from a JSON file or from the environment.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, AnalysisResultOf};

/// Default merge gap between same-speaker diarization segments (seconds)
pub const DEFAULT_MAX_GAP: f64 = 0.3;
/// Default nearest-turn fallback bound for alignment (seconds)
pub const DEFAULT_MAX_NEAREST_GAP: f64 = 0.5;

pub const ENV_MAX_GAP: &str = "ANALYSIS_MAX_GAP";
pub const ENV_MAX_NEAREST_GAP: &str = "ANALYSIS_MAX_NEAREST_GAP";
pub const ENV_SMILE_BINARY: &str = "ANALYSIS_SMILE_BINARY";
pub const ENV_SMILE_CONFIG: &str = "ANALYSIS_SMILE_CONFIG";

/// Settings for the openSMILE feature extractor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenSmileConfig {
    /// Path or name of the `SMILExtract` binary
    pub binary_path: PathBuf,
    /// eGeMAPS functionals config file
    pub config_path: PathBuf,
}

impl Default for OpenSmileConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("SMILExtract"),
            config_path: PathBuf::from("config/egemaps/v02/eGeMAPSv02.conf"),
        }
    }
}

/// Configuration for one analysis pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum gap (seconds) across which same-speaker turns are merged
    pub max_gap: f64,
    /// Maximum gap (seconds) for attributing a non-overlapping transcript
    /// segment to its nearest turn
    pub max_nearest_gap: f64,
    pub opensmile: OpenSmileConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_gap: DEFAULT_MAX_GAP,
            max_nearest_gap: DEFAULT_MAX_NEAREST_GAP,
            opensmile: OpenSmileConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> AnalysisResultOf<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            AnalysisError::Configuration(format!("cannot parse {}: {}", path.display(), e))
        })?;
        info!("Loaded analysis config from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> AnalysisResultOf<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> AnalysisResultOf<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MAX_GAP) {
            self.max_gap = parse_seconds(ENV_MAX_GAP, &raw)?;
            debug!("{} override: {}", ENV_MAX_GAP, self.max_gap);
        }
        if let Some(raw) = lookup(ENV_MAX_NEAREST_GAP) {
            self.max_nearest_gap = parse_seconds(ENV_MAX_NEAREST_GAP, &raw)?;
            debug!("{} override: {}", ENV_MAX_NEAREST_GAP, self.max_nearest_gap);
        }
        if let Some(raw) = lookup(ENV_SMILE_BINARY) {
            self.opensmile.binary_path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup(ENV_SMILE_CONFIG) {
            self.opensmile.config_path = PathBuf::from(raw);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> AnalysisResultOf<()> {
        validate_threshold("max_gap", self.max_gap)?;
        validate_threshold("max_nearest_gap", self.max_nearest_gap)
    }
}

pub(crate) fn validate_threshold(name: &str, value: f64) -> AnalysisResultOf<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AnalysisError::Configuration(format!(
            "{} must be a finite, non-negative number of seconds (got {})",
            name, value
        )));
    }
    Ok(())
}

fn parse_seconds(key: &str, raw: &str) -> AnalysisResultOf<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| AnalysisError::Configuration(format!("{}={:?}: {}", key, raw, e)))
}
