//! Acoustic feature vectors
//!
//! Extraction runs in an external engine. The pipeline treats the schema as
//! opaque ("name -> number"); `KEY_METRICS` names the eGeMAPS measures that
//! downstream scoring reads.

pub mod opensmile;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use opensmile::{parse_smile_csv, OpenSmileExtractor};

/// A named eGeMAPS measure and the delivery quality it is read as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyMetric {
    pub name: &'static str,
    pub quality: &'static str,
}

pub const KEY_METRICS: [KeyMetric; 8] = [
    KeyMetric { name: "F0semitoneFrom27.5Hz_sma3nz_stddevNorm", quality: "expressiveness" },
    KeyMetric { name: "loudness_sma3_amean", quality: "projection" },
    KeyMetric { name: "loudness_sma3_stddevNorm", quality: "emphasis" },
    KeyMetric { name: "loudnessPeaksPerSec", quality: "speed" },
    KeyMetric { name: "VoicedSegmentsPerSec", quality: "rhythm" },
    KeyMetric { name: "MeanUnvoicedSegmentLength", quality: "pauses" },
    KeyMetric { name: "jitterLocal_sma3nz_amean", quality: "steadiness_jitter" },
    KeyMetric { name: "shimmerLocaldB_sma3nz_amean", quality: "steadiness_shimmer" },
];

/// Mapping from measure name to value for one speaker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(BTreeMap<String, f64>);

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The subset of `KEY_METRICS` present in this vector, in `KEY_METRICS` order
    pub fn key_metrics(&self) -> Vec<(KeyMetric, f64)> {
        KEY_METRICS
            .iter()
            .filter_map(|m| self.get(m.name).map(|v| (*m, v)))
            .collect()
    }
}

impl FromIterator<(String, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
