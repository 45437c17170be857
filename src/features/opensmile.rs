// openSMILE feature extractor
//
// Runs `SMILExtract` with the eGeMAPS functionals config over a speaker track.
// The track is written to a temporary WAV and the CSV output to a second
// temporary file; both are deleted when their guards drop, on every exit
// path including cancellation (the child is killed on drop too).

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, error, info};
use std::process::Stdio;
use tokio::process::Command;

use super::FeatureVector;
use crate::audio::waveform::write_pcm16;
use crate::audio::SpeakerTrack;
use crate::config::OpenSmileConfig;
use crate::providers::FeatureExtractor;

/// Columns in SMILExtract CSV output that are not measures
const NON_FEATURE_COLUMNS: [&str; 2] = ["name", "frameTime"];

pub struct OpenSmileExtractor {
    config: OpenSmileConfig,
}

impl OpenSmileExtractor {
    pub fn new(config: OpenSmileConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl FeatureExtractor for OpenSmileExtractor {
    fn name(&self) -> &str {
        "opensmile"
    }

    async fn extract(&self, track: &SpeakerTrack) -> Result<FeatureVector> {
        if track.samples.is_empty() {
            return Err(anyhow!("Speaker {} has no audio to analyze", track.speaker_id));
        }

        let input = tempfile::Builder::new()
            .prefix("speaker-")
            .suffix(".wav")
            .tempfile()?;
        let output = tempfile::Builder::new()
            .prefix("egemaps-")
            .suffix(".csv")
            .tempfile()?;

        write_pcm16(input.path(), &track.samples, track.sample_rate)?;
        debug!(
            "Wrote {:.2}s of {} to {}",
            track.duration_seconds(),
            track.speaker_id,
            input.path().display()
        );

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg("-C")
            .arg(&self.config.config_path)
            .arg("-I")
            .arg(input.path())
            .arg("-csvoutput")
            .arg(output.path())
            .arg("-instname")
            .arg(&track.speaker_id)
            .arg("-loglevel")
            .arg("1")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = cmd.output().await.map_err(|e| {
            anyhow!(
                "Failed to run {}: {}",
                self.config.binary_path.display(),
                e
            )
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            error!("SMILExtract failed for {}: {}", track.speaker_id, stderr);
            return Err(anyhow!("SMILExtract exited with {}: {}", result.status, stderr.trim()));
        }

        let csv = tokio::fs::read_to_string(output.path()).await?;
        let features = parse_smile_csv(&csv)?;

        info!(
            "Extracted {} features for {}",
            features.len(),
            track.speaker_id
        );
        Ok(features)
    }
}

/// Parse the semicolon-separated functionals CSV written by `-csvoutput`.
///
/// The first non-empty line is the header; the last non-empty line holds
/// the values for the single instance.
pub fn parse_smile_csv(csv: &str) -> Result<FeatureVector> {
    let mut lines = csv.lines().map(str::trim).filter(|l| !l.is_empty());
    let header = lines.next().ok_or_else(|| anyhow!("Empty openSMILE output"))?;
    let values = lines
        .last()
        .ok_or_else(|| anyhow!("openSMILE output has a header but no values"))?;

    let names: Vec<&str> = header.split(';').map(|s| s.trim_matches('\'')).collect();
    let cells: Vec<&str> = values.split(';').collect();
    if names.len() != cells.len() {
        return Err(anyhow!(
            "openSMILE output has {} columns but {} values",
            names.len(),
            cells.len()
        ));
    }

    let mut features = FeatureVector::new();
    for (name, cell) in names.into_iter().zip(cells) {
        if NON_FEATURE_COLUMNS.contains(&name) {
            continue;
        }
        let value: f64 = cell
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid value {:?} for {}: {}", cell, name, e))?;
        features.insert(name, value);
    }

    if features.is_empty() {
        return Err(anyhow!("openSMILE output contains no features"));
    }
    Ok(features)
}
