// Analysis orchestrator
//
// One `analyze` call is a self-contained request: it owns every intermediate
// value and shares nothing mutable with concurrent calls. Any collaborator
// failure aborts the request; a partial result is never returned.

use chrono::Utc;
use futures_util::future::{try_join3, try_join_all};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use super::result::{AnalysisMetadata, AnalysisResult};
use crate::audio::{assemble_speaker_tracks, WavDecoder};
use crate::config::AnalysisConfig;
use crate::diarization::SegmentMerger;
use crate::error::{AnalysisError, AnalysisResultOf, Collaborator};
use crate::features::FeatureVector;
use crate::providers::{AudioDecoder, Diarizer, FeatureExtractor, Recognizer, RecordingRef};
use crate::transcription::TranscriptAligner;

fn failed(collaborator: Collaborator) -> impl FnOnce(anyhow::Error) -> AnalysisError {
    move |e| AnalysisError::collaborator(collaborator, format!("{:#}", e))
}

pub struct AnalysisOrchestrator {
    merger: SegmentMerger,
    aligner: TranscriptAligner,
    recognizer: Arc<dyn Recognizer>,
    diarizer: Arc<dyn Diarizer>,
    extractor: Arc<dyn FeatureExtractor>,
    decoder: Arc<dyn AudioDecoder>,
}

impl AnalysisOrchestrator {
    /// Build an orchestrator that decodes recordings as local WAV files
    pub fn new(
        config: &AnalysisConfig,
        recognizer: Arc<dyn Recognizer>,
        diarizer: Arc<dyn Diarizer>,
        extractor: Arc<dyn FeatureExtractor>,
    ) -> AnalysisResultOf<Self> {
        config.validate()?;
        info!(
            "Analysis pipeline: recognizer={}, diarizer={}, extractor={}, max_gap={:.2}s, max_nearest_gap={:.2}s",
            recognizer.name(),
            diarizer.name(),
            extractor.name(),
            config.max_gap,
            config.max_nearest_gap
        );
        Ok(Self {
            merger: SegmentMerger::new(config.max_gap)?,
            aligner: TranscriptAligner::new(config.max_nearest_gap)?,
            recognizer,
            diarizer,
            extractor,
            decoder: Arc::new(WavDecoder),
        })
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn AudioDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Run the full pipeline over one recording.
    ///
    /// `expected_speakers` is only forwarded to the diarizer.
    pub async fn analyze(
        &self,
        source: &RecordingRef,
        expected_speakers: Option<usize>,
    ) -> AnalysisResultOf<AnalysisResult> {
        let request_id = Uuid::new_v4();
        info!(
            "[{}] Analyzing {} (expected speakers: {:?})",
            request_id, source, expected_speakers
        );

        let (asr, mut segments, waveform) = try_join3(
            async {
                self.recognizer
                    .transcribe(source)
                    .await
                    .map_err(failed(Collaborator::Recognition))
            },
            async {
                self.diarizer
                    .diarize(source, expected_speakers)
                    .await
                    .map_err(failed(Collaborator::Diarization))
            },
            async {
                self.decoder
                    .decode(source)
                    .await
                    .map_err(failed(Collaborator::AudioDecoding))
            },
        )
        .await?;

        debug!(
            "[{}] {} transcript segments, {} diarization segments, {:.2}s of audio",
            request_id,
            asr.len(),
            segments.len(),
            waveform.duration_seconds()
        );

        // The diarizer's ordering is not a caller contract, so sort here
        if segments.windows(2).any(|w| w[1].start < w[0].start) {
            warn!("[{}] Diarization output was not ordered by start; sorting", request_id);
            segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        }

        let turns = self.merger.merge(&segments)?;
        let transcript = self.aligner.align(&asr, &turns)?;

        let duration_seconds = waveform.duration_seconds();
        let tracks = assemble_speaker_tracks(&waveform, &turns);
        drop(waveform);

        let speakers: Vec<String> = tracks.iter().map(|t| t.speaker_id.clone()).collect();

        let extractions = tracks.iter().map(|track| async move {
            let features = self.extractor.extract(track).await.map_err(|e| {
                AnalysisError::collaborator(
                    Collaborator::FeatureExtraction,
                    format!("speaker {}: {:#}", track.speaker_id, e),
                )
            })?;
            Ok::<(String, FeatureVector), AnalysisError>((track.speaker_id.clone(), features))
        });
        let metrics: BTreeMap<String, FeatureVector> =
            try_join_all(extractions).await?.into_iter().collect();

        let result = AnalysisResult {
            transcript,
            metrics,
            metadata: AnalysisMetadata {
                request_id,
                source: source.clone(),
                speakers,
                expected_speakers,
                duration_seconds,
                analyzed_at: Utc::now(),
            },
        };

        if result.is_empty() {
            info!("[{}] No speech detected in {}", request_id, source);
        } else {
            info!(
                "[{}] Analysis complete: {} segments, {} speakers",
                request_id,
                result.transcript.len(),
                result.metrics.len()
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{SpeakerTrack, Waveform};
    use crate::diarization::DiarizationSegment;
    use crate::transcription::{AsrSegment, SpeakerLabel};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const RATE: u32 = 100;

    struct FakeRecognizer(Result<Vec<AsrSegment>, String>);

    #[async_trait]
    impl Recognizer for FakeRecognizer {
        fn name(&self) -> &str {
            "fake-asr"
        }

        async fn transcribe(&self, _recording: &RecordingRef) -> Result<Vec<AsrSegment>> {
            self.0.clone().map_err(|e| anyhow!(e))
        }
    }

    struct FakeDiarizer {
        output: Result<Vec<DiarizationSegment>, String>,
        seen_hint: Mutex<Option<Option<usize>>>,
    }

    impl FakeDiarizer {
        fn new(output: Result<Vec<DiarizationSegment>, String>) -> Self {
            Self {
                output,
                seen_hint: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Diarizer for FakeDiarizer {
        fn name(&self) -> &str {
            "fake-diarizer"
        }

        async fn diarize(
            &self,
            _recording: &RecordingRef,
            expected_speakers: Option<usize>,
        ) -> Result<Vec<DiarizationSegment>> {
            *self.seen_hint.lock().unwrap() = Some(expected_speakers);
            self.output.clone().map_err(|e| anyhow!(e))
        }
    }

    /// Reports track length and turn count; fails for one configured speaker
    struct FakeExtractor {
        fail_for: Option<&'static str>,
    }

    #[async_trait]
    impl FeatureExtractor for FakeExtractor {
        fn name(&self) -> &str {
            "fake-features"
        }

        async fn extract(&self, track: &SpeakerTrack) -> Result<FeatureVector> {
            if self.fail_for == Some(track.speaker_id.as_str()) {
                return Err(anyhow!("extractor crashed"));
            }
            let mut v = FeatureVector::new();
            v.insert("samples", track.samples.len() as f64);
            v.insert("turns", track.turn_count as f64);
            Ok(v)
        }
    }

    struct FakeDecoder(Option<Waveform>);

    #[async_trait]
    impl AudioDecoder for FakeDecoder {
        fn name(&self) -> &str {
            "fake-decoder"
        }

        async fn decode(&self, _recording: &RecordingRef) -> Result<Waveform> {
            self.0.clone().ok_or_else(|| anyhow!("unsupported container"))
        }
    }

    fn diarization() -> Vec<DiarizationSegment> {
        vec![
            DiarizationSegment::new(0.0, 5.0, "A"),
            DiarizationSegment::new(5.1, 9.0, "A"),
            DiarizationSegment::new(9.5, 12.0, "B"),
        ]
    }

    fn transcript() -> Vec<AsrSegment> {
        vec![
            AsrSegment::new(0.5, 4.0, "good evening"),
            AsrSegment::new(4.8, 5.3, "hello"),
            AsrSegment::new(12.5, 13.0, "bye"),
            AsrSegment::new(20.0, 21.0, "?"),
        ]
    }

    fn orchestrator(
        asr: Result<Vec<AsrSegment>, String>,
        diarizer: Arc<FakeDiarizer>,
        extractor: FakeExtractor,
        audio: Option<Waveform>,
    ) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(
            &AnalysisConfig::default(),
            Arc::new(FakeRecognizer(asr)),
            diarizer,
            Arc::new(extractor),
        )
        .unwrap()
        .with_decoder(Arc::new(FakeDecoder(audio)))
    }

    fn silence(seconds: usize) -> Option<Waveform> {
        Some(Waveform::new(vec![0.0; seconds * RATE as usize], RATE))
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let diarizer = Arc::new(FakeDiarizer::new(Ok(diarization())));
        let pipeline = orchestrator(
            Ok(transcript()),
            diarizer.clone(),
            FakeExtractor { fail_for: None },
            silence(25),
        );

        let result = pipeline
            .analyze(&RecordingRef::new("debate.wav"), Some(2))
            .await
            .unwrap();

        let labels: Vec<&str> = result.transcript.iter().map(|s| s.speaker.as_str()).collect();
        assert_eq!(labels, vec!["A", "A", "B", "UNKNOWN"]);
        assert_eq!(result.metadata.speakers, vec!["A", "B"]);
        assert_eq!(result.metadata.expected_speakers, Some(2));
        assert_eq!(result.metadata.duration_seconds, 25.0);

        // A is one merged turn 0.0-9.0, B is 9.5-12.0
        assert_eq!(result.metrics["A"].get("samples"), Some(900.0));
        assert_eq!(result.metrics["A"].get("turns"), Some(1.0));
        assert_eq!(result.metrics["B"].get("samples"), Some(250.0));

        assert_eq!(*diarizer.seen_hint.lock().unwrap(), Some(Some(2)));
        assert_eq!(result.text_for("A"), "good evening hello");
        assert!(!result.is_empty());
    }

    #[tokio::test]
    async fn test_no_speech_is_empty_result() {
        let pipeline = orchestrator(
            Ok(vec![]),
            Arc::new(FakeDiarizer::new(Ok(vec![]))),
            FakeExtractor { fail_for: None },
            silence(3),
        );
        let result = pipeline.analyze(&RecordingRef::new("quiet.wav"), None).await.unwrap();
        assert!(result.is_empty());
        assert!(result.metadata.speakers.is_empty());
    }

    #[tokio::test]
    async fn test_no_diarization_all_unknown() {
        let pipeline = orchestrator(
            Ok(transcript()),
            Arc::new(FakeDiarizer::new(Ok(vec![]))),
            FakeExtractor { fail_for: None },
            silence(25),
        );
        let result = pipeline.analyze(&RecordingRef::new("x.wav"), None).await.unwrap();
        assert!(result.transcript.iter().all(|s| s.speaker == SpeakerLabel::Unknown));
        assert!(result.metrics.is_empty());
    }

    #[tokio::test]
    async fn test_unsorted_diarizer_output_is_sorted() {
        let mut segments = diarization();
        segments.reverse();
        let pipeline = orchestrator(
            Ok(transcript()),
            Arc::new(FakeDiarizer::new(Ok(segments))),
            FakeExtractor { fail_for: None },
            silence(25),
        );
        let result = pipeline.analyze(&RecordingRef::new("x.wav"), None).await.unwrap();
        assert_eq!(result.metadata.speakers, vec!["A", "B"]);
        assert_eq!(result.metrics["A"].get("turns"), Some(1.0));
    }

    #[tokio::test]
    async fn test_unsorted_transcript_is_rejected() {
        let mut asr = transcript();
        asr.swap(0, 1);
        let pipeline = orchestrator(
            Ok(asr),
            Arc::new(FakeDiarizer::new(Ok(diarization()))),
            FakeExtractor { fail_for: None },
            silence(25),
        );
        let err = pipeline.analyze(&RecordingRef::new("x.wav"), None).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InputOrdering { .. }));
    }

    async fn failing_collaborator(pipeline: AnalysisOrchestrator) -> Collaborator {
        match pipeline.analyze(&RecordingRef::new("x.wav"), None).await {
            Err(AnalysisError::Collaborator { collaborator, .. }) => collaborator,
            other => panic!("expected collaborator failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_recognition_failure_aborts() {
        let pipeline = orchestrator(
            Err("model not loaded".into()),
            Arc::new(FakeDiarizer::new(Ok(diarization()))),
            FakeExtractor { fail_for: None },
            silence(25),
        );
        assert_eq!(failing_collaborator(pipeline).await, Collaborator::Recognition);
    }

    #[tokio::test]
    async fn test_diarization_failure_aborts() {
        let pipeline = orchestrator(
            Ok(transcript()),
            Arc::new(FakeDiarizer::new(Err("onnx error".into()))),
            FakeExtractor { fail_for: None },
            silence(25),
        );
        assert_eq!(failing_collaborator(pipeline).await, Collaborator::Diarization);
    }

    #[tokio::test]
    async fn test_decode_failure_aborts() {
        let pipeline = orchestrator(
            Ok(transcript()),
            Arc::new(FakeDiarizer::new(Ok(diarization()))),
            FakeExtractor { fail_for: None },
            None,
        );
        assert_eq!(failing_collaborator(pipeline).await, Collaborator::AudioDecoding);
    }

    #[tokio::test]
    async fn test_one_extraction_failure_aborts_all() {
        let pipeline = orchestrator(
            Ok(transcript()),
            Arc::new(FakeDiarizer::new(Ok(diarization()))),
            FakeExtractor { fail_for: Some("B") },
            silence(25),
        );
        let err = pipeline.analyze(&RecordingRef::new("x.wav"), None).await.unwrap_err();
        match err {
            AnalysisError::Collaborator {
                collaborator,
                cause,
            } => {
                assert_eq!(collaborator, Collaborator::FeatureExtraction);
                assert!(cause.contains("speaker B"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalysisConfig {
            max_gap: -1.0,
            ..Default::default()
        };
        let result = AnalysisOrchestrator::new(
            &config,
            Arc::new(FakeRecognizer(Ok(vec![]))),
            Arc::new(FakeDiarizer::new(Ok(vec![]))),
            Arc::new(FakeExtractor { fail_for: None }),
        );
        assert!(matches!(result, Err(AnalysisError::Configuration(_))));
    }
}
