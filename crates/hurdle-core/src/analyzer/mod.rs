use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};
use crate::logs::{FrameLog, FrameLogEntry};
use crate::metrics::{
    AnalysisResult, MetricField, MetricsCalculator, MetricsInput, ObstacleMarker, ScaleCalibration,
};
use crate::phase::{FlightInterval, FlightPhaseDetector, IntervalPolicy};
use crate::pose::SharedPoseModel;
use crate::profile::ObstacleProfile;
use crate::sampler::{CancelToken, FrameSampler, SamplerStats, SamplingConfig, VideoSource};
use crate::signal::AnkleHeightExtractor;
use crate::simulate::{
    SimulatedMetricsGenerator, TechniqueRating, TechniqueScorer, VariationConfig,
};

/// Whether metrics are measured from poses or synthesized for demonstrations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Pose-based measurement, falling back to simulation only on failure
    #[default]
    Calibrated,
    /// Always synthesize placeholder metrics from the bracket baseline
    Demo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub extractor: AnkleHeightExtractor,
    #[serde(default)]
    pub interval_policy: IntervalPolicy,
    #[serde(default)]
    pub mode: AnalysisMode,
    #[serde(default)]
    pub obstacle_marker: Option<ObstacleMarker>,
    #[serde(default)]
    pub variation: VariationConfig,
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<()> {
        self.sampling.validate()?;
        self.variation.validate()?;

        let threshold = self.extractor.airborne_threshold_px;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(AnalysisError::Validation(format!(
                "airborne threshold must be a non-negative pixel count, got {threshold}"
            )));
        }
        if let Some(height) = self.extractor.frame_height_override {
            if !height.is_finite() || height <= 0.0 {
                return Err(AnalysisError::Validation(format!(
                    "frame height override must be positive, got {height}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    ModelUnavailable,
    DemoMode,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultOrigin {
    Measured,
    Simulated { reason: FallbackReason },
}

/// Everything one run produced, owned by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    pub origin: ResultOrigin,
    pub profile: ObstacleProfile,
    pub frame_rate: f64,
    pub intervals: Vec<FlightInterval>,
    pub canonical_interval: Option<FlightInterval>,
    pub open_takeoff_frame: Option<usize>,
    pub frames: FrameLog,
    pub sampler: SamplerStats,
    pub estimated_fields: Vec<MetricField>,
    pub notes: Vec<String>,
    pub rating: TechniqueRating,
    pub remarks: Vec<String>,
}

impl AnalysisReport {
    pub fn is_simulated(&self) -> bool {
        matches!(self.origin, ResultOrigin::Simulated { .. })
    }

    pub fn was_cancelled(&self) -> bool {
        self.sampler.cancelled
    }
}

/// Runs the sampling → signal → phase → metrics chain on one video at a time.
///
/// The pose model is an injected capability. It is initialized once at
/// construction; if that fails the analyzer stays usable in a degraded state
/// where every run is answered by the simulated generator.
pub struct HurdleAnalyzer {
    model: Option<SharedPoseModel>,
    config: AnalyzerConfig,
    calculator: MetricsCalculator,
    generator: SimulatedMetricsGenerator,
    scorer: TechniqueScorer,
}

impl HurdleAnalyzer {
    pub fn new(model: SharedPoseModel, config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;

        let ready = match model.lock() {
            Ok(mut guard) => match guard.initialize() {
                Ok(()) => true,
                Err(err) => {
                    warn!("Pose model unavailable, analysis will be simulated: {}", err);
                    false
                }
            },
            Err(_) => {
                warn!("Pose model lock poisoned, analysis will be simulated");
                false
            }
        };

        let mut analyzer = Self::without_model(config)?;
        if ready {
            info!("Pose model ready");
            analyzer.model = Some(model);
        }
        Ok(analyzer)
    }

    /// Analyzer with no pose model; every run is simulated
    pub fn without_model(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model: None,
            generator: SimulatedMetricsGenerator::new(config.variation),
            config,
            calculator: MetricsCalculator::new(),
            scorer: TechniqueScorer::new(),
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn is_degraded(&self) -> bool {
        self.model.is_none()
    }

    /// Analyze one clearance of an obstacle `obstacle_height_cm` tall.
    ///
    /// Only an invalid obstacle height (or marker) is reported as an error;
    /// every other failure degrades into a lower-confidence or simulated
    /// report.
    pub fn analyze<S: VideoSource, R: Rng + ?Sized>(
        &self,
        source: &mut S,
        obstacle_height_cm: f64,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<AnalysisReport> {
        let profile = ObstacleProfile::for_height(obstacle_height_cm)?;
        let calibration = self
            .config
            .obstacle_marker
            .map(|marker| ScaleCalibration::from_marker(marker, obstacle_height_cm))
            .transpose()?;

        if self.config.mode == AnalysisMode::Demo {
            info!("Demo mode: synthesizing metrics for {:?} obstacle", profile.category);
            return Ok(self.simulated(profile, FallbackReason::DemoMode, rng, Vec::new()));
        }
        let Some(model) = &self.model else {
            return Ok(self.simulated(
                profile,
                FallbackReason::ModelUnavailable,
                rng,
                vec!["Pose model unavailable; metrics are simulated".to_string()],
            ));
        };

        info!(
            "Analyzing clearance of {:.1} cm {:?} obstacle",
            profile.height_cm, profile.category
        );

        let extractor = self.config.extractor;
        let mut sampler = FrameSampler::new(
            source,
            model.clone(),
            self.config.sampling.clone(),
            cancel.clone(),
        );
        let frame_rate = sampler.frame_rate();

        let mut frames = FrameLog::default();
        let mut samples = Vec::new();
        for sampled in sampler.by_ref() {
            let pose = sampled.primary_pose();
            let sample = pose.map(|pose| {
                extractor.extract(sampled.frame.index, Some(pose), sampled.frame_height as f64)
            });
            frames.push(FrameLogEntry {
                frame_index: sampled.frame.index,
                timestamp_seconds: sampled.frame.timestamp_seconds,
                pose_detected: pose.is_some(),
                height_px: sample.map(|s| s.height_px),
                airborne: sample.is_some_and(|s| s.is_airborne),
            });
            samples.extend(sample);
        }
        let stats = sampler.stats();

        info!(
            "Sampled {} of {} planned frame positions ({} with a pose)",
            stats.completed(),
            stats.planned,
            frames.frames_with_pose()
        );

        let mut notes = Vec::new();
        if stats.cancelled {
            notes.push(format!(
                "Analysis cancelled after {} frames; metrics use partial data",
                frames.len()
            ));
        }
        if stats.missing() > 0 {
            notes.push(format!(
                "{} of {} frames were dropped (seek or inference failure)",
                stats.missing(),
                stats.attempted
            ));
        }

        let detection = FlightPhaseDetector::detect(&samples);
        let canonical = detection.select(self.config.interval_policy);
        if detection.closed_count() > 1 {
            let note = format!(
                "{} flight intervals detected; {:?} policy selected {:?}",
                detection.closed_count(),
                self.config.interval_policy,
                canonical
            );
            warn!("{}", note);
            notes.push(note);
        }
        if let Some(frame) = detection.open_takeoff_frame {
            notes.push(format!(
                "Flight starting at frame {frame} never landed within the sampled window"
            ));
        }

        let outcome = if frames.is_empty() {
            Err(AnalysisError::InsufficientData(format!(
                "none of {} sampled positions produced a frame",
                stats.attempted
            )))
        } else {
            self.calculator.calculate(&MetricsInput {
                samples: &samples,
                canonical,
                closed_interval_count: detection.closed_count(),
                fps: frame_rate,
                profile: &profile,
                frames_with_pose: frames.frames_with_pose(),
                total_sampled_frames: stats.planned,
                calibration,
            })
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(AnalysisError::InsufficientData(message)) => {
                warn!("Falling back to simulated metrics: {}", message);
                notes.push(format!("Insufficient data: {message}"));
                let mut report = self.simulated(profile, FallbackReason::InsufficientData, rng, notes);
                report.frame_rate = frame_rate;
                report.sampler = stats;
                return Ok(report);
            }
            Err(err) => return Err(err),
        };
        notes.extend(outcome.notes);

        let assessment = self.scorer.assess(&outcome.result, &profile);
        let result = AnalysisResult {
            technical_score: Some(assessment.score),
            comment: Some(assessment.comment()),
            ..outcome.result
        };

        info!(
            "Flight {:.3}s, confidence {:.2}, technique {}",
            result.flight_time_sec, result.confidence, assessment.rating
        );

        Ok(AnalysisReport {
            result,
            origin: ResultOrigin::Measured,
            profile,
            frame_rate,
            intervals: detection.intervals,
            canonical_interval: canonical,
            open_takeoff_frame: detection.open_takeoff_frame,
            frames,
            sampler: stats,
            estimated_fields: outcome.estimated,
            notes,
            rating: assessment.rating,
            remarks: assessment.remarks,
        })
    }

    /// Report synthesized entirely from the bracket baseline
    pub fn simulated<R: Rng + ?Sized>(
        &self,
        profile: ObstacleProfile,
        reason: FallbackReason,
        rng: &mut R,
        notes: Vec<String>,
    ) -> AnalysisReport {
        let generated = self.generator.generate(&profile, rng);
        let assessment = self.scorer.assess(&generated, &profile);

        AnalysisReport {
            result: AnalysisResult {
                technical_score: Some(assessment.score),
                comment: Some(assessment.comment()),
                ..generated
            },
            origin: ResultOrigin::Simulated { reason },
            profile,
            frame_rate: self.config.sampling.resolve_frame_rate(None),
            intervals: Vec::new(),
            canonical_interval: None,
            open_takeoff_frame: None,
            frames: FrameLog::default(),
            sampler: SamplerStats::default(),
            estimated_fields: vec![
                MetricField::FlightTime,
                MetricField::TakeoffDistance,
                MetricField::LandingDistance,
                MetricField::TakeoffContact,
                MetricField::LandingContact,
                MetricField::Clearance,
            ],
            notes,
            rating: assessment.rating,
            remarks: assessment.remarks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PoseModelError;
    use crate::pose::{share_model, Keypoint, KeypointName, Pose, PoseModel};
    use crate::sampler::tests::{grounded_model, FakeSource, ScriptedModel};
    use crate::sampler::FramePacket;
    use approx::assert_relative_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::time::Duration;

    struct BrokenModel;

    impl PoseModel for BrokenModel {
        fn initialize(&mut self) -> std::result::Result<(), PoseModelError> {
            Err(PoseModelError::Initialization("weights missing".to_string()))
        }

        fn estimate(
            &mut self,
            _frame: &FramePacket,
            _timeout: Duration,
        ) -> std::result::Result<Vec<Pose>, PoseModelError> {
            Err(PoseModelError::NotReady)
        }
    }

    /// Jumps over frames 20..=35, then cancels the run once frame 70 is reached
    struct CancelsMidRun {
        cancel: CancelToken,
    }

    impl PoseModel for CancelsMidRun {
        fn initialize(&mut self) -> std::result::Result<(), PoseModelError> {
            Ok(())
        }

        fn estimate(
            &mut self,
            frame: &FramePacket,
            _timeout: Duration,
        ) -> std::result::Result<Vec<Pose>, PoseModelError> {
            if frame.index >= 70 {
                self.cancel.cancel();
            }
            let y = if (20..40).contains(&frame.index) { 300.0 } else { 470.0 };
            Ok(vec![Pose::new([
                Keypoint::new(KeypointName::LeftAnkle, 300.0, y, 0.9),
                Keypoint::new(KeypointName::RightAnkle, 310.0, y, 0.9),
            ])])
        }
    }

    /// Ankles leave the ground on frames 60..=75 and touch down at 80
    fn clearance_model() -> SharedPoseModel {
        share_model(ScriptedModel {
            ankle_y: |frame: usize| {
                if (60..80).contains(&frame) {
                    Some(300.0)
                } else {
                    Some(470.0)
                }
            },
            fail_frames: HashSet::new(),
        })
    }

    #[test]
    fn measures_a_clean_clearance() {
        let analyzer = HurdleAnalyzer::new(clearance_model(), AnalyzerConfig::default()).unwrap();
        let mut source = FakeSource::new(5.0);
        let report = analyzer
            .analyze(
                &mut source,
                106.7,
                &mut SmallRng::seed_from_u64(1),
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(report.origin, ResultOrigin::Measured);
        assert_eq!(report.canonical_interval, FlightInterval::new(60, 80));
        assert_relative_eq!(report.result.flight_time_sec, 0.667);
        assert_relative_eq!(report.result.confidence, 1.0);
        assert_eq!(report.frames.len(), 30);
        assert!(report.result.technical_score.is_some());
        assert!(report.estimated_fields.contains(&MetricField::TakeoffDistance));
    }

    #[test]
    fn failed_initialization_degrades_to_simulation() {
        let analyzer = HurdleAnalyzer::new(share_model(BrokenModel), AnalyzerConfig::default()).unwrap();
        assert!(analyzer.is_degraded());

        let mut source = FakeSource::new(5.0);
        let report = analyzer
            .analyze(
                &mut source,
                83.8,
                &mut SmallRng::seed_from_u64(3),
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(
            report.origin,
            ResultOrigin::Simulated {
                reason: FallbackReason::ModelUnavailable
            }
        );
        assert!(source.seeks.is_empty());
        assert!(report.result.confidence <= 0.5);
    }

    #[test]
    fn demo_mode_never_touches_the_video() {
        let config = AnalyzerConfig {
            mode: AnalysisMode::Demo,
            ..AnalyzerConfig::default()
        };
        let analyzer = HurdleAnalyzer::new(grounded_model(), config).unwrap();
        let mut source = FakeSource::new(5.0);
        let report = analyzer
            .analyze(
                &mut source,
                91.4,
                &mut SmallRng::seed_from_u64(5),
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(
            report.origin,
            ResultOrigin::Simulated {
                reason: FallbackReason::DemoMode
            }
        );
        assert!(source.seeks.is_empty());
    }

    #[test]
    fn empty_video_falls_back_to_simulation() {
        let analyzer = HurdleAnalyzer::new(grounded_model(), AnalyzerConfig::default()).unwrap();
        let mut source = FakeSource::new(0.0);
        let report = analyzer
            .analyze(
                &mut source,
                76.2,
                &mut SmallRng::seed_from_u64(8),
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(
            report.origin,
            ResultOrigin::Simulated {
                reason: FallbackReason::InsufficientData
            }
        );
        assert!(report.result.is_finite());
    }

    #[test]
    fn no_poses_anywhere_gives_low_confidence() {
        let model = share_model(ScriptedModel {
            ankle_y: |_: usize| None,
            fail_frames: HashSet::new(),
        });
        let analyzer = HurdleAnalyzer::new(model, AnalyzerConfig::default()).unwrap();
        let mut source = FakeSource::new(5.0);
        let report = analyzer
            .analyze(
                &mut source,
                106.7,
                &mut SmallRng::seed_from_u64(8),
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(report.origin, ResultOrigin::Measured);
        assert!(report.result.confidence <= 0.5);
        assert!(report.result.is_finite());
        assert_eq!(report.estimated_fields.len(), 6);
    }

    #[test]
    fn invalid_height_is_the_only_error() {
        let analyzer = HurdleAnalyzer::new(grounded_model(), AnalyzerConfig::default()).unwrap();
        let mut source = FakeSource::new(5.0);
        let result = analyzer.analyze(
            &mut source,
            f64::NAN,
            &mut SmallRng::seed_from_u64(8),
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(AnalysisError::Validation(_))));
    }

    #[test]
    fn cancelled_before_first_frame_is_insufficient_data() {
        let analyzer = HurdleAnalyzer::new(grounded_model(), AnalyzerConfig::default()).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut source = FakeSource::new(5.0);
        let report = analyzer
            .analyze(&mut source, 106.7, &mut SmallRng::seed_from_u64(8), &cancel)
            .unwrap();

        assert!(report.was_cancelled());
        assert_eq!(
            report.origin,
            ResultOrigin::Simulated {
                reason: FallbackReason::InsufficientData
            }
        );
    }

    #[test]
    fn mid_run_cancellation_measures_partial_data_at_lower_confidence() {
        let cancel = CancelToken::new();
        let model = share_model(CancelsMidRun {
            cancel: cancel.clone(),
        });
        let analyzer = HurdleAnalyzer::new(model, AnalyzerConfig::default()).unwrap();
        let mut source = FakeSource::new(5.0);
        let report = analyzer
            .analyze(&mut source, 106.7, &mut SmallRng::seed_from_u64(8), &cancel)
            .unwrap();

        assert!(report.was_cancelled());
        assert_eq!(report.origin, ResultOrigin::Measured);
        assert_eq!(report.frames.len(), 15);
        assert_eq!(report.sampler.planned, 30);
        assert_eq!(report.canonical_interval, FlightInterval::new(20, 40));
        assert_relative_eq!(report.result.flight_time_sec, 0.667);
        // 15 of 30 planned positions
        assert_relative_eq!(report.result.confidence, 0.5);
        assert!(report.notes.iter().any(|n| n.contains("cancelled")));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = AnalyzerConfig::default();
        config.extractor.airborne_threshold_px = -1.0;
        assert!(HurdleAnalyzer::without_model(config).is_err());
    }
}
