//! Flight phase detection and clearance metrics for single-athlete hurdle videos.
//!
//! The pipeline samples frames from a [`sampler::VideoSource`], runs an injected
//! [`pose::PoseModel`] on each one, turns the ankle keypoints into a height
//! signal and segments it into flight intervals. [`metrics::MetricsCalculator`]
//! converts the canonical interval into physical metrics, and
//! [`analyzer::HurdleAnalyzer`] ties the stages together with simulated
//! fallbacks when pose data is unavailable.

pub mod analyzer;
pub mod errors;
pub mod logs;
pub mod metrics;
pub mod phase;
pub mod pose;
pub mod profile;
pub mod sampler;
pub mod signal;
pub mod simulate;
pub mod time;

pub use analyzer::{
    AnalysisMode, AnalysisReport, AnalyzerConfig, FallbackReason, HurdleAnalyzer, ResultOrigin,
};
pub use errors::{AnalysisError, PoseModelError, SeekError};
pub use metrics::{AnalysisResult, MetricField, MetricsCalculator, ObstacleMarker, ScaleCalibration};
pub use phase::{FlightInterval, FlightPhaseDetector, IntervalPolicy};
pub use pose::{share_model, Keypoint, KeypointName, Pose, PoseModel, SharedPoseModel};
pub use profile::{HurdleCategory, ObstacleProfile};
pub use sampler::{CancelToken, FramePacket, FrameSampler, SamplingConfig, VideoSource};
pub use signal::{AnkleHeightExtractor, AnkleHeightSample};
pub use simulate::{SimulatedMetricsGenerator, TechniqueRating, TechniqueScorer, VariationConfig};
