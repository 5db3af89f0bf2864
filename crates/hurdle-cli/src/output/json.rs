use hurdle_core::{
    AnalysisResult, FlightInterval, MetricField, ObstacleProfile, ResultOrigin, TechniqueRating,
};
use serde::{Deserialize, Serialize};

/// Complete processing output in JSON format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingOutput {
    pub metadata: Metadata,
    pub result: AnalysisResult,
    pub origin: ResultOrigin,
    pub profile: ObstacleProfile,
    pub flight: FlightSummary,
    pub frame_stats: Vec<FrameStat>,
    /// Metrics filled from the bracket baseline rather than measured
    pub estimated_fields: Vec<MetricField>,
    pub notes: Vec<String>,
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub session_name: String,
    pub video_file: String,
    pub keypoint_file: Option<String>,
    pub processing_timestamp: String,
    pub obstacle_height_cm: f64,
    pub frame_rate: f64,
    pub duration_seconds: f64,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSummary {
    pub intervals: Vec<FlightInterval>,
    pub canonical: Option<FlightInterval>,
    pub open_takeoff_frame: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameStat {
    pub frame: usize,
    pub timestamp: f64,
    pub pose_detected: bool,
    pub ankle_height_px: Option<f64>,
    pub airborne: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub planned_frames: usize,
    pub attempted_frames: usize,
    pub frames_with_pose: usize,
    pub missing_frames: usize,
    pub cancelled: bool,
    pub rating: TechniqueRating,
    pub remarks: Vec<String>,
    pub processing_ms: f64,
}
