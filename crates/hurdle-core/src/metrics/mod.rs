use std::fmt;

use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};
use crate::phase::FlightInterval;
use crate::profile::{validate_height, ObstacleProfile};
use crate::signal::AnkleHeightSample;

/// Confidence multiplier applied when the closed-interval count is not exactly one
pub const AMBIGUITY_PENALTY: f64 = 0.5;

/// Final metric set of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub flight_time_sec: f64,
    pub takeoff_distance_m: f64,
    pub landing_distance_m: f64,
    pub takeoff_contact_sec: f64,
    pub landing_contact_sec: f64,
    pub clearance_cm: f64,
    /// Fraction of sampled frames with a usable pose, in [0, 1]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl AnalysisResult {
    /// Reporting precision: seconds to 3 decimals, meters to 2, centimeters to 1.
    /// Confidence is left untouched.
    pub fn rounded(self) -> Self {
        Self {
            flight_time_sec: round_to(self.flight_time_sec, 3),
            takeoff_distance_m: round_to(self.takeoff_distance_m, 2),
            landing_distance_m: round_to(self.landing_distance_m, 2),
            takeoff_contact_sec: round_to(self.takeoff_contact_sec, 3),
            landing_contact_sec: round_to(self.landing_contact_sec, 3),
            clearance_cm: round_to(self.clearance_cm, 1),
            ..self
        }
    }

    pub fn is_finite(&self) -> bool {
        [
            self.flight_time_sec,
            self.takeoff_distance_m,
            self.landing_distance_m,
            self.takeoff_contact_sec,
            self.landing_contact_sec,
            self.clearance_cm,
            self.confidence,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    FlightTime,
    TakeoffDistance,
    LandingDistance,
    TakeoffContact,
    LandingContact,
    Clearance,
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricField::FlightTime => "flight_time",
            MetricField::TakeoffDistance => "takeoff_distance",
            MetricField::LandingDistance => "landing_distance",
            MetricField::TakeoffContact => "takeoff_contact",
            MetricField::LandingContact => "landing_contact",
            MetricField::Clearance => "clearance",
        };
        f.write_str(name)
    }
}

/// Reference mark for the obstacle in the sampled frames
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleMarker {
    /// Pixel height of the bar from the ground line to its top
    pub span_px: f64,
    /// Horizontal pixel position of the bar
    pub x_px: f64,
}

/// Pixel → physical scale derived from the obstacle's known height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleCalibration {
    pub cm_per_px: f64,
    pub obstacle_x_px: f64,
}

impl ScaleCalibration {
    pub fn from_marker(marker: ObstacleMarker, obstacle_height_cm: f64) -> Result<Self> {
        if !marker.span_px.is_finite() || marker.span_px <= 0.0 || !marker.x_px.is_finite() {
            return Err(AnalysisError::Validation(format!(
                "obstacle marker needs a positive span and finite position, got span={} x={}",
                marker.span_px, marker.x_px
            )));
        }
        validate_height(obstacle_height_cm)?;
        Ok(Self {
            cm_per_px: obstacle_height_cm / marker.span_px,
            obstacle_x_px: marker.x_px,
        })
    }

    pub fn to_cm(&self, px: f64) -> f64 {
        px * self.cm_per_px
    }

    pub fn to_meters(&self, px: f64) -> f64 {
        self.to_cm(px) / 100.0
    }

    /// Horizontal distance from `x_px` to the obstacle, in meters
    pub fn distance_to_obstacle_m(&self, x_px: f64) -> f64 {
        let bar = Point2::new(self.obstacle_x_px, 0.0);
        self.to_meters(nalgebra::distance(&Point2::new(x_px, 0.0), &bar))
    }
}

/// Everything the calculator needs from one run
#[derive(Debug, Clone, Copy)]
pub struct MetricsInput<'a> {
    /// Height samples in frame order
    pub samples: &'a [AnkleHeightSample],
    pub canonical: Option<FlightInterval>,
    pub closed_interval_count: usize,
    pub fps: f64,
    pub profile: &'a ObstacleProfile,
    pub frames_with_pose: usize,
    pub total_sampled_frames: usize,
    pub calibration: Option<ScaleCalibration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsOutcome {
    pub result: AnalysisResult,
    /// Fields filled from the bracket baseline instead of measurement
    pub estimated: Vec<MetricField>,
    pub notes: Vec<String>,
}

/// Turns phase boundaries into physical metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCalculator;

impl MetricsCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate(&self, input: &MetricsInput<'_>) -> Result<MetricsOutcome> {
        validate_height(input.profile.height_cm)?;
        if !input.fps.is_finite() || input.fps <= 0.0 {
            return Err(AnalysisError::Validation(format!(
                "frame rate must be positive, got {}",
                input.fps
            )));
        }
        if input.total_sampled_frames == 0 {
            return Err(AnalysisError::InsufficientData(
                "no frames were sampled from the video".to_string(),
            ));
        }

        let profile = input.profile;
        let mut estimated = Vec::new();
        let mut notes = Vec::new();

        let confidence = confidence(
            input.frames_with_pose,
            input.total_sampled_frames,
            input.closed_interval_count,
        );

        let Some(interval) = input.canonical else {
            notes.push("No closed flight interval detected; all metrics use the bracket baseline".to_string());
            estimated.extend([
                MetricField::FlightTime,
                MetricField::TakeoffDistance,
                MetricField::LandingDistance,
                MetricField::TakeoffContact,
                MetricField::LandingContact,
                MetricField::Clearance,
            ]);
            return Ok(MetricsOutcome {
                result: baseline_result(profile, confidence).rounded(),
                estimated,
                notes,
            });
        };

        let flight_time_sec = interval.duration_secs(input.fps);
        let takeoff_pos = position_of(input.samples, interval.start_frame_index);
        let landing_pos = position_of(input.samples, interval.end_frame_index);

        let contact_sec = |frames: Option<usize>| frames.map(|span| span as f64 / input.fps);
        let takeoff_contact_sec = contact_sec(takeoff_pos.and_then(|p| grounded_run_before(input.samples, p)))
            .unwrap_or_else(|| {
                estimated.push(MetricField::TakeoffContact);
                profile.baseline_takeoff_contact_sec
            });
        let landing_contact_sec = contact_sec(landing_pos.and_then(|p| grounded_run_from(input.samples, p)))
            .unwrap_or_else(|| {
                estimated.push(MetricField::LandingContact);
                profile.baseline_landing_contact_sec
            });

        let (takeoff_distance_m, landing_distance_m, clearance_cm) = match input.calibration {
            Some(scale) => {
                let anchor = |pos: Option<usize>| pos.and_then(|p| input.samples[p].anchor_x_px);
                let takeoff = anchor(takeoff_pos)
                    .map(|x| scale.distance_to_obstacle_m(x))
                    .unwrap_or_else(|| {
                        estimated.push(MetricField::TakeoffDistance);
                        profile.baseline_takeoff_distance_m
                    });
                let landing = anchor(landing_pos)
                    .map(|x| scale.distance_to_obstacle_m(x))
                    .unwrap_or_else(|| {
                        estimated.push(MetricField::LandingDistance);
                        profile.baseline_landing_distance_m
                    });
                let clearance = peak_height_px(input.samples, interval)
                    .map(|px| (scale.to_cm(px) - profile.height_cm).max(0.0))
                    .unwrap_or_else(|| {
                        estimated.push(MetricField::Clearance);
                        profile.baseline_clearance_cm
                    });
                (takeoff, landing, clearance)
            }
            None => {
                notes.push(
                    "No obstacle marker configured; distances and clearance use the bracket baseline"
                        .to_string(),
                );
                estimated.extend([
                    MetricField::TakeoffDistance,
                    MetricField::LandingDistance,
                    MetricField::Clearance,
                ]);
                (
                    profile.baseline_takeoff_distance_m,
                    profile.baseline_landing_distance_m,
                    profile.baseline_clearance_cm,
                )
            }
        };

        estimated.sort_by_key(|field| *field as u8);

        debug!(target: "hurdle_core::metrics",
            "Flight {:?}: {:.3}s, confidence {:.2}, {} estimated field(s)",
            interval,
            flight_time_sec,
            confidence,
            estimated.len()
        );

        Ok(MetricsOutcome {
            result: AnalysisResult {
                flight_time_sec,
                takeoff_distance_m,
                landing_distance_m,
                takeoff_contact_sec,
                landing_contact_sec,
                clearance_cm,
                confidence,
                technical_score: None,
                comment: None,
            }
            .rounded(),
            estimated,
            notes,
        })
    }
}

/// Pose coverage, halved when the signal held zero or several clearances
pub fn confidence(frames_with_pose: usize, total_sampled: usize, closed_intervals: usize) -> f64 {
    if total_sampled == 0 {
        return 0.0;
    }
    let coverage = (frames_with_pose as f64 / total_sampled as f64).clamp(0.0, 1.0);
    if closed_intervals == 1 {
        coverage
    } else {
        coverage * AMBIGUITY_PENALTY
    }
}

/// Bracket baseline used whenever no flight was measured
pub fn baseline_result(profile: &ObstacleProfile, confidence: f64) -> AnalysisResult {
    AnalysisResult {
        flight_time_sec: profile.baseline_flight_time_sec,
        takeoff_distance_m: profile.baseline_takeoff_distance_m,
        landing_distance_m: profile.baseline_landing_distance_m,
        takeoff_contact_sec: profile.baseline_takeoff_contact_sec,
        landing_contact_sec: profile.baseline_landing_contact_sec,
        clearance_cm: profile.baseline_clearance_cm,
        confidence: confidence.clamp(0.0, 1.0),
        technical_score: None,
        comment: None,
    }
}

fn position_of(samples: &[AnkleHeightSample], frame_index: usize) -> Option<usize> {
    samples.iter().position(|s| s.frame_index == frame_index)
}

/// Frames from the first grounded sample of the run before `takeoff_pos` up
/// to takeoff. Frames missing from `samples` inside the run still count.
/// `None` when the run reaches the first sample, since the contact may have
/// started off-video.
fn grounded_run_before(samples: &[AnkleHeightSample], takeoff_pos: usize) -> Option<usize> {
    let count = samples[..takeoff_pos]
        .iter()
        .rev()
        .take_while(|s| !s.is_airborne)
        .count();
    (count > 0 && count < takeoff_pos).then(|| {
        samples[takeoff_pos].frame_index - samples[takeoff_pos - count].frame_index
    })
}

/// Frames from touchdown up to the next airborne sample. `None` when the run
/// reaches the last sample.
fn grounded_run_from(samples: &[AnkleHeightSample], landing_pos: usize) -> Option<usize> {
    let tail = &samples[landing_pos..];
    let count = tail.iter().take_while(|s| !s.is_airborne).count();
    (count > 0 && count < tail.len())
        .then(|| tail[count].frame_index - samples[landing_pos].frame_index)
}

fn peak_height_px(samples: &[AnkleHeightSample], interval: FlightInterval) -> Option<f64> {
    samples
        .iter()
        .filter(|s| interval.contains(s.frame_index))
        .map(|s| s.height_px)
        .fold(None, |acc: Option<f64>, h| Some(acc.map_or(h, |m| m.max(h))))
}
