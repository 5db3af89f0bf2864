use hurdle_core::signal::DEFAULT_AIRBORNE_THRESHOLD_PX;
use hurdle_core::{
    AnalysisMode, AnalyzerConfig, AnkleHeightExtractor, IntervalPolicy, ObstacleMarker,
    SamplingConfig, VariationConfig,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{ProcessingError, Result};

/// Configuration for session processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Frame stride, frame cap and per-call timeouts
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Ankle height (px) above which a frame counts as airborne
    #[serde(default = "default_airborne_threshold")]
    pub airborne_threshold_px: f64,
    /// Ankle keypoints below this confidence are ignored
    #[serde(default)]
    pub min_keypoint_confidence: f64,
    /// Ground line in pixels from the top of the frame; defaults to the frame height
    #[serde(default)]
    pub ground_line_px: Option<f64>,
    #[serde(default)]
    pub interval_policy: IntervalPolicy,
    #[serde(default)]
    pub variation: VariationConfig,
    /// Obstacle marker source; distances fall back to baselines without one
    #[serde(default)]
    pub calibration: Option<CalibrationConfig>,
    /// Synthesize placeholder metrics instead of measuring
    #[serde(default)]
    pub demo: bool,
    /// Output directory
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Verbose logging
    #[serde(default)]
    pub verbose: bool,
}

fn default_airborne_threshold() -> f64 {
    DEFAULT_AIRBORNE_THRESHOLD_PX
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./hurdle-output")
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            airborne_threshold_px: default_airborne_threshold(),
            min_keypoint_confidence: 0.0,
            ground_line_px: None,
            interval_policy: IntervalPolicy::default(),
            variation: VariationConfig::default(),
            calibration: None,
            demo: false,
            output_dir: default_output_dir(),
            verbose: false,
        }
    }
}

impl ProcessingConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ProcessingError::InvalidConfig(format!(
                "Failed to read config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Core analyzer settings for this run
    pub fn to_analyzer_config(&self, marker: Option<ObstacleMarker>) -> Result<AnalyzerConfig> {
        if !(0.0..=1.0).contains(&self.min_keypoint_confidence) {
            return Err(ProcessingError::InvalidConfig(format!(
                "min_keypoint_confidence must lie in [0, 1], got {}",
                self.min_keypoint_confidence
            )));
        }

        let config = AnalyzerConfig {
            sampling: self.sampling.clone(),
            extractor: AnkleHeightExtractor {
                airborne_threshold_px: self.airborne_threshold_px,
                min_keypoint_confidence: self.min_keypoint_confidence,
                frame_height_override: self.ground_line_px,
            },
            interval_policy: self.interval_policy,
            mode: if self.demo {
                AnalysisMode::Demo
            } else {
                AnalysisMode::Calibrated
            },
            obstacle_marker: marker,
            variation: self.variation,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Where the obstacle's pixel reference comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum CalibrationConfig {
    /// Marker given inline
    #[serde(rename = "marker")]
    Marker { span_px: f64, x_px: f64 },

    /// Load from YAML marker file
    #[serde(rename = "file")]
    FromFile { path: PathBuf },
}

/// Marker loaded from YAML file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MarkerFile {
    span_px: f64,
    x_px: f64,
    /// Resolution the marker was measured at
    width: Option<u32>,
    height: Option<u32>,
}

impl CalibrationConfig {
    /// Resolve the obstacle marker, checking it against the video resolution when known
    pub fn load(&self, video_size: Option<(u32, u32)>) -> Result<ObstacleMarker> {
        let marker = match self {
            CalibrationConfig::Marker { span_px, x_px } => ObstacleMarker {
                span_px: *span_px,
                x_px: *x_px,
            },
            CalibrationConfig::FromFile { path } => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    ProcessingError::CalibrationLoad(format!(
                        "Failed to read file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let file: MarkerFile = serde_yaml::from_str(&contents)?;

                if let (Some((width, height)), Some(w), Some(h)) = (video_size, file.width, file.height) {
                    if w != width || h != height {
                        log::warn!(
                            "Marker resolution ({}x{}) doesn't match video resolution ({}x{})",
                            w,
                            h,
                            width,
                            height
                        );
                    }
                }

                ObstacleMarker {
                    span_px: file.span_px,
                    x_px: file.x_px,
                }
            }
        };

        if !marker.span_px.is_finite() || marker.span_px <= 0.0 {
            return Err(ProcessingError::CalibrationLoad(format!(
                "Marker span must be a positive pixel count, got {}",
                marker.span_px
            )));
        }
        if let Some((width, height)) = video_size {
            if marker.x_px < 0.0 || marker.x_px > width as f64 || marker.span_px > height as f64 {
                log::warn!(
                    "Marker (span {:.1}px at x={:.1}) lies outside the {}x{} frame",
                    marker.span_px,
                    marker.x_px,
                    width,
                    height
                );
            }
        }

        Ok(marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_yaml_uses_defaults() {
        let config: ProcessingConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.airborne_threshold_px, 50.0);
        assert_eq!(config.sampling.stride, 5);
        assert_eq!(config.interval_policy, IntervalPolicy::Longest);
        assert!(config.calibration.is_none());
        assert!(!config.demo);
    }

    #[test]
    fn inline_marker_is_tagged_by_source() {
        let yaml = "calibration:\n  source: marker\n  span_px: 200.0\n  x_px: 640.0\n";
        let config: ProcessingConfig = serde_yaml::from_str(yaml).unwrap();
        let marker = config.calibration.unwrap().load(Some((1280, 720))).unwrap();
        assert_eq!(marker.span_px, 200.0);
        assert_eq!(marker.x_px, 640.0);
    }

    #[test]
    fn marker_file_is_loaded() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "span_px: 180.5").unwrap();
        writeln!(file, "x_px: 512.0").unwrap();
        writeln!(file, "width: 1920").unwrap();
        writeln!(file, "height: 1080").unwrap();
        file.flush().unwrap();

        let calibration = CalibrationConfig::FromFile {
            path: file.path().to_path_buf(),
        };
        let marker = calibration.load(None).unwrap();
        assert_eq!(marker.span_px, 180.5);
    }

    #[test]
    fn zero_span_marker_is_rejected() {
        let calibration = CalibrationConfig::Marker {
            span_px: 0.0,
            x_px: 10.0,
        };
        assert!(matches!(
            calibration.load(None),
            Err(ProcessingError::CalibrationLoad(_))
        ));
    }

    #[test]
    fn demo_flag_selects_demo_mode() {
        let config = ProcessingConfig {
            demo: true,
            ..ProcessingConfig::default()
        };
        let analyzer = config.to_analyzer_config(None).unwrap();
        assert_eq!(analyzer.mode, AnalysisMode::Demo);
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let config = ProcessingConfig {
            min_keypoint_confidence: 1.5,
            ..ProcessingConfig::default()
        };
        assert!(config.to_analyzer_config(None).is_err());
    }
}
