use hurdle_core::AnalysisError;
use thiserror::Error;

/// Errors that can occur while processing a hurdle session
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Failed to decode video: {0}")]
    VideoDecoding(String),

    #[error("Video file not found: {0}")]
    VideoFileNotFound(String),

    #[error("No frames found in video")]
    NoFrames,

    #[error("Keypoint file format error at line {line}: {message}")]
    KeypointFormat { line: usize, message: String },

    #[error("Keypoint file not found: {0}")]
    KeypointFileNotFound(String),

    #[error("Failed to load calibration: {0}")]
    CalibrationLoad(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ProcessingError>;
