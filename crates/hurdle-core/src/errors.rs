use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the analysis pipeline
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

/// Failure to position a video source on a requested timestamp
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeekError {
    #[error("seek to {position:?} did not complete within {timeout:?}")]
    Timeout { position: Duration, timeout: Duration },

    #[error("seek to {position:?} failed: {message}")]
    Failed { position: Duration, message: String },
}

/// Failures reported by a pose estimation backend
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PoseModelError {
    #[error("pose model failed to initialize: {0}")]
    Initialization(String),

    #[error("pose model is not initialized")]
    NotReady,

    #[error("inference on frame {frame_index} failed: {message}")]
    Inference { frame_index: usize, message: String },

    #[error("inference on frame {frame_index} exceeded {timeout:?}")]
    Timeout { frame_index: usize, timeout: Duration },

    #[error("pose model lock was poisoned by a panicking caller")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
