use csv::{ReaderBuilder, StringRecord, Trim};
use hurdle_core::{Keypoint, KeypointName, Pose};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::errors::{ProcessingError, Result};

/// Keypoints of the tracked athlete, keyed by video frame index
#[derive(Debug, Clone, Default)]
pub struct KeypointTrack {
    frames: BTreeMap<usize, Vec<Keypoint>>,
}

impl KeypointTrack {
    pub fn insert(&mut self, frame: usize, keypoint: Keypoint) {
        self.frames.entry(frame).or_default().push(keypoint);
    }

    /// Pose on `frame`, if the track has one with at least one usable keypoint
    pub fn pose(&self, frame: usize) -> Option<Pose> {
        let pose = Pose::new(self.frames.get(&frame)?.iter().copied());
        (!pose.is_empty()).then_some(pose)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn keypoint_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn last_frame(&self) -> Option<usize> {
        self.frames.keys().next_back().copied()
    }
}

/// Parser for keypoint tracks exported by an external pose estimator
pub struct KeypointTrackParser;

impl KeypointTrackParser {
    /// Parse a keypoint track from a CSV file
    ///
    /// Expected format:
    /// frame,name,x,y,confidence
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<KeypointTrack> {
        let file = File::open(path.as_ref()).map_err(|_| {
            ProcessingError::KeypointFileNotFound(path.as_ref().display().to_string())
        })?;
        let track = Self::parse_reader(file)?;

        log::info!(
            "Loaded {} keypoints over {} frames from {}",
            track.keypoint_count(),
            track.frame_count(),
            path.as_ref().display()
        );
        Ok(track)
    }

    pub fn parse_reader<R: Read>(reader: R) -> Result<KeypointTrack> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let mut track = KeypointTrack::default();

        for (line_number, result) in reader.records().enumerate() {
            // +1 for header, +1 for 1-based indexing
            let line = line_number + 2;
            let record = result.map_err(|e| ProcessingError::KeypointFormat {
                line,
                message: format!("CSV error: {}", e),
            })?;

            if record.len() < 5 {
                return Err(ProcessingError::KeypointFormat {
                    line,
                    message: format!("Expected 5 columns, found {}", record.len()),
                });
            }

            let frame: usize = field(&record, 0, "frame", line)?;
            let name: KeypointName = record[1].parse().map_err(|e| ProcessingError::KeypointFormat {
                line,
                message: format!("{}", e),
            })?;
            let x: f64 = field(&record, 2, "x", line)?;
            let y: f64 = field(&record, 3, "y", line)?;
            let confidence: f64 = field(&record, 4, "confidence", line)?;

            if !(0.0..=1.0).contains(&confidence) {
                return Err(ProcessingError::KeypointFormat {
                    line,
                    message: format!("Confidence {} outside [0, 1]", confidence),
                });
            }

            track.insert(frame, Keypoint::new(name, x, y, confidence));
        }

        Ok(track)
    }
}

fn field<T>(record: &StringRecord, index: usize, name: &str, line: usize) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    record[index]
        .parse()
        .map_err(|e| ProcessingError::KeypointFormat {
            line,
            message: format!("Invalid {}: {}", name, e),
        })
}
