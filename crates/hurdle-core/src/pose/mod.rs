use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::errors::PoseModelError;
use crate::sampler::FramePacket;

/// Body landmarks reported by single-person pose models (COCO ordering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypointName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl KeypointName {
    pub const ALL: [KeypointName; 17] = [
        KeypointName::Nose,
        KeypointName::LeftEye,
        KeypointName::RightEye,
        KeypointName::LeftEar,
        KeypointName::RightEar,
        KeypointName::LeftShoulder,
        KeypointName::RightShoulder,
        KeypointName::LeftElbow,
        KeypointName::RightElbow,
        KeypointName::LeftWrist,
        KeypointName::RightWrist,
        KeypointName::LeftHip,
        KeypointName::RightHip,
        KeypointName::LeftKnee,
        KeypointName::RightKnee,
        KeypointName::LeftAnkle,
        KeypointName::RightAnkle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeypointName::Nose => "nose",
            KeypointName::LeftEye => "left_eye",
            KeypointName::RightEye => "right_eye",
            KeypointName::LeftEar => "left_ear",
            KeypointName::RightEar => "right_ear",
            KeypointName::LeftShoulder => "left_shoulder",
            KeypointName::RightShoulder => "right_shoulder",
            KeypointName::LeftElbow => "left_elbow",
            KeypointName::RightElbow => "right_elbow",
            KeypointName::LeftWrist => "left_wrist",
            KeypointName::RightWrist => "right_wrist",
            KeypointName::LeftHip => "left_hip",
            KeypointName::RightHip => "right_hip",
            KeypointName::LeftKnee => "left_knee",
            KeypointName::RightKnee => "right_knee",
            KeypointName::LeftAnkle => "left_ankle",
            KeypointName::RightAnkle => "right_ankle",
        }
    }
}

impl fmt::Display for KeypointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKeypoint(pub String);

impl fmt::Display for UnknownKeypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown keypoint name '{}'", self.0)
    }
}

impl std::error::Error for UnknownKeypoint {}

impl FromStr for KeypointName {
    type Err = UnknownKeypoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        KeypointName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownKeypoint(s.to_string()))
    }
}

/// A named landmark in pixel space. Smaller `y` is higher in the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: KeypointName,
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

impl Keypoint {
    pub fn new(name: KeypointName, x: f64, y: f64, confidence: f64) -> Self {
        Self {
            name,
            x,
            y,
            confidence,
        }
    }

    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// Finite coordinates and a confidence in [0, 1]
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.confidence.is_finite()
            && (0.0..=1.0).contains(&self.confidence)
    }
}

/// Keypoints of the single tracked subject in one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    keypoints: Vec<Keypoint>,
}

impl Pose {
    /// Builds a pose, dropping invalid keypoints and keeping the first
    /// occurrence of each landmark.
    pub fn new(keypoints: impl IntoIterator<Item = Keypoint>) -> Self {
        let mut kept: Vec<Keypoint> = Vec::new();
        for keypoint in keypoints {
            if keypoint.is_valid() && !kept.iter().any(|k| k.name == keypoint.name) {
                kept.push(keypoint);
            }
        }
        Self { keypoints: kept }
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn get(&self, name: KeypointName) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.name == name)
    }

    /// Landmark lookup that ignores keypoints below `min_confidence`
    pub fn visible(&self, name: KeypointName, min_confidence: f64) -> Option<&Keypoint> {
        self.get(name).filter(|k| k.confidence >= min_confidence)
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }
}

/// Single-image pose estimator.
///
/// Implementations are not required to be reentrant; callers share a model
/// through [`SharedPoseModel`], which serializes every call.
pub trait PoseModel: Send {
    fn initialize(&mut self) -> Result<(), PoseModelError>;

    /// Estimate poses in `frame`, giving up after `timeout`.
    fn estimate(
        &mut self,
        frame: &FramePacket,
        timeout: Duration,
    ) -> Result<Vec<Pose>, PoseModelError>;
}

pub type SharedPoseModel = Arc<Mutex<dyn PoseModel>>;

pub fn share_model<M: PoseModel + 'static>(model: M) -> SharedPoseModel {
    Arc::new(Mutex::new(model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypoint_names_parse_case_insensitively() {
        assert_eq!(
            "Left_Ankle".parse::<KeypointName>().unwrap(),
            KeypointName::LeftAnkle
        );
        assert_eq!(
            " right_hip ".parse::<KeypointName>().unwrap(),
            KeypointName::RightHip
        );
        assert!("left_toe".parse::<KeypointName>().is_err());
    }

    #[test]
    fn names_round_trip_through_display() {
        for name in KeypointName::ALL {
            assert_eq!(name.to_string().parse::<KeypointName>().unwrap(), name);
        }
    }

    #[test]
    fn pose_drops_invalid_and_duplicate_keypoints() {
        let pose = Pose::new([
            Keypoint::new(KeypointName::LeftAnkle, 100.0, 400.0, 0.9),
            Keypoint::new(KeypointName::LeftAnkle, 110.0, 380.0, 0.8),
            Keypoint::new(KeypointName::RightAnkle, f64::NAN, 400.0, 0.9),
            Keypoint::new(KeypointName::LeftHip, 120.0, 250.0, 1.5),
        ]);

        assert_eq!(pose.len(), 1);
        assert_eq!(pose.get(KeypointName::LeftAnkle).unwrap().x, 100.0);
        assert!(pose.get(KeypointName::RightAnkle).is_none());
    }

    #[test]
    fn visible_applies_confidence_floor() {
        let pose = Pose::new([Keypoint::new(KeypointName::Nose, 1.0, 2.0, 0.2)]);
        assert!(pose.visible(KeypointName::Nose, 0.1).is_some());
        assert!(pose.visible(KeypointName::Nose, 0.3).is_none());
    }
}
