use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::pose::{KeypointName, Pose};

/// Ankle height above which a frame counts as airborne, in sampled pixels
pub const DEFAULT_AIRBORNE_THRESHOLD_PX: f64 = 50.0;

/// Ground-referenced ankle height for one sampled frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnkleHeightSample {
    pub frame_index: usize,
    /// Never negative
    pub height_px: f64,
    pub is_airborne: bool,
    /// Horizontal position of the feet (hips when no ankle is visible)
    pub anchor_x_px: Option<f64>,
}

/// Reduces a pose to a single "height above ground" scalar.
///
/// No lens or perspective correction is applied: the bottom edge of the frame
/// is treated as ground level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnkleHeightExtractor {
    pub airborne_threshold_px: f64,
    /// Keypoints below this confidence are treated as absent
    pub min_keypoint_confidence: f64,
    /// Replaces the decoded frame height as the ground line
    pub frame_height_override: Option<f64>,
}

impl Default for AnkleHeightExtractor {
    fn default() -> Self {
        Self {
            airborne_threshold_px: DEFAULT_AIRBORNE_THRESHOLD_PX,
            min_keypoint_confidence: 0.0,
            frame_height_override: None,
        }
    }
}

impl AnkleHeightExtractor {
    pub fn new(airborne_threshold_px: f64) -> Self {
        Self {
            airborne_threshold_px,
            ..Self::default()
        }
    }

    /// Height of the higher ankle above the bottom of the frame, 0 without ankles
    pub fn height_px(&self, pose: Option<&Pose>, frame_height: f64) -> f64 {
        let Some(pose) = pose else {
            return 0.0;
        };
        let ground = self.frame_height_override.unwrap_or(frame_height);

        let min_ankle_y = [KeypointName::LeftAnkle, KeypointName::RightAnkle]
            .into_iter()
            .filter_map(|name| pose.visible(name, self.min_keypoint_confidence))
            .map(|k| k.y)
            .fold(None, |acc: Option<f64>, y| Some(acc.map_or(y, |m| m.min(y))));

        match min_ankle_y {
            Some(y) => (ground - y).max(0.0),
            None => 0.0,
        }
    }

    pub fn is_airborne(&self, height_px: f64) -> bool {
        height_px > self.airborne_threshold_px
    }

    pub fn extract(&self, frame_index: usize, pose: Option<&Pose>, frame_height: f64) -> AnkleHeightSample {
        let height_px = self.height_px(pose, frame_height);
        AnkleHeightSample {
            frame_index,
            height_px,
            is_airborne: self.is_airborne(height_px),
            anchor_x_px: pose.and_then(|p| self.anchor_x(p)),
        }
    }

    /// Midpoint of the visible ankles, falling back to the hips
    fn anchor(&self, pose: &Pose) -> Option<Point2<f64>> {
        let midpoint = |names: [KeypointName; 2]| {
            let points: Vec<Point2<f64>> = names
                .into_iter()
                .filter_map(|name| pose.visible(name, self.min_keypoint_confidence))
                .map(|k| k.position())
                .collect();
            match points.as_slice() {
                [] => None,
                [only] => Some(*only),
                [a, b, ..] => Some(nalgebra::center(a, b)),
            }
        };

        midpoint([KeypointName::LeftAnkle, KeypointName::RightAnkle])
            .or_else(|| midpoint([KeypointName::LeftHip, KeypointName::RightHip]))
    }

    pub fn anchor_x(&self, pose: &Pose) -> Option<f64> {
        self.anchor(pose).map(|p| p.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Keypoint;
    use approx::assert_relative_eq;

    fn ankles(left_y: Option<f64>, right_y: Option<f64>) -> Pose {
        let mut keypoints = vec![Keypoint::new(KeypointName::Nose, 320.0, 80.0, 0.95)];
        if let Some(y) = left_y {
            keypoints.push(Keypoint::new(KeypointName::LeftAnkle, 300.0, y, 0.9));
        }
        if let Some(y) = right_y {
            keypoints.push(Keypoint::new(KeypointName::RightAnkle, 340.0, y, 0.6));
        }
        Pose::new(keypoints)
    }

    #[test]
    fn no_pose_is_ground_level() {
        let extractor = AnkleHeightExtractor::default();
        assert_eq!(extractor.height_px(None, 480.0), 0.0);
    }

    #[test]
    fn pose_without_ankles_is_ground_level() {
        let extractor = AnkleHeightExtractor::default();
        let sample = extractor.extract(3, Some(&ankles(None, None)), 480.0);
        assert_eq!(sample.height_px, 0.0);
        assert!(!sample.is_airborne);
        assert!(sample.anchor_x_px.is_none());
    }

    #[test]
    fn uses_the_higher_ankle() {
        let extractor = AnkleHeightExtractor::default();
        let pose = ankles(Some(400.0), Some(350.0));
        assert_relative_eq!(extractor.height_px(Some(&pose), 480.0), 130.0);
    }

    #[test]
    fn single_ankle_is_enough() {
        let extractor = AnkleHeightExtractor::default();
        let pose = ankles(None, Some(455.0));
        assert_relative_eq!(extractor.height_px(Some(&pose), 480.0), 25.0);
    }

    #[test]
    fn height_is_clamped_at_zero() {
        let extractor = AnkleHeightExtractor::default();
        let pose = ankles(Some(500.0), None);
        assert_eq!(extractor.height_px(Some(&pose), 480.0), 0.0);
    }

    #[test]
    fn threshold_is_strict() {
        let extractor = AnkleHeightExtractor::default();
        assert!(!extractor.is_airborne(50.0));
        assert!(extractor.is_airborne(50.5));
    }

    #[test]
    fn frame_height_override_moves_ground_line() {
        let extractor = AnkleHeightExtractor {
            frame_height_override: Some(480.0),
            ..AnkleHeightExtractor::default()
        };
        let pose = ankles(Some(400.0), None);
        assert_relative_eq!(extractor.height_px(Some(&pose), 1080.0), 80.0);
    }

    #[test]
    fn low_confidence_ankle_is_ignored() {
        let extractor = AnkleHeightExtractor {
            min_keypoint_confidence: 0.7,
            ..AnkleHeightExtractor::default()
        };
        let pose = ankles(Some(420.0), Some(300.0));
        assert_relative_eq!(extractor.height_px(Some(&pose), 480.0), 60.0);
    }

    #[test]
    fn anchor_prefers_ankles_then_hips() {
        let extractor = AnkleHeightExtractor::default();
        let pose = ankles(Some(400.0), Some(410.0));
        assert_relative_eq!(extractor.anchor_x(&pose).unwrap(), 320.0);
        assert_relative_eq!(extractor.anchor(&pose).unwrap().y, 405.0);
        let one_foot = ankles(Some(400.0), None);
        assert_relative_eq!(extractor.anchor_x(&one_foot).unwrap(), 300.0);

        let hips = Pose::new([
            Keypoint::new(KeypointName::LeftHip, 200.0, 250.0, 0.8),
            Keypoint::new(KeypointName::RightHip, 220.0, 250.0, 0.8),
        ]);
        assert_relative_eq!(extractor.anchor_x(&hips).unwrap(), 210.0);
    }
}
