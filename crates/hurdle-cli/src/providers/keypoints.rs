use std::path::{Path, PathBuf};
use std::time::Duration;

use hurdle_core::{FramePacket, Pose, PoseModel, PoseModelError};

use crate::errors::Result;
use crate::keypoints::{KeypointTrack, KeypointTrackParser};

/// Pose model backed by a precomputed keypoint track.
///
/// Poses come from an external estimator run ahead of time; inference is a
/// lookup on the sampled frame index. Frames absent from the track yield no
/// pose.
pub struct KeypointTrackModel {
    source: Option<PathBuf>,
    track: KeypointTrack,
    ready: bool,
}

impl KeypointTrackModel {
    pub fn new(track: KeypointTrack) -> Self {
        Self {
            source: None,
            track,
            ready: false,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let track = KeypointTrackParser::parse_file(path.as_ref())?;
        Ok(Self {
            source: Some(path.as_ref().to_path_buf()),
            ..Self::new(track)
        })
    }

    pub fn track(&self) -> &KeypointTrack {
        &self.track
    }
}

impl PoseModel for KeypointTrackModel {
    fn initialize(&mut self) -> std::result::Result<(), PoseModelError> {
        if self.track.is_empty() {
            return Err(PoseModelError::Initialization(format!(
                "keypoint track {} has no frames",
                self.source
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<memory>".to_string())
            )));
        }
        self.ready = true;
        Ok(())
    }

    fn estimate(
        &mut self,
        frame: &FramePacket,
        _timeout: Duration,
    ) -> std::result::Result<Vec<Pose>, PoseModelError> {
        if !self.ready {
            return Err(PoseModelError::NotReady);
        }
        Ok(self.track.pose(frame.index).into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hurdle_core::{Keypoint, KeypointName};
    use std::sync::Arc;

    fn packet(index: usize) -> FramePacket {
        FramePacket {
            index,
            timestamp: Duration::ZERO,
            width: 4,
            height: 4,
            bytes_per_row: 16,
            data: Arc::from(vec![0u8; 64]),
        }
    }

    #[test]
    fn estimate_requires_initialization() {
        let mut track = KeypointTrack::default();
        track.insert(10, Keypoint::new(KeypointName::LeftAnkle, 1.0, 2.0, 0.9));
        let mut model = KeypointTrackModel::new(track);

        assert_eq!(
            model.estimate(&packet(10), Duration::from_millis(10)),
            Err(PoseModelError::NotReady)
        );
        model.initialize().unwrap();
        assert_eq!(model.estimate(&packet(10), Duration::from_millis(10)).unwrap().len(), 1);
        assert!(model.estimate(&packet(11), Duration::from_millis(10)).unwrap().is_empty());
    }

    #[test]
    fn empty_track_fails_initialization() {
        let mut model = KeypointTrackModel::new(KeypointTrack::default());
        assert!(matches!(
            model.initialize(),
            Err(PoseModelError::Initialization(_))
        ));
    }
}
