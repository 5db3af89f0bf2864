use std::path::PathBuf;

/// One analysis session: a video plus an optional keypoint track
#[derive(Debug, Clone)]
pub struct SessionData {
    pub video_file: PathBuf,
    /// Per-frame keypoints produced by an external pose estimator
    pub keypoint_file: Option<PathBuf>,
    /// Obstacle height in centimeters
    pub obstacle_height_cm: f64,
    /// Session name (derived from video filename)
    pub name: String,
}

impl SessionData {
    pub fn new(video_file: PathBuf, keypoint_file: Option<PathBuf>, obstacle_height_cm: f64) -> Self {
        let name = video_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed_session")
            .to_string();

        Self {
            video_file,
            keypoint_file,
            obstacle_height_cm,
            name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_comes_from_video_stem() {
        let session = SessionData::new(PathBuf::from("/data/heat_3_lane_4.mp4"), None, 106.7);
        assert_eq!(session.name, "heat_3_lane_4");
    }
}
