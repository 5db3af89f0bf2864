pub mod keypoints;
pub mod video;

pub use keypoints::KeypointTrackModel;
pub use video::VideoFrameSource;
