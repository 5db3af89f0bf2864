pub mod parser;

pub use parser::{KeypointTrack, KeypointTrackParser};
