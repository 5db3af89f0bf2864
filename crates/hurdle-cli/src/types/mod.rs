pub mod config;
pub mod session_data;
pub mod video_frame;

pub use config::*;
pub use session_data::*;
pub use video_frame::*;
