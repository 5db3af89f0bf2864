use std::sync::Arc;
use std::time::Duration;

use hurdle_core::FramePacket;

/// Decoded video frame with metadata
#[derive(Clone)]
pub struct VideoFrame {
    /// Position of the frame in decode order
    pub index: usize,
    /// Timestamp of the frame in the video
    pub timestamp: Duration,
    /// BGRA8 pixel data
    pub data: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    /// Bytes per row (stride)
    pub bytes_per_row: usize,
}

impl VideoFrame {
    pub fn new(
        index: usize,
        timestamp: Duration,
        data: Arc<[u8]>,
        width: u32,
        height: u32,
        bytes_per_row: usize,
    ) -> Self {
        Self {
            index,
            timestamp,
            data,
            width,
            height,
            bytes_per_row,
        }
    }

    pub fn expected_size(&self) -> usize {
        self.bytes_per_row * self.height as usize
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.bytes_per_row >= (self.width as usize * 4)
            && self.data.len() >= self.expected_size()
    }

    /// Packet handed to the pose model; shares the pixel buffer
    pub fn to_packet(&self) -> FramePacket {
        FramePacket {
            index: self.index,
            timestamp: self.timestamp,
            width: self.width,
            height: self.height,
            bytes_per_row: self.bytes_per_row,
            data: self.data.clone(),
        }
    }
}
