use std::time::{Duration, Instant};

use hurdle_core::{FramePacket, SeekError, VideoSource};

use crate::types::VideoFrame;

/// Seekable source over frames already decoded from a video file.
///
/// A seek lands on the decoded frame whose timestamp is nearest the requested
/// position.
pub struct VideoFrameSource {
    frames: Vec<VideoFrame>,
    duration: Duration,
    frame_rate: Option<f64>,
}

impl VideoFrameSource {
    /// `frames` must be in timestamp order, as the decoder produces them
    pub fn new(frames: Vec<VideoFrame>, duration: Duration, frame_rate: Option<f64>) -> Self {
        Self {
            frames,
            duration,
            frame_rate,
        }
    }

    /// Source with no frames, for runs that never touch the video
    pub fn empty() -> Self {
        Self::new(Vec::new(), Duration::ZERO, None)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn nearest(&self, position: Duration) -> Option<&VideoFrame> {
        let after = self.frames.partition_point(|f| f.timestamp < position);
        let before = after.checked_sub(1).and_then(|i| self.frames.get(i));
        match (before, self.frames.get(after)) {
            (Some(b), Some(a)) => {
                if position - b.timestamp <= a.timestamp - position {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (b, a) => b.or(a),
        }
    }
}

impl VideoSource for VideoFrameSource {
    fn duration(&self) -> Duration {
        self.duration
    }

    fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }

    fn seek(&mut self, position: Duration, timeout: Duration) -> Result<FramePacket, SeekError> {
        let started = Instant::now();
        let frame = self.nearest(position).ok_or_else(|| SeekError::Failed {
            position,
            message: "no decoded frames".to_string(),
        })?;
        if !frame.is_valid() {
            return Err(SeekError::Failed {
                position,
                message: format!("frame {} has a truncated pixel buffer", frame.index),
            });
        }
        let packet = frame.to_packet();
        if started.elapsed() > timeout {
            return Err(SeekError::Timeout { position, timeout });
        }
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn frame(index: usize, millis: u64) -> VideoFrame {
        VideoFrame::new(
            index,
            Duration::from_millis(millis),
            Arc::from(vec![0u8; 64]),
            4,
            4,
            16,
        )
    }

    fn source() -> VideoFrameSource {
        VideoFrameSource::new(
            vec![frame(0, 0), frame(5, 167), frame(10, 333)],
            Duration::from_secs(1),
            Some(30.0),
        )
    }

    #[test]
    fn seek_lands_on_nearest_frame() {
        let mut source = source();
        let timeout = Duration::from_secs(1);

        assert_eq!(source.seek(Duration::from_millis(160), timeout).unwrap().index, 5);
        assert_eq!(source.seek(Duration::from_millis(300), timeout).unwrap().index, 10);
        assert_eq!(source.seek(Duration::from_secs(5), timeout).unwrap().index, 10);
        assert_eq!(source.seek(Duration::ZERO, timeout).unwrap().index, 0);
    }

    #[test]
    fn empty_source_fails_every_seek() {
        let mut source = VideoFrameSource::empty();
        assert!(matches!(
            source.seek(Duration::ZERO, Duration::from_secs(1)),
            Err(SeekError::Failed { .. })
        ));
    }
}
