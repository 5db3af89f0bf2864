use ffmpeg_next as ffmpeg;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{ProcessingError, Result};
use crate::types::VideoFrame;

/// Video decoder using FFmpeg
pub struct VideoDecoder {
    width: u32,
    height: u32,
    frame_rate: f64,
    duration: Duration,
}

impl VideoDecoder {
    /// Initialize FFmpeg (call once at program start)
    pub fn init() -> Result<()> {
        ffmpeg::init().map_err(|e| {
            ProcessingError::VideoDecoding(format!("Failed to initialize FFmpeg: {}", e))
        })
    }

    /// Open a video file and read its stream properties
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let input = ffmpeg::format::input(&path).map_err(|e| {
            ProcessingError::VideoFileNotFound(format!("{}: {}", path.as_ref().display(), e))
        })?;

        let video_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| ProcessingError::VideoDecoding("No video stream found".to_string()))?;

        let video_codec_context = ffmpeg::codec::context::Context::from_parameters(
            video_stream.parameters(),
        )
        .map_err(|e| {
            ProcessingError::VideoDecoding(format!("Failed to create codec context: {}", e))
        })?;

        let decoder = video_codec_context.decoder().video().map_err(|e| {
            ProcessingError::VideoDecoding(format!("Failed to create decoder: {}", e))
        })?;

        let width = decoder.width();
        let height = decoder.height();
        let frame_rate = video_stream.avg_frame_rate();
        let frame_rate_f64 = if frame_rate.denominator() == 0 {
            0.0
        } else {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        };

        let stream_secs = video_stream.duration() as f64 * f64::from(video_stream.time_base());
        // Some containers only report a duration for the whole file
        let duration_secs = if stream_secs.is_finite() && stream_secs > 0.0 {
            stream_secs
        } else {
            (input.duration() as f64 * f64::from(ffmpeg::rescale::TIME_BASE)).max(0.0)
        };
        let duration = Duration::from_secs_f64(duration_secs);

        log::info!(
            "Opened video: {}x{} @ {:.2} fps, duration: {:.2}s",
            width,
            height,
            frame_rate_f64,
            duration_secs
        );

        Ok(Self {
            width,
            height,
            frame_rate: frame_rate_f64,
            duration,
        })
    }

    /// Decode every `stride`th frame below `max_frames`; the rest are dropped
    /// right after decoding.
    pub fn decode_frames<P: AsRef<Path>>(
        &self,
        path: P,
        stride: usize,
        max_frames: usize,
    ) -> Result<Vec<VideoFrame>> {
        let stride = stride.max(1);
        let mut input = ffmpeg::format::input(&path).map_err(|e| {
            ProcessingError::VideoDecoding(format!("Failed to reopen video: {}", e))
        })?;

        let video_stream_index = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| ProcessingError::VideoDecoding("No video stream found".to_string()))?
            .index();

        let video_stream = input.stream(video_stream_index).ok_or_else(|| {
            ProcessingError::VideoDecoding("Video stream not found".to_string())
        })?;

        let time_base = video_stream.time_base();
        // AV_NOPTS_VALUE is i64::MIN, so a missing start time clamps to zero
        let start_pts = video_stream.start_time().max(0);

        let video_codec_context = ffmpeg::codec::context::Context::from_parameters(
            video_stream.parameters(),
        )
        .map_err(|e| {
            ProcessingError::VideoDecoding(format!("Failed to create codec context: {}", e))
        })?;

        let mut decoder = video_codec_context.decoder().video().map_err(|e| {
            ProcessingError::VideoDecoding(format!("Failed to create decoder: {}", e))
        })?;

        let mut scaler = ffmpeg::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::format::Pixel::BGRA,
            self.width,
            self.height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| ProcessingError::VideoDecoding(format!("Failed to create scaler: {}", e)))?;

        let mut frames = Vec::new();
        let mut decoded_count = 0usize;

        // Returns false once the decoder has nothing more to hand out
        let mut drain = |decoder: &mut ffmpeg::decoder::Video,
                         frames: &mut Vec<VideoFrame>|
         -> Result<bool> {
            let mut decoded = ffmpeg::frame::Video::empty();
            match decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    let index = decoded_count;
                    decoded_count += 1;
                    if index >= max_frames || index % stride != 0 {
                        return Ok(true);
                    }

                    let timestamp = decoded.timestamp().unwrap_or(start_pts).saturating_sub(start_pts);
                    let timestamp_secs = (timestamp as f64 * f64::from(time_base)).max(0.0);
                    let timestamp = Duration::from_secs_f64(timestamp_secs);

                    let mut bgra_frame = ffmpeg::frame::Video::empty();
                    scaler.run(&decoded, &mut bgra_frame).map_err(|e| {
                        ProcessingError::VideoDecoding(format!("Failed to scale frame: {}", e))
                    })?;

                    let bytes_per_row = bgra_frame.stride(0);
                    let data: Arc<[u8]> = Arc::from(bgra_frame.data(0).to_vec());

                    frames.push(VideoFrame::new(
                        index,
                        timestamp,
                        data,
                        self.width,
                        self.height,
                        bytes_per_row,
                    ));
                    Ok(true)
                }
                Err(ffmpeg::Error::Eof) => Ok(false),
                Err(ffmpeg::Error::Other {
                    errno: ffmpeg::error::EAGAIN,
                }) => Ok(false),
                Err(e) => Err(ProcessingError::VideoDecoding(format!(
                    "Failed to receive frame: {}",
                    e
                ))),
            }
        };

        for (stream, packet) in input.packets() {
            if stream.index() != video_stream_index {
                continue;
            }
            decoder.send_packet(&packet).map_err(|e| {
                ProcessingError::VideoDecoding(format!("Failed to send packet: {}", e))
            })?;

            while drain(&mut decoder, &mut frames)? {}

            if frames.last().is_some_and(|f| f.index + stride >= max_frames) {
                log::debug!("Reached frame cap of {}, stopping decode", max_frames);
                break;
            }
        }

        // Flush decoder
        decoder.send_eof().map_err(|e| {
            ProcessingError::VideoDecoding(format!("Failed to send EOF: {}", e))
        })?;

        while drain(&mut decoder, &mut frames)? {}

        if frames.is_empty() {
            return Err(ProcessingError::NoFrames);
        }

        log::info!("Kept {} frames (stride {})", frames.len(), stride);
        Ok(frames)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Average frame rate; `None` when the container does not report one
    pub fn frame_rate(&self) -> Option<f64> {
        (self.frame_rate.is_finite() && self.frame_rate > 0.0).then_some(self.frame_rate)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
