use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, PoseModelError, SeekError};
use crate::pose::{Pose, SharedPoseModel};
use crate::time::{Budget, Clock, SystemClock};

/// Frame rate assumed when neither the configuration nor the source provides one
pub const DEFAULT_FRAME_RATE: f64 = 30.0;
pub const DEFAULT_FRAME_STRIDE: usize = 5;
pub const DEFAULT_MAX_FRAMES: usize = 150;

/// Position of one sampled frame on the video timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub index: usize,
    pub timestamp_seconds: f64,
}

/// Decoded image handed to the pose model
#[derive(Debug, Clone)]
pub struct FramePacket {
    pub index: usize,
    pub timestamp: Duration,
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: usize,
    pub data: Arc<[u8]>,
}

/// Seekable video with a single playback cursor.
pub trait VideoSource {
    fn duration(&self) -> Duration;

    /// Native frame rate when the container reports one
    fn frame_rate(&self) -> Option<f64>;

    /// Move the cursor to `position` and return the frame found there.
    fn seek(&mut self, position: Duration, timeout: Duration) -> Result<FramePacket, SeekError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Overrides the frame rate reported by the source
    #[serde(default)]
    pub frame_rate: Option<f64>,
    /// Sample every Nth frame
    #[serde(default = "default_stride")]
    pub stride: usize,
    /// Frame index cap (exclusive)
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,
    #[serde(default = "default_seek_timeout", with = "millis")]
    pub seek_timeout: Duration,
    #[serde(default = "default_inference_timeout", with = "millis")]
    pub inference_timeout: Duration,
}

fn default_stride() -> usize {
    DEFAULT_FRAME_STRIDE
}

fn default_max_frames() -> usize {
    DEFAULT_MAX_FRAMES
}

fn default_seek_timeout() -> Duration {
    Duration::from_millis(500)
}

fn default_inference_timeout() -> Duration {
    Duration::from_millis(1_000)
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            frame_rate: None,
            stride: DEFAULT_FRAME_STRIDE,
            max_frames: DEFAULT_MAX_FRAMES,
            seek_timeout: default_seek_timeout(),
            inference_timeout: default_inference_timeout(),
        }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.stride == 0 {
            return Err(AnalysisError::Validation(
                "sampling stride must be at least 1".to_string(),
            ));
        }
        if let Some(fps) = self.frame_rate {
            if !fps.is_finite() || fps <= 0.0 {
                return Err(AnalysisError::Validation(format!(
                    "frame rate override must be positive, got {fps}"
                )));
            }
        }
        if self.seek_timeout.is_zero() || self.inference_timeout.is_zero() {
            return Err(AnalysisError::Validation(
                "seek and inference timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective frame rate: override, then the source's own rate, then 30 fps
    pub fn resolve_frame_rate(&self, reported: Option<f64>) -> f64 {
        self.frame_rate
            .or(reported)
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .unwrap_or(DEFAULT_FRAME_RATE)
    }
}

/// Cooperative cancellation shared between a caller and a running analysis
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A frame whose seek and inference both completed
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub frame: Frame,
    pub frame_height: u32,
    pub poses: Vec<Pose>,
}

impl SampledFrame {
    /// The tracked subject; extra detections are ignored
    pub fn primary_pose(&self) -> Option<&Pose> {
        self.poses.first()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerStats {
    /// Stride positions below the frame limit, sampled or not
    pub planned: usize,
    pub attempted: usize,
    pub missing_seek: usize,
    pub missing_inference: usize,
    pub cancelled: bool,
}

impl SamplerStats {
    pub fn completed(&self) -> usize {
        self.attempted - self.missing_seek - self.missing_inference
    }

    pub fn missing(&self) -> usize {
        self.missing_seek + self.missing_inference
    }
}

/// Walks a video at a fixed stride, pairing each frame with pose inference.
///
/// The sampler borrows the source mutably for its whole lifetime, so nothing
/// else can move the playback cursor while a run is in progress. Frames whose
/// seek or inference fails are skipped and counted in [`SamplerStats`].
pub struct FrameSampler<'a, S: VideoSource, C: Clock = SystemClock> {
    source: &'a mut S,
    model: SharedPoseModel,
    config: SamplingConfig,
    cancel: CancelToken,
    clock: C,
    frame_rate: f64,
    frame_limit: usize,
    next_index: usize,
    stats: SamplerStats,
}

impl<'a, S: VideoSource> FrameSampler<'a, S, SystemClock> {
    pub fn new(
        source: &'a mut S,
        model: SharedPoseModel,
        config: SamplingConfig,
        cancel: CancelToken,
    ) -> Self {
        Self::with_clock(source, model, config, cancel, SystemClock::default())
    }
}

impl<'a, S: VideoSource, C: Clock> FrameSampler<'a, S, C> {
    pub fn with_clock(
        source: &'a mut S,
        model: SharedPoseModel,
        config: SamplingConfig,
        cancel: CancelToken,
        clock: C,
    ) -> Self {
        let frame_rate = config.resolve_frame_rate(source.frame_rate());
        let total_frames = (source.duration().as_secs_f64() * frame_rate).floor() as usize;
        let frame_limit = total_frames.min(config.max_frames);
        let planned = frame_limit.div_ceil(config.stride.max(1));

        debug!(target: "hurdle_core::sampler",
            "Sampling up to frame {} of {} at {:.2} fps (stride {})",
            frame_limit, total_frames, frame_rate, config.stride
        );

        Self {
            source,
            model,
            config,
            cancel,
            clock,
            frame_rate,
            frame_limit,
            next_index: 0,
            stats: SamplerStats {
                planned,
                ..SamplerStats::default()
            },
        }
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Exclusive upper bound on sampled frame indices
    pub fn frame_limit(&self) -> usize {
        self.frame_limit
    }

    /// Number of stride positions the full run would visit
    pub fn planned_positions(&self) -> usize {
        self.stats.planned
    }

    pub fn stats(&self) -> SamplerStats {
        self.stats
    }

    fn infer(&mut self, packet: &FramePacket) -> Result<Vec<Pose>, PoseModelError> {
        let mut model = self.model.lock().map_err(|_| PoseModelError::Poisoned)?;
        let budget = Budget::start(&mut self.clock, self.config.inference_timeout);
        let poses = model.estimate(packet, budget.limit())?;
        if budget.exceeded(&mut self.clock) {
            return Err(PoseModelError::Timeout {
                frame_index: packet.index,
                timeout: budget.limit(),
            });
        }
        Ok(poses)
    }
}

impl<S: VideoSource, C: Clock> Iterator for FrameSampler<'_, S, C> {
    type Item = SampledFrame;

    fn next(&mut self) -> Option<SampledFrame> {
        loop {
            if self.next_index >= self.frame_limit {
                return None;
            }
            if self.cancel.is_cancelled() {
                if !self.stats.cancelled {
                    warn!(
                        "Sampling cancelled before frame {}; keeping {} completed frames",
                        self.next_index,
                        self.stats.completed()
                    );
                }
                self.stats.cancelled = true;
                return None;
            }

            let index = self.next_index;
            self.next_index += self.config.stride.max(1);
            self.stats.attempted += 1;

            let position = Duration::from_secs_f64(index as f64 / self.frame_rate);
            let mut packet = match self.source.seek(position, self.config.seek_timeout) {
                Ok(packet) => packet,
                Err(err) => {
                    warn!("Skipping frame {}: {}", index, err);
                    self.stats.missing_seek += 1;
                    continue;
                }
            };
            if packet.index != index {
                debug!(target: "hurdle_core::sampler",
                    "Seek for frame {} landed on frame {}", index, packet.index
                );
                packet.index = index;
            }

            let poses = match self.infer(&packet) {
                Ok(poses) => poses,
                Err(err) => {
                    warn!("Skipping frame {}: {}", index, err);
                    self.stats.missing_inference += 1;
                    continue;
                }
            };

            debug!(target: "hurdle_core::sampler",
                "Frame {} at {:.3}s: {} pose(s)",
                index,
                position.as_secs_f64(),
                poses.len()
            );

            return Some(SampledFrame {
                frame: Frame {
                    index,
                    timestamp_seconds: position.as_secs_f64(),
                },
                frame_height: packet.height,
                poses,
            });
        }
    }
}

impl<S: VideoSource, C: Clock> FusedIterator for FrameSampler<'_, S, C> {}
