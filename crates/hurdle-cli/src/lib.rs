pub mod args;
pub mod errors;
pub mod keypoints;
pub mod output;
pub mod providers;
pub mod types;
pub mod video;

use std::path::Path;

use hurdle_core::{share_model, CancelToken, HurdleAnalyzer, ObstacleProfile};
use log::{info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::errors::{ProcessingError, Result};
use crate::output::{AnalysisCollector, ProcessingOutput};
use crate::providers::{KeypointTrackModel, VideoFrameSource};
use crate::types::{ProcessingConfig, SessionData};
use crate::video::VideoDecoder;

/// Runs hurdle clearance analysis on recorded sessions
pub struct HurdleProcessor {
    config: ProcessingConfig,
}

impl HurdleProcessor {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Process one video (with an optional keypoint track) of a clearance
    /// over an obstacle `obstacle_height_cm` tall.
    ///
    /// Without a usable keypoint track, or in demo mode, the video is not
    /// decoded and the metrics are simulated from the obstacle's baseline.
    /// A keypoint file with malformed rows is an error.
    pub fn process_session<P: AsRef<Path>>(
        &self,
        video_path: P,
        keypoint_path: Option<P>,
        obstacle_height_cm: f64,
        seed: Option<u64>,
    ) -> Result<ProcessingOutput> {
        let profile = ObstacleProfile::for_height(obstacle_height_cm)?;
        let session = SessionData::new(
            video_path.as_ref().to_path_buf(),
            keypoint_path.as_ref().map(|p| p.as_ref().to_path_buf()),
            obstacle_height_cm,
        );

        info!(
            "Processing session: {} ({:?} obstacle, {:.1} cm)",
            session.name, profile.category, profile.height_cm
        );

        let model = match &session.keypoint_file {
            Some(path) => match KeypointTrackModel::from_file(path) {
                Ok(model) => Some(model),
                Err(ProcessingError::KeypointFileNotFound(path)) => {
                    warn!("Keypoint track {} not found", path);
                    None
                }
                Err(err) => return Err(err),
            },
            None => None,
        };

        let mut collector = AnalysisCollector::new(session.clone());
        collector.set_seed(seed);

        // an empty track leaves nothing to look up, so the video is never read
        let track_end = model.as_ref().and_then(|m| m.track().last_frame());
        let (mut source, video_size) = match track_end {
            Some(last_frame) if !self.config.demo => {
                VideoDecoder::init()?;
                let decoder = VideoDecoder::open(&session.video_file)?;
                let frames = decoder.decode_frames(
                    &session.video_file,
                    self.config.sampling.stride,
                    self.config.sampling.max_frames,
                )?;
                collector.set_duration(decoder.duration().as_secs_f64());
                let source = VideoFrameSource::new(frames, decoder.duration(), decoder.frame_rate());
                info!(
                    "Decoded {} sampled frames; keypoint track ends at frame {}",
                    source.frame_count(),
                    last_frame
                );
                (source, Some((decoder.width(), decoder.height())))
            }
            _ => (VideoFrameSource::empty(), None),
        };

        let marker = self
            .config
            .calibration
            .as_ref()
            .map(|calibration| calibration.load(video_size))
            .transpose()?;
        let analyzer_config = self.config.to_analyzer_config(marker)?;

        let analyzer = match model {
            Some(model) => HurdleAnalyzer::new(share_model(model), analyzer_config)?,
            None => {
                warn!("No usable keypoint track; metrics will be simulated");
                HurdleAnalyzer::without_model(analyzer_config)?
            }
        };

        let mut rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let report =
            analyzer.analyze(&mut source, obstacle_height_cm, &mut rng, &CancelToken::new())?;

        info!(
            "Session {} complete: {:?}, flight {:.3}s, confidence {:.2}, {}",
            session.name,
            report.origin,
            report.result.flight_time_sec,
            report.result.confidence,
            report.rating
        );

        Ok(collector.finalize(report))
    }
}
