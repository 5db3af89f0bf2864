use hurdle_core::AnalysisReport;
use std::time::Instant;

use crate::output::{FlightSummary, FrameStat, Metadata, ProcessingOutput, Summary};
use crate::types::SessionData;

/// Collects run context while a session is processed
pub struct AnalysisCollector {
    session: SessionData,
    started: Instant,
    seed: Option<u64>,
    duration_seconds: f64,
}

impl AnalysisCollector {
    pub fn new(session: SessionData) -> Self {
        Self {
            session,
            started: Instant::now(),
            seed: None,
            duration_seconds: 0.0,
        }
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }

    pub fn set_duration(&mut self, duration_seconds: f64) {
        self.duration_seconds = duration_seconds;
    }

    pub fn finalize(self, report: AnalysisReport) -> ProcessingOutput {
        let AnalysisCollector {
            session,
            started,
            seed,
            duration_seconds,
        } = self;

        let frame_stats: Vec<FrameStat> = report
            .frames
            .iter()
            .map(|entry| FrameStat {
                frame: entry.frame_index,
                timestamp: entry.timestamp_seconds,
                pose_detected: entry.pose_detected,
                ankle_height_px: entry.height_px,
                airborne: entry.airborne,
            })
            .collect();

        ProcessingOutput {
            metadata: Metadata {
                session_name: session.name.clone(),
                video_file: session.video_file.display().to_string(),
                keypoint_file: session
                    .keypoint_file
                    .as_ref()
                    .map(|p| p.display().to_string()),
                processing_timestamp: chrono::Utc::now().to_rfc3339(),
                obstacle_height_cm: session.obstacle_height_cm,
                frame_rate: report.frame_rate,
                duration_seconds,
                seed,
            },
            result: report.result,
            origin: report.origin,
            profile: report.profile,
            flight: FlightSummary {
                intervals: report.intervals,
                canonical: report.canonical_interval,
                open_takeoff_frame: report.open_takeoff_frame,
            },
            frame_stats,
            estimated_fields: report.estimated_fields,
            notes: report.notes,
            summary: Summary {
                planned_frames: report.sampler.planned,
                attempted_frames: report.sampler.attempted,
                frames_with_pose: report.frames.frames_with_pose(),
                missing_frames: report.sampler.missing(),
                cancelled: report.sampler.cancelled,
                rating: report.rating,
                remarks: report.remarks,
                processing_ms: started.elapsed().as_secs_f64() * 1000.0,
            },
        }
    }
}
