use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::signal::AnkleHeightSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseState {
    Grounded,
    Airborne,
}

/// One grounded → airborne → grounded excursion, bounded by the takeoff
/// frame and the touchdown frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightInterval {
    pub start_frame_index: usize,
    pub end_frame_index: usize,
}

impl FlightInterval {
    /// `None` unless `start < end`
    pub fn new(start_frame_index: usize, end_frame_index: usize) -> Option<Self> {
        (start_frame_index < end_frame_index).then_some(Self {
            start_frame_index,
            end_frame_index,
        })
    }

    pub fn frame_span(&self) -> usize {
        self.end_frame_index - self.start_frame_index
    }

    pub fn duration_secs(&self, fps: f64) -> f64 {
        self.frame_span() as f64 / fps
    }

    /// Whether `frame_index` lies in the airborne part of the interval
    pub fn contains(&self, frame_index: usize) -> bool {
        (self.start_frame_index..self.end_frame_index).contains(&frame_index)
    }
}

/// How the canonical clearance is chosen when a noisy signal yields several
/// closed intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum IntervalPolicy {
    /// Longest closed interval wins; ties go to the earliest
    #[default]
    Longest,
    First,
    /// Merge intervals separated by at most `max_gap_frames`, then take the longest
    MergeByGap { max_gap_frames: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTransition {
    Takeoff { frame_index: usize },
    Landing(FlightInterval),
}

/// Output of a completed detection pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseDetection {
    /// Closed intervals in frame order
    pub intervals: Vec<FlightInterval>,
    /// Takeoff frame of an excursion still airborne when the signal ended
    pub open_takeoff_frame: Option<usize>,
}

impl PhaseDetection {
    pub fn closed_count(&self) -> usize {
        self.intervals.len()
    }

    pub fn select(&self, policy: IntervalPolicy) -> Option<FlightInterval> {
        match policy {
            IntervalPolicy::Longest => longest(&self.intervals),
            IntervalPolicy::First => self.intervals.first().copied(),
            IntervalPolicy::MergeByGap { max_gap_frames } => {
                longest(&merge_by_gap(&self.intervals, max_gap_frames))
            }
        }
    }
}

fn longest(intervals: &[FlightInterval]) -> Option<FlightInterval> {
    intervals.iter().copied().fold(None, |best, candidate| match best {
        Some(b) if b.frame_span() >= candidate.frame_span() => Some(b),
        _ => Some(candidate),
    })
}

fn merge_by_gap(intervals: &[FlightInterval], max_gap_frames: usize) -> Vec<FlightInterval> {
    let mut merged: Vec<FlightInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(prev) if interval.start_frame_index - prev.end_frame_index <= max_gap_frames => {
                prev.end_frame_index = interval.end_frame_index;
            }
            _ => merged.push(*interval),
        }
    }
    merged
}

/// Two-state threshold machine over the ankle height signal.
///
/// Starts and is expected to finish `Grounded`; at most one interval is open
/// at a time.
#[derive(Debug, Clone)]
pub struct FlightPhaseDetector {
    state: PhaseState,
    open_takeoff: Option<usize>,
    last_frame: Option<usize>,
    intervals: Vec<FlightInterval>,
}

impl Default for FlightPhaseDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FlightPhaseDetector {
    pub fn new() -> Self {
        Self {
            state: PhaseState::Grounded,
            open_takeoff: None,
            last_frame: None,
            intervals: Vec::new(),
        }
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    /// Feeds one sample; samples must arrive in increasing frame order and
    /// out-of-order samples are ignored.
    pub fn push(&mut self, sample: &AnkleHeightSample) -> Option<PhaseTransition> {
        if let Some(last) = self.last_frame {
            if sample.frame_index <= last {
                warn!(
                    "Ignoring out-of-order sample for frame {} (last was {})",
                    sample.frame_index, last
                );
                return None;
            }
        }
        self.last_frame = Some(sample.frame_index);

        match (self.state, sample.is_airborne) {
            (PhaseState::Grounded, true) => {
                self.state = PhaseState::Airborne;
                self.open_takeoff = Some(sample.frame_index);
                debug!(target: "hurdle_core::phase", "Takeoff at frame {}", sample.frame_index);
                Some(PhaseTransition::Takeoff {
                    frame_index: sample.frame_index,
                })
            }
            (PhaseState::Airborne, false) => {
                self.state = PhaseState::Grounded;
                let start = self.open_takeoff.take()?;
                let interval = FlightInterval::new(start, sample.frame_index)?;
                self.intervals.push(interval);
                debug!(target: "hurdle_core::phase",
                    "Landing at frame {} ({} frames airborne)",
                    sample.frame_index,
                    interval.frame_span()
                );
                Some(PhaseTransition::Landing(interval))
            }
            _ => None,
        }
    }

    pub fn finish(self) -> PhaseDetection {
        if let Some(frame) = self.open_takeoff {
            warn!(
                "Signal ended while airborne; flight from frame {} is unterminated",
                frame
            );
        }
        PhaseDetection {
            intervals: self.intervals,
            open_takeoff_frame: self.open_takeoff,
        }
    }

    pub fn detect<'a>(samples: impl IntoIterator<Item = &'a AnkleHeightSample>) -> PhaseDetection {
        let mut detector = Self::new();
        for sample in samples {
            detector.push(sample);
        }
        detector.finish()
    }
}
