use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameLogEntry {
    pub frame_index: usize,
    pub timestamp_seconds: f64,
    pub pose_detected: bool,
    pub height_px: Option<f64>,
    pub airborne: bool,
}

/// Per-frame trace of one sampling run
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameLog {
    entries: Vec<FrameLogEntry>,
}

impl FrameLog {
    pub fn push(&mut self, entry: FrameLogEntry) {
        if let Some(last) = self.entries.last() {
            assert!(
                entry.frame_index > last.frame_index,
                "Frame log indices must be strictly increasing"
            );
        }
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameLogEntry> {
        self.entries.iter()
    }

    pub fn frames_with_pose(&self) -> usize {
        self.entries.iter().filter(|e| e.pose_detected).count()
    }
}
