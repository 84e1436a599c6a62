//! The followed target.

use crate::tracker::matching::Detection;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TargetState;

/// The single tracked subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Current box, re-anchored to the matched detection every cycle
    pub bbox: Rect,
    /// Current lifecycle state
    pub state: TargetState,
    /// Frame sequence number of the last successful match
    pub frame_id: u64,
    /// Confidence of the detection last matched
    pub score: f32,
}

impl Target {
    /// Create a new active target from the detection it was picked from.
    pub fn from_detection(det: &Detection, frame_id: u64) -> Self {
        Self {
            bbox: det.bbox,
            state: TargetState::Active,
            frame_id,
            score: det.score,
        }
    }

    /// Raw re-anchoring onto a matched detection. No smoothing.
    pub fn re_anchor(&mut self, det: &Detection, frame_id: u64) {
        self.bbox = det.bbox;
        self.score = det.score;
        self.frame_id = frame_id;
        self.state = TargetState::Active;
    }

    pub fn mark_lost(&mut self) {
        self.state = TargetState::Lost;
    }

    pub fn is_active(&self) -> bool {
        self.state == TargetState::Active
    }
}
