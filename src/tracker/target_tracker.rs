//! Single-target tracker: explicit selection, overlap re-identification.
//!
//! Re-identification is purely reactive. The held box is replaced by the
//! overlapping detection each cycle with no motion prediction, so during an
//! occlusion the target can hand off to a nearby object that overlaps it.
//! That is inherent to the overlap rule and is not corrected here.

use thiserror::Error;
use tracing::{debug, info};

use crate::tracker::matching::{self, Detection, MatchPolicy};
use crate::tracker::rect::Rect;
use crate::tracker::target::Target;
use crate::tracker::track_state::TargetState;

/// Configuration for the [`TargetTracker`].
#[derive(Debug, Clone, Default)]
pub struct TrackerConfig {
    /// Tie-break when several boxes contain a selection point.
    pub select_policy: MatchPolicy,
    /// Tie-break when several boxes overlap the held target.
    pub update_policy: MatchPolicy,
    /// Adopt the largest detection when no target is held.
    pub auto_acquire: bool,
}

/// A selection point matched no detection.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SelectionError {
    #[error("no detection contains point ({x}, {y})")]
    NotFound { x: f32, y: f32 },
}

#[derive(Debug, Clone, Default)]
pub struct TargetTracker {
    target: Option<Target>,
    frame_id: u64,
    config: TrackerConfig,
}

impl TargetTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            target: None,
            frame_id: 0,
            config,
        }
    }

    /// Pick the detection containing `(x, y)` and install it as the target,
    /// replacing any previous one. On `NotFound` the held target is untouched.
    pub fn select(
        &mut self,
        detections: &[Detection],
        x: f32,
        y: f32,
    ) -> Result<Target, SelectionError> {
        let idx = matching::find_containing(detections, x, y, self.config.select_policy)
            .ok_or(SelectionError::NotFound { x, y })?;

        let target = Target::from_detection(&detections[idx], self.frame_id);
        info!(bbox = ?target.bbox.to_tlbr(), score = target.score, "target selected");
        self.target = Some(target.clone());
        Ok(target)
    }

    /// Re-identify the held target against a new detection set.
    ///
    /// Advances the cycle counter. Without a held target this only counts the
    /// cycle and reports `Lost`. When nothing overlaps, the target is cleared
    /// in the same cycle.
    pub fn update(&mut self, detections: &[Detection]) -> TargetState {
        self.frame_id += 1;

        let Some(target) = self.target.as_mut() else {
            return TargetState::Lost;
        };

        match matching::find_overlapping(&target.bbox, detections, self.config.update_policy) {
            Some(idx) => {
                target.re_anchor(&detections[idx], self.frame_id);
                debug!(frame = self.frame_id, bbox = ?target.bbox.to_tlbr(), "target re-anchored");
                TargetState::Active
            }
            None => {
                target.mark_lost();
                info!(
                    frame = self.frame_id,
                    last_seen = target.frame_id,
                    "target lost"
                );
                self.target = None;
                TargetState::Lost
            }
        }
    }

    /// Adopt the largest detection as the target if none is held and
    /// auto-acquire is enabled.
    pub fn acquire(&mut self, detections: &[Detection]) -> Option<&Target> {
        if self.target.is_none() && self.config.auto_acquire {
            if let Some(idx) = matching::find_largest(detections) {
                let target = Target::from_detection(&detections[idx], self.frame_id);
                info!(bbox = ?target.bbox.to_tlbr(), "target auto-acquired");
                self.target = Some(target);
            }
        }
        self.target.as_ref()
    }

    /// Snapshot of the held target's box.
    pub fn current(&self) -> Option<Rect> {
        self.target.as_ref().map(|t| t.bbox)
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn state(&self) -> TargetState {
        self.target.as_ref().map_or(TargetState::Lost, |t| t.state)
    }

    /// Number of cycles processed so far.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn clear(&mut self) {
        self.target = None;
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection::new(x1, y1, x2, y2, 0, 0.9)
    }

    #[test]
    fn test_select_single_containing_box() {
        let mut tracker = TargetTracker::default();
        let dets = vec![det(0.0, 0.0, 50.0, 50.0), det(100.0, 100.0, 150.0, 200.0)];

        let target = tracker.select(&dets, 120.0, 150.0).unwrap();
        assert_eq!(target.state, TargetState::Active);
        assert_eq!(target.bbox.to_tlbr(), [100.0, 100.0, 150.0, 200.0]);
        assert_eq!(tracker.current(), Some(dets[1].bbox));
    }

    #[test]
    fn test_select_not_found_keeps_target() {
        let mut tracker = TargetTracker::default();
        let dets = vec![det(0.0, 0.0, 50.0, 50.0)];
        tracker.select(&dets, 10.0, 10.0).unwrap();

        let err = tracker.select(&dets, 300.0, 300.0).unwrap_err();
        assert_eq!(err, SelectionError::NotFound { x: 300.0, y: 300.0 });
        assert_eq!(tracker.current(), Some(dets[0].bbox));
    }

    #[test]
    fn test_select_replaces_previous_target() {
        let mut tracker = TargetTracker::default();
        let dets = vec![det(0.0, 0.0, 50.0, 50.0), det(200.0, 0.0, 250.0, 50.0)];
        tracker.select(&dets, 10.0, 10.0).unwrap();
        tracker.select(&dets, 210.0, 10.0).unwrap();
        assert_eq!(tracker.current(), Some(dets[1].bbox));
    }

    #[test]
    fn test_update_re_anchors_raw() {
        let mut tracker = TargetTracker::default();
        tracker.select(&[det(100.0, 100.0, 150.0, 200.0)], 120.0, 150.0).unwrap();

        let next = vec![det(110.0, 105.0, 160.0, 205.0), det(250.0, 0.0, 300.0, 60.0)];
        assert_eq!(tracker.update(&next), TargetState::Active);
        let target = tracker.target().unwrap();
        assert_eq!(target.bbox.to_tlbr(), [110.0, 105.0, 160.0, 205.0]);
        assert_eq!(target.frame_id, 1);
    }

    #[test]
    fn test_update_loses_and_clears() {
        let mut tracker = TargetTracker::default();
        tracker.select(&[det(100.0, 100.0, 150.0, 200.0)], 120.0, 150.0).unwrap();

        assert_eq!(tracker.update(&[det(250.0, 0.0, 300.0, 60.0)]), TargetState::Lost);
        assert!(tracker.current().is_none());
        assert_eq!(tracker.state(), TargetState::Lost);
    }

    #[test]
    fn test_update_without_target_is_noop() {
        let mut tracker = TargetTracker::default();
        assert_eq!(tracker.update(&[det(0.0, 0.0, 10.0, 10.0)]), TargetState::Lost);
        assert!(tracker.current().is_none());
        assert_eq!(tracker.frame_id(), 1);
    }

    #[test]
    fn test_update_idempotent_on_same_set() {
        let mut tracker = TargetTracker::default();
        tracker.select(&[det(100.0, 100.0, 150.0, 200.0)], 120.0, 150.0).unwrap();
        let next = vec![det(110.0, 105.0, 160.0, 205.0)];

        tracker.update(&next);
        let first = tracker.current();
        tracker.update(&next);
        assert_eq!(tracker.current(), first);
        assert_eq!(tracker.state(), TargetState::Active);
    }

    #[test]
    fn test_acquire_only_when_enabled_and_empty() {
        let dets = vec![det(0.0, 0.0, 10.0, 10.0), det(50.0, 50.0, 90.0, 90.0)];

        let mut off = TargetTracker::default();
        assert!(off.acquire(&dets).is_none());

        let mut on = TargetTracker::new(TrackerConfig {
            auto_acquire: true,
            ..Default::default()
        });
        assert_eq!(on.acquire(&dets).map(|t| t.bbox), Some(dets[1].bbox));

        // A held target is never replaced by acquisition
        on.select(&dets, 5.0, 5.0).unwrap();
        assert_eq!(on.acquire(&dets).map(|t| t.bbox), Some(dets[0].bbox));
    }
}
