//! Selection gateway: the surface the request layer uses to pick a target
//! and to read the active command.
//!
//! The tracker, the last completed detection set and the last planned
//! command live behind one mutex shared with the frame loop. The loop holds
//! it for the whole update-plan-publish section, so a selection can only
//! land between cycles and takes effect from the next one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::motion::Command;
use crate::tracker::{Detection, Rect, SelectionError, Target, TargetTracker};

/// State shared between the frame loop and the selection context.
#[derive(Debug, Default)]
pub(crate) struct FollowState {
    pub(crate) tracker: TargetTracker,
    /// Detections of the most recently completed cycle, already class-filtered.
    pub(crate) last_detections: Vec<Detection>,
    pub(crate) command: Command,
    /// Target box `command` was planned from.
    pub(crate) planned_from: Option<Rect>,
}

pub(crate) type SharedState = Arc<Mutex<FollowState>>;

/// The guarded value is always fully written before any panic point.
pub(crate) fn lock(state: &SharedState) -> MutexGuard<'_, FollowState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Consistent view of target and command taken under one lock.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowSnapshot {
    pub target: Option<Target>,
    pub command: Command,
    /// Box the command was planned from. Differs from `target` when a
    /// selection landed after the last cycle.
    pub planned_from: Option<Rect>,
    pub frame_id: u64,
}

#[derive(Debug, Clone)]
pub struct SelectionGateway {
    state: SharedState,
}

impl SelectionGateway {
    pub(crate) fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Select the detection under `(x, y)` in the last processed frame.
    ///
    /// Uses the detections of the most recently completed cycle rather than
    /// running the detector again. `NotFound` leaves any held target intact.
    pub fn select_target(&self, x: f32, y: f32) -> Result<Target, SelectionError> {
        let mut state = lock(&self.state);
        let FollowState {
            tracker,
            last_detections,
            ..
        } = &mut *state;

        match tracker.select(last_detections.as_slice(), x, y) {
            Ok(target) => Ok(target),
            Err(err) => {
                info!(x, y, candidates = last_detections.len(), "no person at selection point");
                Err(err)
            }
        }
    }

    /// The command most recently produced by the planner.
    pub fn current_command(&self) -> Command {
        lock(&self.state).command
    }

    pub fn current_target(&self) -> Option<Rect> {
        lock(&self.state).tracker.current()
    }

    /// Detections a selection would currently be matched against.
    pub fn last_detections(&self) -> Vec<Detection> {
        lock(&self.state).last_detections.clone()
    }

    /// Drop the held target; the next cycle plans `Stop`.
    pub fn clear_target(&self) {
        debug!("target cleared by request");
        lock(&self.state).tracker.clear();
    }

    pub fn snapshot(&self) -> FollowSnapshot {
        let state = lock(&self.state);
        FollowSnapshot {
            target: state.tracker.target().cloned(),
            command: state.command,
            planned_from: state.planned_from,
            frame_id: state.tracker.frame_id(),
        }
    }
}
