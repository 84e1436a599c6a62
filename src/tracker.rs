mod matching;
mod rect;
mod target;
mod target_tracker;
mod track_state;

pub use matching::{
    Detection, MatchPolicy, filter_class, find_containing, find_largest, find_overlapping,
};
pub use rect::{Rect, iou_batch};
pub use target::Target;
pub use target_tracker::{SelectionError, TargetTracker, TrackerConfig};
pub use track_state::TargetState;
