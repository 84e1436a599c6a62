//! Integration of the follow core with its external collaborators.
//!
//! The camera and the detection model stay outside the crate behind
//! [`FrameSource`] and [`DetectionSource`]; the request layer talks to the
//! loop only through [`SelectionGateway`].

mod builder;
mod detector;
mod gateway;
mod pipeline;
mod replay;

pub use builder::DetectionBuilder;
pub use detector::{AcquisitionError, DetectionSource, Frame, FrameSource};
pub use gateway::{FollowSnapshot, SelectionGateway};
pub use pipeline::{CycleOutcome, FollowPipeline, PipelineError, RunSummary, StopHandle};
pub use replay::{RecordedDetection, ReplayDetector, ReplayFeed};
