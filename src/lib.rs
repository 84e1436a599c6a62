//! Single-target visual follow.
//!
//! A target is picked from the detections of the last processed frame,
//! re-identified each frame by box overlap, and steered toward with a
//! discrete command sent to an actuator link.

pub mod config;
pub mod dispatch;
pub mod integration;
pub mod motion;
pub mod tracker;

pub use config::{ConfigError, FollowConfig, SerialConfig};
pub use dispatch::{DispatchPolicy, Dispatcher, ManualDrive, Transport, TransportError};
pub use integration::{
    DetectionBuilder, DetectionSource, FollowPipeline, Frame, FrameSource, SelectionGateway,
};
pub use motion::{Command, MotionPlanner, plan};
pub use tracker::{Detection, MatchPolicy, Rect, SelectionError, Target, TargetState, TargetTracker};
