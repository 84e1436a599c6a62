//! Steering: the command vocabulary and the planner that derives it.

mod command;
mod planner;

pub use command::{Command, UnknownToken};
pub use planner::{MotionPlanner, plan};
