//! Manual drive: press-and-hold control of the actuator.

use std::str::FromStr;

use tracing::info;

use crate::dispatch::{DispatchPolicy, Dispatcher, Transport, TransportError};
use crate::motion::Command;

/// Button transition reported by a manual-control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveAction {
    /// Button pressed: start moving.
    Start,
    /// Button released: stop.
    Stop,
}

impl FromStr for DriveAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "start" | "press" => Ok(DriveAction::Start),
            "stop" | "release" => Ok(DriveAction::Stop),
            other => Err(format!("unknown drive action `{other}`")),
        }
    }
}

/// Direct actuator control, the only path that can send `Backward`.
///
/// Owns its own dispatcher; it is never combined with a follow session.
pub struct ManualDrive {
    dispatcher: Dispatcher,
}

impl ManualDrive {
    pub fn new<T: Transport + 'static>(transport: T) -> Result<Self, TransportError> {
        Ok(Self {
            dispatcher: Dispatcher::spawn(transport, DispatchPolicy::EveryCycle)?,
        })
    }

    pub fn press(&mut self, command: Command) {
        info!(%command, "manual drive");
        self.dispatcher.send(command);
    }

    pub fn release(&mut self) {
        info!("manual stop");
        self.dispatcher.send(Command::Stop);
    }

    /// Apply a button transition for `command`.
    pub fn apply(&mut self, command: Command, action: DriveAction) {
        match action {
            DriveAction::Start => self.press(command),
            DriveAction::Stop => self.release(),
        }
    }

    /// Stop the actuator and close the link.
    pub fn shutdown(self) {
        self.dispatcher.shutdown();
    }
}
