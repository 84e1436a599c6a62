use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discrete steering directive sent to the actuator.
///
/// `Backward` is never produced by the planner; only manual drive sends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    #[default]
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown command token {0:#04x}")]
pub struct UnknownToken(pub u8);

impl Command {
    /// Single ASCII wire token.
    pub const fn token(self) -> u8 {
        match self {
            Command::Forward => b'F',
            Command::Backward => b'B',
            Command::Left => b'L',
            Command::Right => b'R',
            Command::Stop => b'S',
        }
    }

    pub fn from_token(token: u8) -> Result<Self, UnknownToken> {
        match token {
            b'F' => Ok(Command::Forward),
            b'B' => Ok(Command::Backward),
            b'L' => Ok(Command::Left),
            b'R' => Ok(Command::Right),
            b'S' => Ok(Command::Stop),
            other => Err(UnknownToken(other)),
        }
    }

    /// Short code exposed to the request layer ("F", "L", ...).
    pub fn code(self) -> char {
        self.token() as char
    }

    /// Parse a manual-control name such as `forward` or `left`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "forward" => Some(Command::Forward),
            "backward" => Some(Command::Backward),
            "left" => Some(Command::Left),
            "right" => Some(Command::Right),
            "stop" => Some(Command::Stop),
            _ => None,
        }
    }

    pub fn is_motion(self) -> bool {
        self != Command::Stop
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
