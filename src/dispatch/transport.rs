//! Actuator transports: anything that accepts one command token at a time.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::motion::Command;

/// Actuator write failure. Never fatal to the frame loop.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("actuator write timed out")]
    Timeout,
    #[error("actuator transport is closed")]
    Closed,
    #[error("actuator i/o error: {0}")]
    Io(#[source] io::Error),
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportError::Timeout,
            _ => TransportError::Io(err),
        }
    }
}

/// Capability interface over the actuator link.
///
/// Implementations are owned by exactly one writer; they need not be `Sync`.
/// Writes should be bounded. A writer still blocked when the dispatcher
/// shuts down is detached after its grace period.
pub trait Transport: Send {
    /// Write one command, fire-and-forget. No acknowledgement is expected.
    fn send(&mut self, command: Command) -> Result<(), TransportError>;

    /// Release the link. Called once after the final command.
    fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, command: Command) -> Result<(), TransportError> {
        (**self).send(command)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }
}

/// Print-only sink: each command becomes a log event.
#[derive(Debug, Default)]
pub struct LogTransport;

impl Transport for LogTransport {
    fn send(&mut self, command: Command) -> Result<(), TransportError> {
        info!(movement = %command, "movement command");
        Ok(())
    }
}

/// Single-byte tokens over any byte writer (a serial port, a pipe, a buffer).
///
/// Inherits the writer's blocking behavior; give it a writer with a timeout.
pub struct WriterTransport<W: Write + Send> {
    writer: Option<W>,
}

impl<W: Write + Send> WriterTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
        }
    }
}

impl<W: Write + Send> Transport for WriterTransport<W> {
    fn send(&mut self, command: Command) -> Result<(), TransportError> {
        let writer = self.writer.as_mut().ok_or(TransportError::Closed)?;
        writer.write_all(&[command.token()])?;
        writer.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        match self.writer.take() {
            Some(mut writer) => Ok(writer.flush()?),
            None => Ok(()),
        }
    }
}

/// Serial link parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub write_timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            write_timeout: Duration::from_secs(1),
        }
    }
}

/// Open the actuator's serial port. Writes are bounded by `write_timeout`.
pub fn open_serial(
    settings: &SerialSettings,
) -> Result<WriterTransport<Box<dyn serialport::SerialPort>>, TransportError> {
    let port = serialport::new(settings.port.as_str(), settings.baud_rate)
        .timeout(settings.write_timeout)
        .open()
        .map_err(|source| TransportError::Open {
            port: settings.port.clone(),
            source,
        })?;
    info!(port = %settings.port, baud = settings.baud_rate, "serial actuator connected");
    Ok(WriterTransport::new(port))
}

#[derive(Debug, Default)]
struct MemoryLog {
    sent: Vec<Command>,
    fail_next: usize,
    closed: bool,
}

/// In-memory sink that records every delivered command.
///
/// Clones share the same log, so a test keeps one clone and hands the other
/// to the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    log: Arc<Mutex<MemoryLog>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` sends fail with a timeout.
    pub fn fail_next(&self, n: usize) {
        self.lock().fail_next = n;
    }

    /// Commands delivered so far, in order.
    pub fn sent(&self) -> Vec<Command> {
        self.lock().sent.clone()
    }

    pub fn last(&self) -> Option<Command> {
        self.lock().sent.last().copied()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, command: Command) -> Result<(), TransportError> {
        let mut log = self.lock();
        if log.closed {
            return Err(TransportError::Closed);
        }
        if log.fail_next > 0 {
            log.fail_next -= 1;
            return Err(TransportError::Timeout);
        }
        log.sent.push(command);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.lock().closed = true;
        Ok(())
    }
}
