//! Delivery of steering commands to the actuator link.

mod dispatcher;
mod manual;
mod transport;

pub use dispatcher::{DispatchPolicy, Dispatcher};
pub use manual::{DriveAction, ManualDrive};
pub use transport::{
    LogTransport, MemoryTransport, SerialSettings, Transport, TransportError, WriterTransport,
    open_serial,
};
