//! Command dispatcher: decouples actuator writes from the frame cadence.
//!
//! The frame loop hands commands to a single writer thread through a
//! capacity-1, latest-wins slot. A slow write never queues more than one
//! pending command; an overwritten pending command is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::dispatch::transport::{Transport, TransportError};
use crate::motion::Command;

/// When the dispatcher forwards a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// Forward every command, repeated or not.
    #[default]
    EveryCycle,
    /// Suppress repeats of the last offered command. A failed write forces
    /// the next command through regardless, so a `Stop` after loss is
    /// re-sent until a write succeeds.
    OnChange,
}

/// How long shutdown waits for the writer to deliver the final `Stop`.
/// Covers one in-flight write plus the `Stop` at the default serial timeout.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

pub struct Dispatcher {
    tx: Option<Sender<Command>>,
    /// Sender-side handle on the slot, used to evict a stale pending command.
    slot: Receiver<Command>,
    needs_resend: Arc<AtomicBool>,
    last_offered: Option<Command>,
    policy: DispatchPolicy,
    worker: Option<JoinHandle<()>>,
    /// Signalled by the writer once the transport is closed.
    done: Receiver<()>,
    grace: Duration,
}

impl Dispatcher {
    /// Start the writer thread. The transport is owned by that thread alone.
    pub fn spawn<T>(transport: T, policy: DispatchPolicy) -> Result<Self, TransportError>
    where
        T: Transport + 'static,
    {
        let (tx, rx) = bounded::<Command>(1);
        let needs_resend = Arc::new(AtomicBool::new(false));
        let (done_tx, done) = bounded::<()>(1);

        let worker = thread::Builder::new()
            .name("actuator-writer".to_string())
            .spawn({
                let rx = rx.clone();
                let needs_resend = Arc::clone(&needs_resend);
                move || {
                    write_loop(rx, transport, needs_resend);
                    let _ = done_tx.send(());
                }
            })
            .map_err(TransportError::Io)?;

        Ok(Self {
            tx: Some(tx),
            slot: rx,
            needs_resend,
            last_offered: None,
            policy,
            worker: Some(worker),
            done,
            grace: SHUTDOWN_GRACE,
        })
    }

    /// Bound the wait for the writer at shutdown. A transport stuck in a
    /// write past this is detached rather than joined.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Hand a command to the writer. Returns `false` when the command was
    /// suppressed as a repeat or the writer is gone.
    pub fn send(&mut self, command: Command) -> bool {
        if self.policy == DispatchPolicy::OnChange
            && self.last_offered == Some(command)
            && !self.needs_resend.load(Ordering::Acquire)
        {
            trace!(%command, "repeat suppressed");
            return false;
        }

        self.needs_resend.store(false, Ordering::Release);
        if self.offer(command) {
            self.last_offered = Some(command);
            true
        } else {
            false
        }
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Send a final `Stop`, close the transport and join the writer.
    pub fn shutdown(mut self) {
        self.finish();
    }

    fn offer(&self, command: Command) -> bool {
        let Some(tx) = self.tx.as_ref() else {
            return false;
        };

        let mut pending = command;
        loop {
            match tx.try_send(pending) {
                Ok(()) => return true,
                Err(TrySendError::Full(cmd)) => {
                    if let Ok(stale) = self.slot.try_recv() {
                        debug!(%stale, replacement = %cmd, "dropping stale pending command");
                    }
                    pending = cmd;
                }
                Err(TrySendError::Disconnected(_)) => {
                    warn!(%command, "actuator writer has exited");
                    return false;
                }
            }
        }
    }

    fn finish(&mut self) {
        if self.tx.is_none() {
            return;
        }
        self.offer(Command::Stop);
        // Dropping the only sender lets the writer drain the final Stop and exit.
        self.tx = None;
        let Some(worker) = self.worker.take() else {
            return;
        };
        match self.done.recv_timeout(self.grace) {
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    grace_ms = self.grace.as_millis() as u64,
                    "actuator writer still blocked, detaching"
                );
            }
            // Disconnected without a signal means the writer panicked.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.join().is_err() {
                    warn!("actuator writer panicked");
                }
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.finish();
    }
}

fn write_loop<T: Transport>(
    rx: Receiver<Command>,
    mut transport: T,
    needs_resend: Arc<AtomicBool>,
) {
    for command in rx.iter() {
        match transport.send(command) {
            Ok(()) => trace!(%command, "command written"),
            Err(err) => {
                warn!(%command, error = %err, "actuator write failed");
                needs_resend.store(true, Ordering::Release);
            }
        }
    }
    match transport.close() {
        Ok(()) => debug!("actuator transport closed"),
        Err(err) => warn!(error = %err, "failed to close actuator transport"),
    }
}
