//! Operator command record and stop-request polling.
//!
//! The line reader and dispatcher live outside the motion core. The core only
//! needs to know, between two steps, whether the most recent complete line
//! asked it to stop. `StopRequest` is that question; `CommandLatch` is the
//! default answer, a single-slot mailbox the reader posts into.

use parking_lot::Mutex;

/// One parsed operator line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Command {
    /// Single-character operation code.
    pub operation: char,
    /// Numeric parameter (0 when absent).
    pub value: f64,
    /// Raw text parameter.
    pub input: String,
}

impl Command {
    pub fn new(operation: char, value: f64, input: impl Into<String>) -> Self {
        Self {
            operation,
            value,
            input: input.into(),
        }
    }

    /// `s`/`S` stops motion in progress.
    #[inline]
    pub fn is_stop_request(&self) -> bool {
        matches!(self.operation, 's' | 'S')
    }
}

/// Polled between steps; must never block.
pub trait StopRequest: Send + Sync {
    /// Whether a stop has been requested since the last poll.
    fn stop_requested(&self) -> bool;
}

/// Never requests a stop.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStopRequests;

impl StopRequest for NoStopRequests {
    fn stop_requested(&self) -> bool {
        false
    }
}

/// Single-slot mailbox holding the latest complete command line.
///
/// Polling consumes a pending stop request. Any other command stays in the
/// slot for the dispatcher.
#[derive(Debug, Default)]
pub struct CommandLatch {
    slot: Mutex<Option<Command>>,
}

impl CommandLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly received command, replacing any unread one.
    pub fn post(&self, command: Command) {
        *self.slot.lock() = Some(command);
    }

    /// Take the pending command.
    pub fn take(&self) -> Option<Command> {
        self.slot.lock().take()
    }

    /// Drop whatever is pending.
    pub fn flush(&self) {
        self.slot.lock().take();
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl StopRequest for CommandLatch {
    fn stop_requested(&self) -> bool {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(Command::is_stop_request) {
            slot.take();
            true
        } else {
            false
        }
    }
}
