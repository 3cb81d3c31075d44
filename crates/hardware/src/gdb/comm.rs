//! Byte-channel capability.
//!
//! The packet engine and the stub only see a [`Comm`]: a blocking,
//! character-at-a-time channel to the debugger with a non-blocking poll.

use std::io;

use thiserror::Error;

/// Errors raised by a debugger channel.
#[derive(Debug, Error)]
pub enum CommError {
    /// No character arrived within the configured timeout.
    #[error("timed out waiting for debugger input")]
    Timeout,

    /// The debugger closed the connection.
    #[error("debugger disconnected")]
    Disconnected,

    /// The underlying device or socket failed.
    #[error("debugger channel I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A byte channel to the debugger.
pub trait Comm {
    /// Returns `true` when at least one character can be read without blocking.
    fn has_receive_data(&mut self) -> bool;

    /// Blocks until one character arrives.
    fn receive_char(&mut self) -> Result<u8, CommError>;

    /// Queues one character for transmission.
    fn send_char(&mut self, c: u8) -> Result<(), CommError>;

    /// Pushes queued characters to the peer.
    fn flush(&mut self) -> Result<(), CommError> {
        Ok(())
    }

    /// Returns `true` when the session should end instead of resuming execution.
    fn should_stop_run(&self) -> bool;

    /// Returns `true` while a debugger is attached.
    fn is_gdb_connected(&self) -> bool;
}
