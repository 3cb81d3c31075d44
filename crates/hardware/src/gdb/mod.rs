//! GDB Remote Serial Protocol server.
//!
//! This module lets a standard debugger drive the simulator. It is organized as follows:
//! 1. **Framing:** [`Buffer`] cursors and the [`PacketEngine`] that checksums and acknowledges packets.
//! 2. **Transport:** The [`Comm`] byte channel and its TCP and serial implementations.
//! 3. **Protocol:** Command parsing, the register codec, target XML, and stop signals.
//! 4. **Session:** The [`GdbStub`] that ties the simulator to the debugger.

/// Fixed-capacity packet buffer with hex helpers.
pub mod buffer;

/// Byte channel trait and errors.
pub mod comm;

/// Command parsing.
pub mod commands;

/// Packet framing, checksums, and acknowledgement.
pub mod packet;

/// Register file codec.
pub mod registers;

/// Stop signals and console messages.
pub mod signal;

/// Session driver.
pub mod stub;

/// TCP and serial transports.
pub mod transport;

/// Target description and memory map documents.
pub mod xml;

pub use buffer::{Buffer, BufferError};
pub use comm::{Comm, CommError};
pub use packet::PacketEngine;
pub use signal::StopReason;
pub use stub::{GdbStub, SessionEnd, StubError};
#[cfg(unix)]
pub use transport::SerialComm;
pub use transport::TcpComm;
