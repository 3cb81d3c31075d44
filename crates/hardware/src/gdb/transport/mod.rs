//! Debugger transports.
//!
//! Concrete [`Comm`](crate::gdb::Comm) implementations: a TCP listen socket
//! and, on unix hosts, a serial port.

/// POSIX serial port transport.
#[cfg(unix)]
pub mod serial;

/// TCP listen-socket transport.
pub mod tcp;

#[cfg(unix)]
pub use serial::SerialComm;
pub use tcp::TcpComm;
