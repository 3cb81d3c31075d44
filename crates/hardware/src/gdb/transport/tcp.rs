//! TCP transport.
//!
//! Listens on a local port and accepts the debugger lazily: the first call
//! that needs a peer blocks in `accept`, while [`Comm::has_receive_data`]
//! only polls for a pending connection. Output is buffered and flushed
//! before every blocking read.

use std::fmt;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Ipv4Addr, TcpListener, TcpStream};
use std::time::Duration;

use crate::gdb::comm::{Comm, CommError};

/// Flush threshold for buffered output.
const OUTPUT_HIGH_WATER: usize = 4096;

/// Callback invoked once each time the transport starts waiting for a debugger.
pub type WaitCallback = Box<dyn FnMut(u16)>;

/// A [`Comm`] over a TCP listen socket.
pub struct TcpComm {
    listener: TcpListener,
    port: u16,
    stream: Option<TcpStream>,
    output: Vec<u8>,
    read_timeout: Option<Duration>,
    on_wait: Option<WaitCallback>,
    disconnected: bool,
}

impl fmt::Debug for TcpComm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpComm")
            .field("port", &self.port)
            .field("connected", &self.stream.is_some())
            .field("read_timeout", &self.read_timeout)
            .field("disconnected", &self.disconnected)
            .finish_non_exhaustive()
    }
}

impl TcpComm {
    /// Binds a listen socket on all interfaces.
    ///
    /// Port 0 picks a free port; see [`TcpComm::port`].
    ///
    /// # Errors
    ///
    /// Returns the bind error.
    pub fn bind(port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))?;
        let port = listener.local_addr()?.port();
        Ok(Self {
            listener,
            port,
            stream: None,
            output: Vec::with_capacity(OUTPUT_HIGH_WATER),
            read_timeout: None,
            on_wait: None,
            disconnected: false,
        })
    }

    /// Sets how long a blocking read waits before failing with [`CommError::Timeout`].
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Registers a callback invoked with the port before each blocking accept.
    #[must_use]
    pub fn with_wait_callback(mut self, callback: impl FnMut(u16) + 'static) -> Self {
        self.on_wait = Some(Box::new(callback));
        self
    }

    /// The bound port.
    pub const fn port(&self) -> u16 {
        self.port
    }

    fn adopt(&mut self, stream: TcpStream) -> io::Result<()> {
        stream.set_nodelay(true)?;
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(self.read_timeout)?;
        if let Ok(peer) = stream.peer_addr() {
            tracing::info!("debugger connected from {peer}");
        }
        self.stream = Some(stream);
        self.disconnected = false;
        Ok(())
    }

    /// Returns the connected stream, blocking in `accept` if there is none.
    fn connection(&mut self) -> Result<&mut TcpStream, CommError> {
        if self.stream.is_none() {
            if let Some(callback) = self.on_wait.as_mut() {
                callback(self.port);
            }
            self.listener.set_nonblocking(false)?;
            let (stream, _) = self.listener.accept()?;
            self.adopt(stream)?;
        }
        self.stream.as_mut().ok_or(CommError::Disconnected)
    }

    fn drop_connection(&mut self) -> CommError {
        tracing::info!("debugger disconnected");
        self.stream = None;
        self.output.clear();
        self.disconnected = true;
        CommError::Disconnected
    }

    fn try_accept(&mut self) -> io::Result<()> {
        self.listener.set_nonblocking(true)?;
        match self.listener.accept() {
            Ok((stream, _)) => self.adopt(stream),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn write_output(&mut self) -> Result<(), CommError> {
        if self.output.is_empty() {
            return Ok(());
        }
        let output = std::mem::take(&mut self.output);
        let result = self.connection()?.write_all(&output);
        self.output = output;
        self.output.clear();
        match result {
            Ok(()) => Ok(()),
            Err(e) if is_disconnect(&e) => Err(self.drop_connection()),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::UnexpectedEof
            | ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
    )
}

impl Comm for TcpComm {
    fn has_receive_data(&mut self) -> bool {
        if self.stream.is_none() && self.try_accept().is_err() {
            return false;
        }
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };
        if stream.set_nonblocking(true).is_err() {
            return false;
        }
        let mut byte = [0u8];
        let peeked = stream.peek(&mut byte);
        let _ = stream.set_nonblocking(false);
        match peeked {
            Ok(0) => {
                let _ = self.drop_connection();
                false
            }
            Ok(_) => true,
            Err(_) => false,
        }
    }

    fn receive_char(&mut self) -> Result<u8, CommError> {
        self.write_output()?;
        let mut byte = [0u8];
        let result = self.connection()?.read_exact(&mut byte);
        match result {
            Ok(()) => Ok(byte[0]),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(CommError::Timeout)
            }
            Err(e) if is_disconnect(&e) => Err(self.drop_connection()),
            Err(e) => Err(e.into()),
        }
    }

    fn send_char(&mut self, c: u8) -> Result<(), CommError> {
        let _ = self.connection()?;
        self.output.push(c);
        if self.output.len() >= OUTPUT_HIGH_WATER {
            self.write_output()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), CommError> {
        self.write_output()
    }

    fn should_stop_run(&self) -> bool {
        self.disconnected
    }

    fn is_gdb_connected(&self) -> bool {
        self.stream.is_some()
    }
}
