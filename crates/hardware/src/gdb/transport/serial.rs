//! POSIX serial transport.
//!
//! Opens a tty in raw 8N1 mode with `VMIN = VTIME = 0` and waits for input
//! with `select()`, so every read honours the configured timeout.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::mem::MaybeUninit;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::ptr;
use std::time::Duration;

use crate::gdb::comm::{Comm, CommError};

/// A [`Comm`] over a serial device.
#[derive(Debug)]
pub struct SerialComm {
    file: File,
    timeout: Option<Duration>,
    output: Vec<u8>,
    disconnected: bool,
}

/// Maps a numeric baud rate to its termios speed constant.
fn speed_for(baud: u32) -> io::Result<libc::speed_t> {
    Ok(match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115_200 => libc::B115200,
        230_400 => libc::B230400,
        _ => {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("unsupported baud rate {baud}"),
            ));
        }
    })
}

impl SerialComm {
    /// Opens and configures `device`.
    ///
    /// # Arguments
    ///
    /// * `device` - Path to the tty, e.g. `/dev/ttyUSB0`.
    /// * `baud` - Line speed.
    /// * `timeout` - Read timeout; `None` blocks indefinitely.
    ///
    /// # Errors
    ///
    /// Fails if the device cannot be opened, the baud rate is unsupported,
    /// or the terminal attributes cannot be applied.
    pub fn open(device: &Path, baud: u32, timeout: Option<Duration>) -> Result<Self, CommError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(device)?;
        configure(&file, speed_for(baud)?)?;
        tracing::info!("opened {} at {baud} baud", device.display());
        Ok(Self {
            file,
            timeout,
            output: Vec::new(),
            disconnected: false,
        })
    }

    /// Waits up to `timeout` for input. Returns `true` when a read will not block.
    fn wait_readable(&self, timeout: Option<Duration>) -> io::Result<bool> {
        let fd = self.file.as_raw_fd();
        let mut set = MaybeUninit::<libc::fd_set>::uninit();
        // SAFETY: FD_ZERO initialises the whole set before FD_SET and select read it.
        let mut set = unsafe {
            libc::FD_ZERO(set.as_mut_ptr());
            set.assume_init()
        };
        // SAFETY: fd is an open descriptor below FD_SETSIZE for any tty we open.
        unsafe { libc::FD_SET(fd, &mut set) };
        let mut tv = timeout.map(|t| libc::timeval {
            tv_sec: t.as_secs() as libc::time_t,
            tv_usec: libc::suseconds_t::from(t.subsec_micros() as i32),
        });
        let tvp = tv
            .as_mut()
            .map_or(ptr::null_mut(), |tv| tv as *mut libc::timeval);
        // SAFETY: set and tvp point to live, initialised values for the duration of the call.
        let ready =
            unsafe { libc::select(fd + 1, &mut set, ptr::null_mut(), ptr::null_mut(), tvp) };
        match ready {
            -1 => Err(io::Error::last_os_error()),
            0 => Ok(false),
            _ => Ok(true),
        }
    }
}

/// Applies raw 8N1, non-canonical, `VMIN = VTIME = 0` settings at `speed`.
fn configure(file: &File, speed: libc::speed_t) -> io::Result<()> {
    let fd = file.as_raw_fd();
    let mut tio = MaybeUninit::<libc::termios>::uninit();
    // SAFETY: fd is open and tcgetattr fills the whole termios on success.
    if unsafe { libc::tcgetattr(fd, tio.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: tcgetattr succeeded above.
    let mut tio = unsafe { tio.assume_init() };
    // SAFETY: tio is a valid termios owned by this frame.
    unsafe {
        libc::cfmakeraw(&mut tio);
        if libc::cfsetispeed(&mut tio, speed) != 0 || libc::cfsetospeed(&mut tio, speed) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    tio.c_cflag |= libc::CS8 | libc::CLOCAL | libc::CREAD;
    tio.c_cflag &= !(libc::PARENB | libc::CSTOPB);
    tio.c_cc[libc::VMIN] = 0;
    tio.c_cc[libc::VTIME] = 0;
    // SAFETY: fd is open and tio is fully initialised.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

impl Comm for SerialComm {
    fn has_receive_data(&mut self) -> bool {
        self.wait_readable(Some(Duration::ZERO)).unwrap_or(false)
    }

    fn receive_char(&mut self) -> Result<u8, CommError> {
        self.flush()?;
        if !self.wait_readable(self.timeout)? {
            return Err(CommError::Timeout);
        }
        let mut byte = [0u8];
        match self.file.read(&mut byte)? {
            0 => {
                self.disconnected = true;
                Err(CommError::Disconnected)
            }
            _ => Ok(byte[0]),
        }
    }

    fn send_char(&mut self, c: u8) -> Result<(), CommError> {
        self.output.push(c);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), CommError> {
        if !self.output.is_empty() {
            self.file.write_all(&self.output)?;
            self.output.clear();
        }
        Ok(())
    }

    fn should_stop_run(&self) -> bool {
        self.disconnected
    }

    fn is_gdb_connected(&self) -> bool {
        !self.disconnected
    }
}
