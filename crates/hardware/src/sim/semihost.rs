//! ARM Semihosting.
//!
//! This module services `BKPT #0xAB` host calls. It provides:
//! 1. **Console Output:** SYS_WRITEC, SYS_WRITE0, and SYS_WRITE to stdout/stderr.
//! 2. **Environment:** SYS_GET_CMDLINE, SYS_HEAPINFO, SYS_TIME, SYS_CLOCK, and SYS_ERRNO.
//! 3. **Termination:** SYS_EXIT and SYS_EXIT_EXTENDED.
//!
//! R0 holds the operation number and R1 its parameter, usually a pointer to
//! an argument block. The result goes back in R0. Target memory is accessed
//! through the debugger path, so semihosting never trips watchpoints.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::common::BusError;
use crate::common::constants::INSTRUCTION_SIZE_16;
use crate::core::arch::CpuContext;
use crate::soc::Memory;

/// Operation numbers understood by [`service`].
pub mod op {
    /// Write the character at `[r1]`.
    pub const SYS_WRITEC: u32 = 0x03;
    /// Write the NUL-terminated string at `r1`.
    pub const SYS_WRITE0: u32 = 0x04;
    /// Write `len` bytes to a file handle: `[fd, buffer, len]`.
    pub const SYS_WRITE: u32 = 0x05;
    /// Centiseconds since execution started.
    pub const SYS_CLOCK: u32 = 0x10;
    /// Seconds since the Unix epoch.
    pub const SYS_TIME: u32 = 0x11;
    /// Last host error number.
    pub const SYS_ERRNO: u32 = 0x13;
    /// Copy the command line: `[buffer, len]`.
    pub const SYS_GET_CMDLINE: u32 = 0x15;
    /// Fill a four-word heap/stack description at `[r1]`.
    pub const SYS_HEAPINFO: u32 = 0x16;
    /// Terminate with the reason code in `r1`.
    pub const SYS_EXIT: u32 = 0x18;
    /// Terminate with `[reason, subcode]`.
    pub const SYS_EXIT_EXTENDED: u32 = 0x20;
}

/// Reason code for a normal application exit.
pub const ADP_STOPPED_APPLICATION_EXIT: u32 = 0x2_0026;

/// Host file handle for standard output.
const STDOUT_HANDLE: u32 = 1;

/// Host file handle for standard error.
const STDERR_HANDLE: u32 = 2;

/// Longest string SYS_WRITE0 copies before giving up on a terminator.
const WRITE0_LIMIT: u32 = 4096;

/// Value returned in R0 for failed calls.
const FAILURE: u32 = u32::MAX;

/// What the caller should do after a host call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SemihostAction {
    /// PC was advanced past the BKPT; resume execution.
    Resume,
    /// The program asked to terminate with this exit code.
    Exit(i32),
}

/// Host-side state shared by every call of one program run.
#[derive(Clone, Debug)]
pub struct SemihostHost {
    command_line: String,
    started: Instant,
}

impl Default for SemihostHost {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl SemihostHost {
    /// Creates host state answering SYS_GET_CMDLINE with `command_line`.
    pub fn new(command_line: String) -> Self {
        Self {
            command_line,
            started: Instant::now(),
        }
    }

    /// The command line handed to the program.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Services the host call whose BKPT sits at PC.
    ///
    /// Console bytes are appended to `out`; the caller decides whether they go
    /// to the debugger or the host's stdout.
    ///
    /// # Arguments
    ///
    /// * `ctx` - CPU context; R0 receives the result and PC moves past the BKPT.
    /// * `mem` - Target memory.
    /// * `out` - Console output sink.
    pub fn service<M: Memory + ?Sized>(
        &self,
        ctx: &mut CpuContext,
        mem: &mut M,
        out: &mut Vec<u8>,
    ) -> SemihostAction {
        let operation = ctx.r[0];
        let param = ctx.r[1];
        let result = match operation {
            op::SYS_EXIT => return SemihostAction::Exit(exit_code(param, 0)),
            op::SYS_EXIT_EXTENDED => {
                return match (read_word(mem, param), read_word(mem, param.wrapping_add(4))) {
                    (Ok(reason), Ok(subcode)) => {
                        SemihostAction::Exit(exit_code(reason, subcode as i32))
                    }
                    _ => SemihostAction::Exit(1),
                };
            }
            op::SYS_WRITEC => mem.debug_read8(param).map(|c| {
                out.push(c);
                0
            }),
            op::SYS_WRITE0 => write0(mem, param, out),
            op::SYS_WRITE => write(mem, param, out),
            op::SYS_CLOCK => Ok((self.started.elapsed().as_millis() / 10) as u32),
            op::SYS_TIME => Ok(SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs() as u32)),
            op::SYS_ERRNO => Ok(0),
            op::SYS_GET_CMDLINE => self.get_cmdline(mem, param),
            op::SYS_HEAPINFO => heapinfo(mem, param),
            _ => {
                tracing::warn!(
                    operation = format_args!("{operation:#x}"),
                    "unsupported semihosting call"
                );
                Ok(FAILURE)
            }
        };
        ctx.r[0] = result.unwrap_or_else(|err| {
            tracing::debug!("semihosting argument access failed: {err}");
            FAILURE
        });
        ctx.pc = ctx.pc.wrapping_add(INSTRUCTION_SIZE_16);
        SemihostAction::Resume
    }

    /// Copies the NUL-terminated command line into `[buffer, len]`.
    ///
    /// Fails without writing when the buffer is too small.
    fn get_cmdline<M: Memory + ?Sized>(&self, mem: &mut M, block: u32) -> Result<u32, BusError> {
        let buffer = read_word(mem, block)?;
        let capacity = read_word(mem, block.wrapping_add(4))?;
        let bytes = self.command_line.as_bytes();
        let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        if len >= capacity {
            return Ok(FAILURE);
        }
        for (address, &byte) in (buffer..).zip(bytes.iter().chain(&[0])) {
            mem.debug_write8(address, byte)?;
        }
        write_word(mem, block.wrapping_add(4), len)?;
        Ok(0)
    }
}

/// Exit code of SYS_EXIT / SYS_EXIT_EXTENDED.
const fn exit_code(reason: u32, subcode: i32) -> i32 {
    if reason == ADP_STOPPED_APPLICATION_EXIT {
        subcode
    } else {
        1
    }
}

/// Output reaches `out` only when the whole string was readable.
fn write0<M: Memory + ?Sized>(mem: &mut M, address: u32, out: &mut Vec<u8>) -> Result<u32, BusError> {
    let mut text = Vec::new();
    for offset in 0..WRITE0_LIMIT {
        match mem.debug_read8(address.wrapping_add(offset))? {
            0 => break,
            c => text.push(c),
        }
    }
    out.extend_from_slice(&text);
    Ok(0)
}

/// Returns the number of bytes NOT written, as the protocol requires.
///
/// Output reaches `out` only when the whole buffer was readable.
fn write<M: Memory + ?Sized>(mem: &mut M, block: u32, out: &mut Vec<u8>) -> Result<u32, BusError> {
    let handle = read_word(mem, block)?;
    let buffer = read_word(mem, block.wrapping_add(4))?;
    let len = read_word(mem, block.wrapping_add(8))?;
    if handle != STDOUT_HANDLE && handle != STDERR_HANDLE {
        return Ok(len);
    }
    let text = (0..len)
        .map(|offset| mem.debug_read8(buffer.wrapping_add(offset)))
        .collect::<Result<Vec<u8>, BusError>>()?;
    out.extend_from_slice(&text);
    Ok(0)
}

/// Reports unknown heap and stack bounds so the C runtime keeps its linker defaults.
fn heapinfo<M: Memory + ?Sized>(mem: &mut M, param: u32) -> Result<u32, BusError> {
    let block = read_word(mem, param)?;
    for index in 0..4 {
        write_word(mem, block.wrapping_add(index * 4), 0)?;
    }
    Ok(0)
}

fn read_word<M: Memory + ?Sized>(mem: &mut M, address: u32) -> Result<u32, BusError> {
    let mut bytes = [0u8; 4];
    for (offset, byte) in (0..).zip(&mut bytes) {
        *byte = mem.debug_read8(address.wrapping_add(offset))?;
    }
    Ok(u32::from_le_bytes(bytes))
}

fn write_word<M: Memory + ?Sized>(mem: &mut M, address: u32, value: u32) -> Result<(), BusError> {
    (0..)
        .zip(value.to_le_bytes())
        .try_for_each(|(offset, byte)| mem.debug_write8(address.wrapping_add(offset), byte))
}
