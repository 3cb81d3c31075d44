//! RSP command parsing.
//!
//! Turns a received payload into a [`Command`]. Parsing only reads the
//! buffer; the stub executes the command and writes the reply afterwards.

use super::buffer::{Buffer, BufferError};
use super::registers::{self, RegisterSet};
use crate::soc::WatchKind;

/// A breakpoint or watchpoint named by a `Z`/`z` packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakpointSpec {
    /// What the entry reacts to.
    pub kind: WatchKind,
    /// First covered address.
    pub address: u32,
    /// Covered length in bytes.
    pub size: u32,
}

/// A parsed debugger command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `?`: report why the target stopped.
    HaltReason,
    /// `g`: read all registers.
    ReadRegisters,
    /// `G`: write all registers.
    WriteRegisters(RegisterSet),
    /// `p n`: read one register.
    ReadRegister(u32),
    /// `P n=v`: write one register.
    WriteRegister {
        /// GDB register number.
        regnum: u32,
        /// New value.
        value: u32,
    },
    /// `m addr,len`: read memory.
    ReadMemory {
        /// Start address.
        address: u32,
        /// Byte count.
        length: u32,
    },
    /// `M addr,len:bytes`: write memory.
    WriteMemory {
        /// Start address.
        address: u32,
        /// Bytes to write.
        data: Vec<u8>,
    },
    /// `c [addr]`: continue, optionally from a new PC.
    Continue(Option<u32>),
    /// `s [addr]`: single-step, optionally from a new PC.
    Step(Option<u32>),
    /// `Z`: insert a breakpoint or watchpoint.
    InsertBreakpoint(BreakpointSpec),
    /// `z`: remove a breakpoint or watchpoint.
    RemoveBreakpoint(BreakpointSpec),
    /// `qSupported`.
    QuerySupported,
    /// `qXfer:features:read:annex:off,len`.
    ReadFeatures {
        /// Requested document.
        annex: String,
        /// Offset into the document.
        offset: u32,
        /// Maximum bytes to return.
        length: u32,
    },
    /// `qXfer:memory-map:read::off,len`.
    ReadMemoryMap {
        /// Offset into the document.
        offset: u32,
        /// Maximum bytes to return.
        length: u32,
    },
    /// `qAttached`.
    QueryAttached,
    /// `qC`: current thread.
    QueryCurrentThread,
    /// `H op thread`: set thread.
    SetThread,
    /// `k`: kill.
    Kill,
    /// `D`: detach.
    Detach,
    /// Anything else; answered with an empty reply.
    Unknown,
}

/// Parses the payload held in `buffer`.
///
/// # Errors
///
/// Returns a [`BufferError`] when a recognised command has malformed arguments.
pub fn parse(buffer: &mut Buffer) -> Result<Command, BufferError> {
    let Ok(letter) = buffer.read_byte() else {
        return Ok(Command::Unknown);
    };
    Ok(match letter {
        b'?' => Command::HaltReason,
        b'g' => Command::ReadRegisters,
        b'G' => Command::WriteRegisters(registers::read_all(buffer)?),
        b'p' => Command::ReadRegister(buffer.read_u32_hex()?),
        b'P' => {
            let regnum = buffer.read_u32_hex()?;
            buffer.match_str("=")?;
            Command::WriteRegister {
                regnum,
                value: registers::read_word(buffer)?,
            }
        }
        b'm' => {
            let (address, length) = address_length(buffer)?;
            Command::ReadMemory { address, length }
        }
        b'M' => {
            let (address, length) = address_length(buffer)?;
            buffer.match_str(":")?;
            let data = (0..length)
                .map(|_| buffer.read_byte_as_hex())
                .collect::<Result<Vec<u8>, _>>()?;
            Command::WriteMemory { address, data }
        }
        b'c' => Command::Continue(optional_address(buffer)?),
        b's' => Command::Step(optional_address(buffer)?),
        b'Z' => Command::InsertBreakpoint(breakpoint_spec(buffer)?),
        b'z' => Command::RemoveBreakpoint(breakpoint_spec(buffer)?),
        b'q' => query(buffer)?,
        b'H' => Command::SetThread,
        b'k' => Command::Kill,
        b'D' => Command::Detach,
        _ => Command::Unknown,
    })
}

/// Parses `addr,len`.
fn address_length(buffer: &mut Buffer) -> Result<(u32, u32), BufferError> {
    let address = buffer.read_u32_hex()?;
    buffer.match_str(",")?;
    Ok((address, buffer.read_u32_hex()?))
}

/// Parses the optional resume address of `c`/`s`.
fn optional_address(buffer: &mut Buffer) -> Result<Option<u32>, BufferError> {
    if buffer.bytes_left() == 0 {
        Ok(None)
    } else {
        buffer.read_u32_hex().map(Some)
    }
}

/// Parses `type,addr,kind` of `Z`/`z`.
///
/// Types 0 and 1 are software and hardware breakpoints, whose kind is the
/// Thumb instruction width: 2 for 16-bit, 3 or 4 for 32-bit. Types 2, 3,
/// and 4 are write, read, and access watchpoints, whose kind is the length.
fn breakpoint_spec(buffer: &mut Buffer) -> Result<BreakpointSpec, BufferError> {
    let kind = match buffer.read_byte()? {
        b'0' | b'1' => WatchKind::Breakpoint,
        b'2' => WatchKind::Write,
        b'3' => WatchKind::Read,
        b'4' => WatchKind::ReadWrite,
        _ => return Err(BufferError::UnexpectedChar),
    };
    buffer.match_str(",")?;
    let (address, length) = address_length(buffer)?;
    let size = match (kind, length) {
        (WatchKind::Breakpoint, 2) => 2,
        (WatchKind::Breakpoint, 3 | 4) => 4,
        (WatchKind::Breakpoint, _) | (_, 0) => return Err(BufferError::UnexpectedChar),
        (_, length) => length,
    };
    Ok(BreakpointSpec {
        kind,
        address,
        size,
    })
}

/// Parses the `q` family.
fn query(buffer: &mut Buffer) -> Result<Command, BufferError> {
    if buffer.is_next("Supported") {
        return Ok(Command::QuerySupported);
    }
    if buffer.is_next("Xfer:features:read:") {
        let annex_len = buffer
            .remaining()
            .iter()
            .position(|&c| c == b':')
            .ok_or(BufferError::UnexpectedChar)?;
        let annex = String::from_utf8_lossy(&buffer.remaining()[..annex_len]).into_owned();
        buffer.match_str(&annex)?;
        buffer.match_str(":")?;
        let (offset, length) = address_length(buffer)?;
        return Ok(Command::ReadFeatures {
            annex,
            offset,
            length,
        });
    }
    if buffer.is_next("Xfer:memory-map:read::") {
        let (offset, length) = address_length(buffer)?;
        return Ok(Command::ReadMemoryMap { offset, length });
    }
    if buffer.is_next("Attached") {
        return Ok(Command::QueryAttached);
    }
    if buffer.is_next("C") && buffer.bytes_left() == 0 {
        return Ok(Command::QueryCurrentThread);
    }
    Ok(Command::Unknown)
}
