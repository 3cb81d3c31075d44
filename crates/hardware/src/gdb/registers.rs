//! Register file codec for `g`, `G`, `p`, and `P`.
//!
//! GDB numbers the M-profile core registers R0-R12, SP, LR, PC, then xPSR at
//! 16. Every register travels as 8 hex digits holding its little-endian bytes.

use super::buffer::{Buffer, BufferError};
use crate::core::arch::CpuContext;
use crate::core::arch::context::{GPR_COUNT, LR, PC, SP};

/// Number of registers in a `g` reply.
pub const REGISTER_COUNT: usize = 17;

/// GDB register number of xPSR.
pub const XPSR_REGNUM: u32 = 16;

/// Values of all registers in GDB order.
pub type RegisterSet = [u32; REGISTER_COUNT];

/// Reads GDB register `regnum`, or `None` if it does not exist.
pub fn read(ctx: &CpuContext, regnum: u32) -> Option<u32> {
    match regnum {
        0..=15 => Some(ctx.reg(regnum as u8)),
        XPSR_REGNUM => Some(ctx.xpsr()),
        _ => None,
    }
}

/// Writes GDB register `regnum`. Returns `false` if it does not exist.
pub fn write(ctx: &mut CpuContext, regnum: u32, value: u32) -> bool {
    match regnum {
        0..=15 => ctx.set_reg(regnum as u8, value),
        XPSR_REGNUM => ctx.set_xpsr(value),
        _ => return false,
    }
    true
}

/// Captures every register in GDB order.
pub fn snapshot(ctx: &CpuContext) -> RegisterSet {
    let mut set = [0; REGISTER_COUNT];
    set[..GPR_COUNT].copy_from_slice(&ctx.r);
    set[usize::from(SP)] = ctx.sp;
    set[usize::from(LR)] = ctx.lr;
    set[usize::from(PC)] = ctx.pc;
    set[XPSR_REGNUM as usize] = ctx.xpsr();
    set
}

/// Replaces every register from a set in GDB order.
pub fn restore(ctx: &mut CpuContext, set: &RegisterSet) {
    ctx.r.copy_from_slice(&set[..GPR_COUNT]);
    ctx.sp = set[usize::from(SP)];
    ctx.lr = set[usize::from(LR)];
    ctx.pc = set[usize::from(PC)];
    ctx.set_xpsr(set[XPSR_REGNUM as usize]);
}

/// Appends one register value as 8 little-endian hex digits.
pub fn write_word(buffer: &mut Buffer, value: u32) -> Result<(), BufferError> {
    buffer.write_as_hex(&value.to_le_bytes())
}

/// Reads one register value from 8 little-endian hex digits.
pub fn read_word(buffer: &mut Buffer) -> Result<u32, BufferError> {
    let mut bytes = [0u8; 4];
    for byte in &mut bytes {
        *byte = buffer.read_byte_as_hex()?;
    }
    Ok(u32::from_le_bytes(bytes))
}

/// Appends the full register file for a `g` reply.
pub fn write_all(buffer: &mut Buffer, ctx: &CpuContext) -> Result<(), BufferError> {
    snapshot(ctx)
        .iter()
        .try_for_each(|&value| write_word(buffer, value))
}

/// Parses the full register file of a `G` packet.
///
/// Nothing is committed; the caller applies the set with [`restore`] once every word parsed.
pub fn read_all(buffer: &mut Buffer) -> Result<RegisterSet, BufferError> {
    let mut set = [0; REGISTER_COUNT];
    for value in &mut set {
        *value = read_word(buffer)?;
    }
    Ok(set)
}
