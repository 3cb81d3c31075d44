//! Memory Access Helpers.
//!
//! This module provides the interface between the executor and the memory backend.
//! It performs the following:
//! 1. **Instruction Fetch:** Reads one or two halfwords at PC and decodes them.
//! 2. **Sized Access:** Dispatches byte, halfword, and word loads and stores by width.
//! 3. **Fault Reporting:** Logs each failed access before it becomes a hard fault.

use crate::common::BusError;
use crate::common::constants::{INSTRUCTION_SIZE_16, INSTRUCTION_SIZE_32};
use crate::isa::{Instruction, decode16, decode32, is_32bit};
use crate::soc::Memory;

/// Fetches and decodes the instruction at `pc`.
///
/// # Returns
///
/// The decoded instruction and its size in bytes.
///
/// # Errors
///
/// Returns the [`BusError`] of whichever halfword fetch failed.
pub fn fetch<M: Memory + ?Sized>(mem: &mut M, pc: u32) -> Result<(Instruction, u32), BusError> {
    let first = mem.fetch16(pc).inspect_err(report)?;
    if !is_32bit(first) {
        return Ok((decode16(first), INSTRUCTION_SIZE_16));
    }
    let second = mem
        .fetch16(pc.wrapping_add(INSTRUCTION_SIZE_16))
        .inspect_err(report)?;
    Ok((decode32(first, second), INSTRUCTION_SIZE_32))
}

/// Loads `size` bytes (1, 2, or 4) zero-extended to a word.
///
/// # Errors
///
/// Propagates the backend's [`BusError`].
pub fn load<M: Memory + ?Sized>(mem: &mut M, address: u32, size: u32) -> Result<u32, BusError> {
    match size {
        1 => mem.read8(address).map(u32::from),
        2 => mem.read16(address).map(u32::from),
        _ => mem.read32(address),
    }
    .inspect_err(report)
}

/// Stores the low `size` bytes (1, 2, or 4) of `value`.
///
/// # Errors
///
/// Propagates the backend's [`BusError`].
pub fn store<M: Memory + ?Sized>(
    mem: &mut M,
    address: u32,
    size: u32,
    value: u32,
) -> Result<(), BusError> {
    match size {
        1 => mem.write8(address, value as u8),
        2 => mem.write16(address, value as u16),
        _ => mem.write32(address, value),
    }
    .inspect_err(report)
}

fn report(err: &BusError) {
    tracing::debug!("{err}");
}
