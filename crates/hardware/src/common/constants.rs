//! Global System Constants.
//!
//! This module defines system-wide constants used across the simulator. It includes:
//! 1. **Status Register Constants:** Bit positions of the xPSR condition flags and Thumb bit.
//! 2. **Instruction Constants:** Encoding sizes and the 32-bit prefix test.
//! 3. **Semihosting Constants:** The BKPT immediate that marks a host call.

/// Negative condition flag (xPSR bit 31).
pub const XPSR_N: u32 = 1 << 31;

/// Zero condition flag (xPSR bit 30).
pub const XPSR_Z: u32 = 1 << 30;

/// Carry condition flag (xPSR bit 29).
pub const XPSR_C: u32 = 1 << 29;

/// Overflow condition flag (xPSR bit 28).
pub const XPSR_V: u32 = 1 << 28;

/// Mask covering all four condition flags.
pub const XPSR_NZCV: u32 = XPSR_N | XPSR_Z | XPSR_C | XPSR_V;

/// Thumb execution state bit (EPSR.T, xPSR bit 24).
pub const XPSR_T: u32 = 1 << 24;

/// Bits of xPSR that this simulator implements.
///
/// No exceptions are modeled, so IPSR always reads back as 0.
pub const XPSR_IMPLEMENTED: u32 = XPSR_NZCV | XPSR_T;

/// xPSR value after reset: Thumb state, flags clear.
pub const XPSR_RESET: u32 = XPSR_T;

/// Size of a 16-bit Thumb instruction in bytes.
pub const INSTRUCTION_SIZE_16: u32 = 2;

/// Size of a 32-bit Thumb instruction in bytes.
pub const INSTRUCTION_SIZE_32: u32 = 4;

/// Mask selecting the top five bits of a first halfword.
pub const WIDE_PREFIX_MASK: u16 = 0xF800;

/// Smallest first-halfword prefix (`0b11101`) that starts a 32-bit encoding.
pub const WIDE_PREFIX_MIN: u16 = 0xE800;

/// BKPT immediate that marks an ARM semihosting call.
pub const SEMIHOST_BKPT_IMMEDIATE: u8 = 0xAB;

/// Opcode bits of a 16-bit BKPT; the low byte is the immediate.
pub const BKPT_OPCODE_MASK: u16 = 0xFF00;

/// `BKPT #imm8` with the immediate cleared.
pub const BKPT_OPCODE: u16 = 0xBE00;

/// Encoding of `BKPT #0xAB`.
pub const SEMIHOST_BKPT_ENCODING: u16 = BKPT_OPCODE | SEMIHOST_BKPT_IMMEDIATE as u16;
