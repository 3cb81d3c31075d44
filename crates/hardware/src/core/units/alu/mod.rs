//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the integer primitives used by the executor.
//! Every function is pure and operates on 32-bit values, returning carry
//! and overflow explicitly so the caller decides which flags to commit.
//!
//! Operations are organized into submodules by category:
//! - [`arithmetic`]: `AddWithCarry` and the add/subtract helpers built on it
//! - [`logic`]:      Byte reversal and sign/zero extension
//! - [`shifts`]:     `Shift_C`, `Shift`, and `DecodeImmShift`

/// Integer addition and subtraction with carry and overflow.
pub mod arithmetic;

/// Byte reversal and extension operations.
pub mod logic;

/// Shift and rotate operations with carry out.
pub mod shifts;

pub use arithmetic::add_with_carry;
pub use shifts::{SRType, decode_imm_shift, shift, shift_c};
