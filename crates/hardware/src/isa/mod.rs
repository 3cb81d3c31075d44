//! Instruction Set Architecture (ISA) Definitions.
//!
//! Contains the decoded ARMv6-M Thumb instruction model, the decoder that
//! produces it from 16-bit and 32-bit encodings, and a disassembler for
//! tracing.

/// Thumb instruction decoding for the 16-bit and 32-bit encoding spaces.
pub mod decode;

/// Instruction disassembler for debug tracing and diagnostics.
pub mod disasm;

/// Decoded instruction enum, operand kinds, and condition codes.
pub mod instruction;

pub use decode::{decode16, decode32, is_32bit};
pub use instruction::{Condition, Instruction, InstructionClass};
