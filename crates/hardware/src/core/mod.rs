//! Core processor implementation.
//!
//! This module contains the ARMv6-M processor model: the architectural register
//! context, the ALU primitives used by data-processing instructions, and the
//! executor and run loop that drive instructions against a memory backend.

/// Architecture-specific components (register context, xPSR layout).
pub mod arch;

/// Instruction execution, checked memory access, and the run loop.
pub mod cpu;

/// Execution units (ALU shifter and adder).
pub mod units;

pub use self::arch::CpuContext;
pub use self::cpu::{run, step};
