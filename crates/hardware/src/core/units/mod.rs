//! Execution units and functional components.
//!
//! ARMv6-M data-processing instructions are built from a small set of ALU
//! primitives defined by the architecture manual pseudocode.

/// Arithmetic Logic Unit: shifter, adder, and byte/halfword manipulation.
pub mod alu;
