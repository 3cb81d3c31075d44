//! ARMv6-M Thumb simulator library.
//!
//! This crate implements an instruction-set simulator for ARMv6-M with a GDB remote stub:
//! 1. **Core:** Register context, ALU primitives, the executor, and the run loop.
//! 2. **ISA:** Decoding 16-bit and 32-bit Thumb encodings, plus disassembly.
//! 3. **Memory:** Region-based flash/RAM with watchpoints and breakpoints.
//! 4. **GDB:** Packet framing, TCP/serial transports, and the command dispatcher.
//! 5. **Simulation:** Loader, semihosting, configuration, and statistics collection.

/// Common types and constants (xPSR layout, access types, step results, errors).
pub mod common;
/// Simulator configuration (defaults, memory map, debugger transport).
pub mod config;
/// CPU core (register context, ALU, execution, run loop).
pub mod core;
/// GDB remote serial protocol (buffer, packets, transports, stub).
pub mod gdb;
/// Instruction set (decode, instruction model, disassembly).
pub mod isa;
/// Simulator, image loader, and semihosting.
pub mod sim;
/// Memory backend (trait, regions, watchpoints).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Register context passed to every executor entry point.
pub use crate::core::CpuContext;
/// Context, memory, and statistics in one value.
pub use crate::sim::Simulator;
/// Region-based memory backend.
pub use crate::soc::MemorySim;
