//! System-on-Chip (SoC) Components.
//!
//! This module organizes the memory side of the simulated system: the
//! backend trait the CPU and debugger use, and the region-based
//! implementation with watchpoint support.

/// Region-based simulated memory with watchpoints.
pub mod memory;

/// Memory backend trait definitions.
pub mod traits;

pub use memory::MemorySim;
pub use memory::region::Region;
pub use memory::watchpoint::{WatchKind, Watchpoint, WatchpointHit};
pub use traits::Memory;
