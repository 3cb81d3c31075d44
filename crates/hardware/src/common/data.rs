//! Memory Access Types.
//!
//! This module defines the classification of memory accesses used throughout the simulator.
//! These types are used for the following:
//! 1. **Fault Reporting:** Recording which kind of access raised a bus error.
//! 2. **Watchpoint Matching:** Deciding whether a read or write watchpoint fires.
//! 3. **Permission Validation:** Rejecting CPU writes to read-only regions.

use std::fmt;

/// Type of memory access operation.
///
/// Used to distinguish between instruction fetches, data loads, and data stores
/// for fault reporting and watchpoint matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Instruction fetch access.
    ///
    /// Halfword reads issued by the executor to fetch Thumb encodings.
    Fetch,

    /// Data read access.
    ///
    /// Occurs during load instructions and literal pool reads.
    Read,

    /// Data write access.
    ///
    /// Occurs during store instructions, including PUSH and STM.
    Write,
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetch",
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}
