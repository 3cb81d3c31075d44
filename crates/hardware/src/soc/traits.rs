//! Memory backend interface.
//!
//! This module defines the [`Memory`] trait the executor and debug stub talk to.
//! It provides the following:
//! 1. **CPU Access:** Checked, little-endian byte, halfword, and word reads and writes.
//! 2. **Debugger Access:** Byte access that bypasses watchpoints and the read-only flag.
//! 3. **Watchpoints:** Installing and removing watchpoints and breakpoints, and
//!    collecting the latched hit.

use crate::common::{BusError, MemoryError};
use crate::soc::memory::watchpoint::{WatchKind, WatchpointHit};

/// A simulated memory backend.
///
/// Reads take `&mut self` because a read may latch a watchpoint hit.
pub trait Memory {
    /// Reads one byte.
    fn read8(&mut self, address: u32) -> Result<u8, BusError>;

    /// Reads one halfword. Fails on misalignment or when the halfword holds a breakpoint.
    fn read16(&mut self, address: u32) -> Result<u16, BusError>;

    /// Reads one word. Fails on misalignment.
    fn read32(&mut self, address: u32) -> Result<u32, BusError>;

    /// Writes one byte.
    fn write8(&mut self, address: u32, value: u8) -> Result<(), BusError>;

    /// Writes one halfword.
    fn write16(&mut self, address: u32, value: u16) -> Result<(), BusError>;

    /// Writes one word.
    fn write32(&mut self, address: u32, value: u32) -> Result<(), BusError>;

    /// Fetches one instruction halfword.
    ///
    /// Defaults to [`Memory::read16`]. Backends override it to keep fetches
    /// from latching data watchpoints.
    fn fetch16(&mut self, address: u32) -> Result<u16, BusError> {
        self.read16(address)
    }

    /// Reads one byte on behalf of the debugger.
    fn debug_read8(&mut self, address: u32) -> Result<u8, BusError> {
        self.read8(address)
    }

    /// Writes one byte on behalf of the debugger, ignoring the read-only flag.
    fn debug_write8(&mut self, address: u32, value: u8) -> Result<(), BusError> {
        self.write8(address, value)
    }

    /// Installs a watchpoint of `kind` over `size` bytes at `address`.
    fn set_watchpoint(&mut self, kind: WatchKind, address: u32, size: u32)
    -> Result<(), MemoryError>;

    /// Removes a watchpoint previously installed with the same arguments.
    fn clear_watchpoint(
        &mut self,
        kind: WatchKind,
        address: u32,
        size: u32,
    ) -> Result<(), MemoryError>;

    /// Returns and clears the watchpoint hit latched since the last call.
    fn take_watchpoint_hit(&mut self) -> Option<WatchpointHit>;

    /// Returns `true` when a breakpoint covers the halfword at `address`.
    fn is_breakpoint_at(&self, address: u32) -> bool;
}
