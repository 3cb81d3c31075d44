//! Watchpoints and breakpoints.
//!
//! Debugger breakpoints and data watchpoints share one representation: an
//! address range tagged with the kind of access that should trigger it.
//! Each region keeps its watchpoints strictly ordered by
//! `(start, end, kind)` so lookups and duplicate detection are binary searches.

use crate::common::AccessType;

/// What a watchpoint reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WatchKind {
    /// Data reads.
    Read,
    /// Data writes.
    Write,
    /// Data reads and writes.
    ReadWrite,
    /// Halfword reads, which covers every instruction fetch.
    Breakpoint,
}

impl WatchKind {
    /// Returns `true` when a data access of type `access` triggers this kind.
    ///
    /// Breakpoints never latch; they fail the access instead.
    pub const fn triggers_on(self, access: AccessType) -> bool {
        matches!(
            (self, access),
            (Self::Read | Self::ReadWrite, AccessType::Read)
                | (Self::Write | Self::ReadWrite, AccessType::Write)
        )
    }
}

/// An address range `[start, end)` watched for one kind of access.
///
/// Field order matters: the derived ordering sorts by start, then end, then kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watchpoint {
    /// First watched address.
    pub start: u32,
    /// One past the last watched address.
    pub end: u32,
    /// Access kind.
    pub kind: WatchKind,
}

impl Watchpoint {
    /// Creates a watchpoint covering `size` bytes from `start`.
    ///
    /// Returns `None` if the range would wrap the address space.
    pub const fn new(kind: WatchKind, start: u32, size: u32) -> Option<Self> {
        match start.checked_add(size) {
            Some(end) => Some(Self { start, end, kind }),
            None => None,
        }
    }

    /// Returns `true` when `[address, address + size)` intersects the watched range.
    #[inline]
    pub const fn overlaps(&self, address: u32, size: u32) -> bool {
        let access_end = address as u64 + size as u64;
        (address as u64) < self.end as u64 && access_end > self.start as u64
    }
}

/// A watchpoint trigger latched by the memory backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchpointHit {
    /// Kind of the watchpoint that fired.
    pub kind: WatchKind,
    /// Address of the access that fired it.
    pub address: u32,
}
