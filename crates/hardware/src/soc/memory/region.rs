//! Memory regions.
//!
//! A region is a contiguous block of simulated memory with its own backing
//! bytes, a read-only flag, and the watchpoints that fall inside it.

use super::watchpoint::{WatchKind, Watchpoint};
use crate::common::MemoryError;

/// A contiguous block of simulated memory mapped at `[base, base + size)`.
#[derive(Clone, Debug)]
pub struct Region {
    base: u32,
    data: Vec<u8>,
    read_only: bool,
    watchpoints: Vec<Watchpoint>,
}

impl Region {
    /// Creates a zero-filled region.
    ///
    /// # Arguments
    ///
    /// * `base` - First mapped address.
    /// * `size` - Length in bytes; must be non-zero.
    /// * `read_only` - Whether CPU writes are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ZeroSize`] for an empty region and
    /// [`MemoryError::AddressOverflow`] if `base + size` does not fit in 32 bits.
    pub fn new(base: u32, size: u32, read_only: bool) -> Result<Self, MemoryError> {
        if size == 0 {
            return Err(MemoryError::ZeroSize { base });
        }
        if base.checked_add(size).is_none() {
            return Err(MemoryError::AddressOverflow { base, size });
        }
        Ok(Self {
            base,
            data: vec![0; size as usize],
            read_only,
            watchpoints: Vec::new(),
        })
    }

    /// First mapped address.
    #[inline]
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Length in bytes.
    #[inline]
    pub fn size(&self) -> u32 {
        self.data.len() as u32
    }

    /// One past the last mapped address.
    #[inline]
    pub fn end(&self) -> u32 {
        self.base + self.size()
    }

    /// Whether CPU writes are rejected.
    #[inline]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns `true` when `[address, address + size)` lies wholly inside the region.
    #[inline]
    pub fn contains(&self, address: u32, size: u32) -> bool {
        address >= self.base && address as u64 + size as u64 <= self.end() as u64
    }

    /// Returns `true` when the region shares any byte with `[base, base + size)`.
    pub fn intersects(&self, base: u32, size: u32) -> bool {
        (base as u64) < self.end() as u64 && base as u64 + size as u64 > self.base as u64
    }

    /// Borrows `len` bytes starting at `address`.
    ///
    /// The caller has already checked [`Region::contains`].
    #[inline]
    pub fn bytes(&self, address: u32, len: usize) -> &[u8] {
        let offset = (address - self.base) as usize;
        &self.data[offset..offset + len]
    }

    /// Mutably borrows `len` bytes starting at `address`.
    #[inline]
    pub fn bytes_mut(&mut self, address: u32, len: usize) -> &mut [u8] {
        let offset = (address - self.base) as usize;
        &mut self.data[offset..offset + len]
    }

    /// Installed watchpoints in `(start, end, kind)` order.
    pub fn watchpoints(&self) -> &[Watchpoint] {
        &self.watchpoints
    }

    /// Inserts a watchpoint at its sorted position.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::AlreadyPresent`] for an identical watchpoint.
    pub fn insert_watchpoint(&mut self, watchpoint: Watchpoint) -> Result<(), MemoryError> {
        match self.watchpoints.binary_search(&watchpoint) {
            Ok(_) => Err(MemoryError::AlreadyPresent {
                address: watchpoint.start,
            }),
            Err(slot) => {
                self.watchpoints.insert(slot, watchpoint);
                Ok(())
            }
        }
    }

    /// Removes an identical watchpoint.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::NotFound`] if no such watchpoint is installed.
    pub fn remove_watchpoint(&mut self, watchpoint: Watchpoint) -> Result<(), MemoryError> {
        match self.watchpoints.binary_search(&watchpoint) {
            Ok(slot) => {
                let _ = self.watchpoints.remove(slot);
                Ok(())
            }
            Err(_) => Err(MemoryError::NotFound {
                address: watchpoint.start,
            }),
        }
    }

    /// Removes every watchpoint.
    pub fn clear_watchpoints(&mut self) {
        self.watchpoints.clear();
    }

    /// Finds the first watchpoint overlapping the access that satisfies `pred`.
    pub fn find_watchpoint(
        &self,
        address: u32,
        size: u32,
        pred: impl Fn(WatchKind) -> bool,
    ) -> Option<&Watchpoint> {
        let end = address as u64 + size as u64;
        self.watchpoints
            .iter()
            .take_while(|w| (w.start as u64) < end)
            .find(|w| w.overlaps(address, size) && pred(w.kind))
    }
}
