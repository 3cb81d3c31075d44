//! Simulated Memory.
//!
//! This module implements the region-based memory backend. It provides:
//! 1. **Regions:** Non-overlapping blocks of flash (read-only) or RAM, kept sorted by base.
//! 2. **Checked Access:** Aligned little-endian accesses that must fit in one region.
//! 3. **Watchpoints:** Per-region watchpoint lists and a single-hit latch.

/// Contiguous memory blocks with backing storage.
pub mod region;

/// Watchpoint and breakpoint ranges.
pub mod watchpoint;

use self::region::Region;
use self::watchpoint::{WatchKind, Watchpoint, WatchpointHit};
use crate::common::{AccessType, BusError, BusFault, MemoryError};
use crate::soc::traits::Memory;

/// Region-based memory backend.
#[derive(Clone, Debug, Default)]
pub struct MemorySim {
    /// Regions sorted by base address.
    regions: Vec<Region>,
    /// First watchpoint hit since the last `take_watchpoint_hit`.
    hit: Option<WatchpointHit>,
}

impl MemorySim {
    /// Creates a backend with no regions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a zero-filled region at `[base, base + size)`.
    ///
    /// # Errors
    ///
    /// Fails with [`MemoryError::ZeroSize`], [`MemoryError::AddressOverflow`],
    /// or [`MemoryError::Overlap`] if the region intersects one already declared.
    pub fn add_region(&mut self, base: u32, size: u32, read_only: bool) -> Result<(), MemoryError> {
        let region = Region::new(base, size, read_only)?;
        if let Some(existing) = self.regions.iter().find(|r| r.intersects(base, size)) {
            return Err(MemoryError::Overlap {
                base,
                size,
                existing: existing.base(),
            });
        }
        let slot = self.regions.partition_point(|r| r.base() < base);
        self.regions.insert(slot, region);
        Ok(())
    }

    /// Declared regions in address order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Copies `data` to `address`, ignoring the read-only flag.
    ///
    /// Used by the image loader. The whole range must sit in one region.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::Unmapped`] when no region holds the range.
    pub fn load(&mut self, address: u32, data: &[u8]) -> Result<(), MemoryError> {
        let size = u32::try_from(data.len()).map_err(|_| MemoryError::Unmapped {
            address,
            size: u32::MAX,
        })?;
        let index = self
            .find(address, size)
            .ok_or(MemoryError::Unmapped { address, size })?;
        self.regions[index]
            .bytes_mut(address, data.len())
            .copy_from_slice(data);
        Ok(())
    }

    /// Removes every watchpoint and breakpoint and clears the latch.
    pub fn clear_watchpoints(&mut self) {
        for region in &mut self.regions {
            region.clear_watchpoints();
        }
        self.hit = None;
    }

    /// Index of the region holding all of `[address, address + size)`.
    fn find(&self, address: u32, size: u32) -> Option<usize> {
        let slot = self.regions.partition_point(|r| r.base() <= address);
        let index = slot.checked_sub(1)?;
        self.regions[index].contains(address, size).then_some(index)
    }

    /// Resolves a CPU access to its region index.
    fn resolve(&self, address: u32, size: u32, access: AccessType) -> Result<usize, BusError> {
        if address % size != 0 {
            return Err(BusError::new(address, size, access, BusFault::Misaligned));
        }
        self.find(address, size)
            .ok_or(BusError::new(address, size, access, BusFault::Unmapped))
    }

    /// Latches the first data watchpoint the access triggers.
    fn latch(&mut self, index: usize, address: u32, size: u32, access: AccessType) {
        if self.hit.is_some() {
            return;
        }
        if let Some(wp) =
            self.regions[index].find_watchpoint(address, size, |kind| kind.triggers_on(access))
        {
            tracing::debug!(address = format_args!("{address:#010x}"), kind = ?wp.kind, "watchpoint hit");
            self.hit = Some(WatchpointHit {
                kind: wp.kind,
                address,
            });
        }
    }

    fn read<const N: usize>(&mut self, address: u32, access: AccessType) -> Result<[u8; N], BusError> {
        let size = N as u32;
        let index = self.resolve(address, size, access)?;
        let region = &self.regions[index];
        if N == 2
            && region
                .find_watchpoint(address, size, |kind| kind == WatchKind::Breakpoint)
                .is_some()
        {
            return Err(BusError::new(address, size, access, BusFault::Breakpoint));
        }
        let mut out = [0; N];
        out.copy_from_slice(region.bytes(address, N));
        if access == AccessType::Read {
            self.latch(index, address, size, access);
        }
        Ok(out)
    }

    fn write<const N: usize>(&mut self, address: u32, bytes: [u8; N]) -> Result<(), BusError> {
        let size = N as u32;
        let index = self.resolve(address, size, AccessType::Write)?;
        let region = &mut self.regions[index];
        if region.is_read_only() {
            return Err(BusError::new(
                address,
                size,
                AccessType::Write,
                BusFault::ReadOnly,
            ));
        }
        region.bytes_mut(address, N).copy_from_slice(&bytes);
        self.latch(index, address, size, AccessType::Write);
        Ok(())
    }

    /// Looks up the region holding a watchpoint range.
    fn watch_region(&mut self, address: u32, size: u32) -> Result<&mut Region, MemoryError> {
        let index = self
            .find(address, size)
            .ok_or(MemoryError::Unmapped { address, size })?;
        Ok(&mut self.regions[index])
    }
}

impl Memory for MemorySim {
    fn read8(&mut self, address: u32) -> Result<u8, BusError> {
        self.read::<1>(address, AccessType::Read).map(|[b]| b)
    }

    fn read16(&mut self, address: u32) -> Result<u16, BusError> {
        self.read(address, AccessType::Read).map(u16::from_le_bytes)
    }

    fn read32(&mut self, address: u32) -> Result<u32, BusError> {
        self.read(address, AccessType::Read).map(u32::from_le_bytes)
    }

    fn write8(&mut self, address: u32, value: u8) -> Result<(), BusError> {
        self.write(address, [value])
    }

    fn write16(&mut self, address: u32, value: u16) -> Result<(), BusError> {
        self.write(address, value.to_le_bytes())
    }

    fn write32(&mut self, address: u32, value: u32) -> Result<(), BusError> {
        self.write(address, value.to_le_bytes())
    }

    fn fetch16(&mut self, address: u32) -> Result<u16, BusError> {
        self.read(address, AccessType::Fetch).map(u16::from_le_bytes)
    }

    fn debug_read8(&mut self, address: u32) -> Result<u8, BusError> {
        let index = self
            .find(address, 1)
            .ok_or(BusError::new(address, 1, AccessType::Read, BusFault::Unmapped))?;
        Ok(self.regions[index].bytes(address, 1)[0])
    }

    fn debug_write8(&mut self, address: u32, value: u8) -> Result<(), BusError> {
        let index = self
            .find(address, 1)
            .ok_or(BusError::new(address, 1, AccessType::Write, BusFault::Unmapped))?;
        self.regions[index].bytes_mut(address, 1)[0] = value;
        Ok(())
    }

    fn set_watchpoint(
        &mut self,
        kind: WatchKind,
        address: u32,
        size: u32,
    ) -> Result<(), MemoryError> {
        let wp = Watchpoint::new(kind, address, size)
            .ok_or(MemoryError::Unmapped { address, size })?;
        self.watch_region(address, size)?.insert_watchpoint(wp)
    }

    fn clear_watchpoint(
        &mut self,
        kind: WatchKind,
        address: u32,
        size: u32,
    ) -> Result<(), MemoryError> {
        let wp = Watchpoint::new(kind, address, size)
            .ok_or(MemoryError::NotFound { address })?;
        self.watch_region(address, size)
            .map_err(|_| MemoryError::NotFound { address })?
            .remove_watchpoint(wp)
    }

    fn take_watchpoint_hit(&mut self) -> Option<WatchpointHit> {
        self.hit.take()
    }

    fn is_breakpoint_at(&self, address: u32) -> bool {
        self.find(address, 1).is_some_and(|index| {
            self.regions[index]
                .find_watchpoint(address, 2, |kind| kind == WatchKind::Breakpoint)
                .is_some()
        })
    }
}
