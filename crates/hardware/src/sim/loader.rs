//! Image Loader and Reset.
//!
//! This module places a program image in simulated memory and sets the
//! initial CPU state. It performs:
//! 1. **ELF loading:** Copies every `PT_LOAD` segment of a 32-bit ARM ELF to its physical address.
//! 2. **Raw binaries:** Copies anything else to the base of the first flash region.
//! 3. **Reset:** Reads the initial SP and PC from the vector table at the image base.

use std::fs;
use std::path::Path;

use object::elf::{self, FileHeader32};
use object::read::elf::{FileHeader, ProgramHeader};
use object::Endianness;

use crate::common::LoadError;
use crate::core::arch::CpuContext;
use crate::soc::{Memory, MemorySim};

/// Where an image landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadedImage {
    /// Lowest address written; the vector table lives here.
    pub base: u32,
    /// ELF entry point, if the image had one.
    pub entry: Option<u32>,
}

/// Reads an image file and loads it.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read, otherwise the errors of [`load_bytes`].
pub fn load_file(memory: &mut MemorySim, path: &Path) -> Result<LoadedImage, LoadError> {
    let data = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = load_bytes(memory, &data)?;
    tracing::info!(
        path = %path.display(),
        base = format_args!("{:#010x}", image.base),
        "image loaded"
    );
    Ok(image)
}

/// Loads an ELF or raw binary image held in memory.
///
/// # Errors
///
/// Fails when the image is empty, is an ELF for another machine, or has a
/// segment outside the declared regions.
pub fn load_bytes(memory: &mut MemorySim, data: &[u8]) -> Result<LoadedImage, LoadError> {
    if data.is_empty() {
        return Err(LoadError::Empty);
    }
    if data.starts_with(&elf::ELFMAG) {
        load_elf(memory, data)
    } else {
        load_raw(memory, data)
    }
}

fn load_elf(memory: &mut MemorySim, data: &[u8]) -> Result<LoadedImage, LoadError> {
    let header = FileHeader32::<Endianness>::parse(data).map_err(|e| LoadError::Elf(e.to_string()))?;
    let endian = header.endian().map_err(|e| LoadError::Elf(e.to_string()))?;
    let machine = header.e_machine(endian);
    if machine != elf::EM_ARM {
        return Err(LoadError::WrongMachine { machine });
    }
    let segments = header
        .program_headers(endian, data)
        .map_err(|e| LoadError::Elf(e.to_string()))?;

    let mut base = None::<u32>;
    for segment in segments {
        if segment.p_type(endian) != elf::PT_LOAD {
            continue;
        }
        let bytes = segment
            .data(endian, data)
            .map_err(|()| LoadError::Elf("segment data out of bounds".to_owned()))?;
        if bytes.is_empty() {
            continue;
        }
        let address = segment.p_paddr(endian);
        memory
            .load(address, bytes)
            .map_err(|_| LoadError::SegmentOutsideMemory {
                address,
                size: segment.p_filesz(endian),
            })?;
        tracing::debug!(
            address = format_args!("{address:#010x}"),
            size = bytes.len(),
            "loaded segment"
        );
        base = Some(base.map_or(address, |b| b.min(address)));
    }

    let base = base.ok_or(LoadError::Empty)?;
    Ok(LoadedImage {
        base,
        entry: Some(header.e_entry(endian)),
    })
}

fn load_raw(memory: &mut MemorySim, data: &[u8]) -> Result<LoadedImage, LoadError> {
    let base = memory
        .regions()
        .iter()
        .find(|r| r.is_read_only())
        .or_else(|| memory.regions().first())
        .map(|r| r.base())
        .ok_or(LoadError::NoRegion)?;
    let size = u32::try_from(data.len()).unwrap_or(u32::MAX);
    memory
        .load(base, data)
        .map_err(|_| LoadError::SegmentOutsideMemory {
            address: base,
            size,
        })?;
    Ok(LoadedImage { base, entry: None })
}

/// Puts `ctx` in its reset state for `image`.
///
/// SP and PC come from the first two vector-table words. The Thumb bit is
/// taken from bit 0 of the reset vector, so an even vector faults on the
/// first step like real hardware. When the table cannot be read or the reset
/// vector is zero, the ELF entry point is used instead.
pub fn reset(ctx: &mut CpuContext, memory: &mut MemorySim, image: &LoadedImage) {
    *ctx = CpuContext::new();
    let vectors = (
        read_word(memory, image.base),
        read_word(memory, image.base.wrapping_add(4)),
    );
    let (sp, pc) = match (vectors, image.entry) {
        ((Some(sp), Some(pc)), _) if pc != 0 => (sp, pc),
        (_, Some(entry)) => (vectors.0.unwrap_or(0), entry | 1),
        ((sp, _), None) => (sp.unwrap_or(0), image.base | 1),
    };
    ctx.sp = sp & !3;
    ctx.pc = pc & !1;
    ctx.set_thumb(pc & 1 != 0);
    tracing::debug!(
        sp = format_args!("{:#010x}", ctx.sp),
        pc = format_args!("{:#010x}", ctx.pc),
        "reset"
    );
}

fn read_word(memory: &mut MemorySim, address: u32) -> Option<u32> {
    let mut bytes = [0u8; 4];
    for (offset, byte) in (0..).zip(&mut bytes) {
        *byte = memory.debug_read8(address.wrapping_add(offset)).ok()?;
    }
    Some(u32::from_le_bytes(bytes))
}
