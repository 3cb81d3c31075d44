//! # Image Loading Tests
//!
//! This module covers placing ELF and raw images in memory and deriving the
//! reset state from the vector table, including every fallback for missing
//! or zero vectors.

use std::io::Write;
use std::path::Path;

use pinkysim_core::common::LoadError;
use pinkysim_core::sim::LoadedImage;
use pinkysim_core::sim::loader::{load_bytes, load_file, reset};
use pinkysim_core::{CpuContext, MemorySim};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use crate::common::harness::{FLASH_BASE, FLASH_SIZE, RAM_BASE, RAM_SIZE, STACK_TOP};

const EM_ARM: u16 = 40;
const EM_386: u16 = 3;
const PT_LOAD: u32 = 1;
const PT_NOTE: u32 = 4;

/// One program header of a hand-built ELF.
struct Segment<'a> {
    kind: u32,
    vaddr: u32,
    paddr: u32,
    data: &'a [u8],
}

impl<'a> Segment<'a> {
    const fn load(paddr: u32, data: &'a [u8]) -> Self {
        Self {
            kind: PT_LOAD,
            vaddr: paddr,
            paddr,
            data,
        }
    }
}

/// Builds a little-endian ELF32 executable with the given program headers.
fn elf(machine: u16, entry: u32, segments: &[Segment<'_>]) -> Vec<u8> {
    const EHSIZE: u32 = 52;
    const PHENTSIZE: u32 = 32;
    let count = u32::try_from(segments.len()).unwrap();

    let mut out = Vec::new();
    out.extend_from_slice(&[0x7F, b'E', b'L', b'F', 1, 1, 1, 0]);
    out.extend_from_slice(&[0; 8]);
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&machine.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&entry.to_le_bytes());
    out.extend_from_slice(&EHSIZE.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0x0500_0200u32.to_le_bytes());
    out.extend_from_slice(&(EHSIZE as u16).to_le_bytes());
    out.extend_from_slice(&(PHENTSIZE as u16).to_le_bytes());
    out.extend_from_slice(&(count as u16).to_le_bytes());
    out.extend_from_slice(&[0; 6]);
    assert_eq!(out.len(), EHSIZE as usize);

    let mut offset = EHSIZE + PHENTSIZE * count;
    for segment in segments {
        let size = u32::try_from(segment.data.len()).unwrap();
        for field in [
            segment.kind,
            offset,
            segment.vaddr,
            segment.paddr,
            size,
            size,
            5,
            4,
        ] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        offset += size;
    }
    for segment in segments {
        out.extend_from_slice(segment.data);
    }
    out
}

/// Vector table words followed by code.
fn vectors(sp: u32, reset_vector: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&sp.to_le_bytes());
    bytes.extend_from_slice(&reset_vector.to_le_bytes());
    bytes.extend_from_slice(&0xBF00u16.to_le_bytes());
    bytes
}

fn memory() -> MemorySim {
    let mut mem = MemorySim::new();
    mem.add_region(FLASH_BASE, FLASH_SIZE, true).unwrap();
    mem.add_region(RAM_BASE, RAM_SIZE, false).unwrap();
    mem
}

fn byte(mem: &mut MemorySim, address: u32) -> u8 {
    use pinkysim_core::soc::Memory;
    mem.debug_read8(address).unwrap()
}

fn temp_file(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

fn reset_for(image: LoadedImage, mem: &mut MemorySim) -> CpuContext {
    let mut ctx = CpuContext::new();
    reset(&mut ctx, mem, &image);
    ctx
}

// ─── ELF images ─────────────────────────────────────────────────────────────

#[test]
fn elf_segments_land_at_physical_addresses() {
    let text = vectors(STACK_TOP, 0x9);
    let data = [0xAA, 0xBB];
    let image = elf(
        EM_ARM,
        0x9,
        &[Segment::load(0, &text), Segment::load(RAM_BASE, &data)],
    );
    let mut mem = memory();
    let loaded = load_bytes(&mut mem, &image).unwrap();
    assert_eq!(
        loaded,
        LoadedImage {
            base: 0,
            entry: Some(0x9),
        }
    );
    assert_eq!(byte(&mut mem, 8), 0x00);
    assert_eq!(byte(&mut mem, 9), 0xBF);
    assert_eq!(byte(&mut mem, RAM_BASE + 1), 0xBB);
}

#[test]
fn elf_load_address_is_physical_not_virtual() {
    let code = [0x00, 0xBF];
    let image = elf(
        EM_ARM,
        0x101,
        &[Segment {
            kind: PT_LOAD,
            vaddr: 0x0800_0100,
            paddr: 0x100,
            data: &code,
        }],
    );
    let mut mem = memory();
    let loaded = load_bytes(&mut mem, &image).unwrap();
    assert_eq!(loaded.base, 0x100);
    assert_eq!(byte(&mut mem, 0x101), 0xBF);
}

#[test]
fn elf_base_is_lowest_segment() {
    let high = [1, 2];
    let low = [3, 4];
    let image = elf(
        EM_ARM,
        0,
        &[Segment::load(0x200, &high), Segment::load(0x40, &low)],
    );
    let loaded = load_bytes(&mut memory(), &image).unwrap();
    assert_eq!(loaded.base, 0x40);
}

#[test]
fn non_load_segments_are_skipped() {
    let note = [0xFF; 4];
    let code = [0x00, 0xBF];
    let image = elf(
        EM_ARM,
        0,
        &[
            Segment {
                kind: PT_NOTE,
                vaddr: 0x3000_0000,
                paddr: 0x3000_0000,
                data: &note,
            },
            Segment::load(0, &code),
        ],
    );
    assert_eq!(load_bytes(&mut memory(), &image).unwrap().base, 0);
}

#[test]
fn elf_for_another_machine_is_rejected() {
    let code = [0x90];
    let image = elf(EM_386, 0, &[Segment::load(0, &code)]);
    let err = load_bytes(&mut memory(), &image).unwrap_err();
    assert!(matches!(err, LoadError::WrongMachine { machine: EM_386 }));
}

#[test]
fn elf_segment_outside_memory_is_rejected() {
    let code = [0; 8];
    let image = elf(EM_ARM, 0, &[Segment::load(0x4000_0000, &code)]);
    let err = load_bytes(&mut memory(), &image).unwrap_err();
    assert!(matches!(
        err,
        LoadError::SegmentOutsideMemory {
            address: 0x4000_0000,
            size: 8,
        }
    ));
}

#[test]
fn elf_without_loadable_data_is_empty() {
    let image = elf(EM_ARM, 0, &[Segment::load(0, &[])]);
    let err = load_bytes(&mut memory(), &image).unwrap_err();
    assert!(matches!(err, LoadError::Empty));
}

#[test]
fn truncated_elf_is_malformed() {
    let image = elf(EM_ARM, 0, &[]);
    let err = load_bytes(&mut memory(), &image[..20]).unwrap_err();
    assert!(matches!(err, LoadError::Elf(_)));
}

// ─── Raw images ─────────────────────────────────────────────────────────────

#[test]
fn raw_image_goes_to_first_flash_region() {
    let mut mem = MemorySim::new();
    mem.add_region(RAM_BASE, RAM_SIZE, false).unwrap();
    mem.add_region(0x0800_0000, 0x1000, true).unwrap();
    let loaded = load_bytes(&mut mem, &[0x11, 0x22]).unwrap();
    assert_eq!(
        loaded,
        LoadedImage {
            base: 0x0800_0000,
            entry: None,
        }
    );
    assert_eq!(byte(&mut mem, 0x0800_0001), 0x22);
}

#[test]
fn raw_image_falls_back_to_lowest_region() {
    let mut mem = MemorySim::new();
    mem.add_region(0x3000_0000, 0x100, false).unwrap();
    mem.add_region(RAM_BASE, 0x100, false).unwrap();
    assert_eq!(load_bytes(&mut mem, &[1]).unwrap().base, RAM_BASE);
}

#[test]
fn raw_image_needs_a_region() {
    let err = load_bytes(&mut MemorySim::new(), &[1, 2]).unwrap_err();
    assert!(matches!(err, LoadError::NoRegion));
}

#[test]
fn raw_image_larger_than_flash_is_rejected() {
    let data = vec![0; FLASH_SIZE as usize + 2];
    let err = load_bytes(&mut memory(), &data).unwrap_err();
    assert!(matches!(
        err,
        LoadError::SegmentOutsideMemory { address: 0, .. }
    ));
}

#[test]
fn empty_image_is_rejected() {
    assert!(matches!(
        load_bytes(&mut memory(), &[]),
        Err(LoadError::Empty)
    ));
}

// ─── Files ──────────────────────────────────────────────────────────────────

#[test]
fn image_file_is_read_and_loaded() {
    let file = temp_file(&vectors(STACK_TOP, 0x9));
    let mut mem = memory();
    let loaded = load_file(&mut mem, file.path()).unwrap();
    assert_eq!(loaded.base, 0);
    assert_eq!(byte(&mut mem, 4), 0x09);
}

#[test]
fn missing_file_reports_path() {
    let path = Path::new("/nonexistent/firmware.elf");
    let err = load_file(&mut memory(), path).unwrap_err();
    match err {
        LoadError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected an I/O error, got {other}"),
    }
}

// ─── Reset ──────────────────────────────────────────────────────────────────

#[test]
fn reset_takes_sp_and_pc_from_vector_table() {
    let mut mem = memory();
    let image = load_bytes(&mut mem, &vectors(STACK_TOP, 0x9)).unwrap();
    let ctx = reset_for(image, &mut mem);
    assert_eq!(ctx.sp, STACK_TOP);
    assert_eq!(ctx.pc, 8);
    assert!(ctx.thumb());
}

#[test]
fn reset_aligns_stack_pointer() {
    let mut mem = memory();
    let image = load_bytes(&mut mem, &vectors(STACK_TOP - 1, 0x9)).unwrap();
    assert_eq!(reset_for(image, &mut mem).sp, STACK_TOP - 4);
}

#[test]
fn even_reset_vector_clears_thumb_bit() {
    let mut mem = memory();
    let image = load_bytes(&mut mem, &vectors(STACK_TOP, 0x8)).unwrap();
    let ctx = reset_for(image, &mut mem);
    assert_eq!(ctx.pc, 8);
    assert!(!ctx.thumb());
}

#[test]
fn zero_reset_vector_falls_back_to_entry() {
    let text = vectors(STACK_TOP, 0);
    let image = elf(EM_ARM, 0x8, &[Segment::load(0, &text)]);
    let mut mem = memory();
    let loaded = load_bytes(&mut mem, &image).unwrap();
    let ctx = reset_for(loaded, &mut mem);
    assert_eq!(ctx.sp, STACK_TOP);
    assert_eq!(ctx.pc, 8);
    assert!(ctx.thumb());
}

#[test]
fn zero_reset_vector_without_entry_starts_at_base() {
    let mut mem = memory();
    let image = load_bytes(&mut mem, &vectors(STACK_TOP, 0)).unwrap();
    let ctx = reset_for(image, &mut mem);
    assert_eq!(ctx.pc, 0);
    assert!(ctx.thumb());
}

#[test]
fn unreadable_vector_table_uses_entry() {
    let mut mem = memory();
    let image = LoadedImage {
        base: 0x4000_0000,
        entry: Some(0x10),
    };
    let ctx = reset_for(image, &mut mem);
    assert_eq!(ctx.sp, 0);
    assert_eq!(ctx.pc, 0x10);
    assert!(ctx.thumb());
}

#[test]
fn reset_clears_previous_state() {
    let mut mem = memory();
    let image = load_bytes(&mut mem, &vectors(STACK_TOP, 0x9)).unwrap();
    let mut ctx = CpuContext::new();
    ctx.r[0] = 0xDEAD;
    ctx.lr = 0xFFFF_FFFF;
    ctx.primask = true;
    reset(&mut ctx, &mut mem, &image);
    assert_eq!(ctx.r[0], 0);
    assert_eq!(ctx.lr, 0);
    assert!(!ctx.primask);
}
