//! Target description and memory map documents.
//!
//! Served through `qXfer` in chunks: each reply starts with `m` when more of
//! the document follows and `l` when the chunk reaches its end.

use std::fmt::Write as _;

use super::buffer::{Buffer, BufferError};
use crate::soc::Region;

/// Target description for the M-profile core registers.
pub const TARGET_XML: &str = concat!(
    "<?xml version=\"1.0\"?>",
    "<!DOCTYPE target SYSTEM \"gdb-target.dtd\">",
    "<target version=\"1.0\">",
    "<architecture>arm</architecture>",
    "<feature name=\"org.gnu.gdb.arm.m-profile\">",
    "<reg name=\"r0\" bitsize=\"32\" regnum=\"0\"/>",
    "<reg name=\"r1\" bitsize=\"32\"/>",
    "<reg name=\"r2\" bitsize=\"32\"/>",
    "<reg name=\"r3\" bitsize=\"32\"/>",
    "<reg name=\"r4\" bitsize=\"32\"/>",
    "<reg name=\"r5\" bitsize=\"32\"/>",
    "<reg name=\"r6\" bitsize=\"32\"/>",
    "<reg name=\"r7\" bitsize=\"32\"/>",
    "<reg name=\"r8\" bitsize=\"32\"/>",
    "<reg name=\"r9\" bitsize=\"32\"/>",
    "<reg name=\"r10\" bitsize=\"32\"/>",
    "<reg name=\"r11\" bitsize=\"32\"/>",
    "<reg name=\"r12\" bitsize=\"32\"/>",
    "<reg name=\"sp\" bitsize=\"32\" type=\"data_ptr\"/>",
    "<reg name=\"lr\" bitsize=\"32\"/>",
    "<reg name=\"pc\" bitsize=\"32\" type=\"code_ptr\"/>",
    "<reg name=\"xpsr\" bitsize=\"32\" regnum=\"16\"/>",
    "</feature>",
    "</target>",
);

/// Builds the memory map listing every region.
///
/// Read-only regions are reported as `rom`, everything else as `ram`.
pub fn memory_map(regions: &[Region]) -> String {
    let mut xml = String::from(concat!(
        "<?xml version=\"1.0\"?>",
        "<!DOCTYPE memory-map PUBLIC \"+//IDN gnu.org//DTD GDB Memory Map V1.0//EN\" ",
        "\"http://sourceware.org/gdb/gdb-memory-map.dtd\">",
        "<memory-map>",
    ));
    for region in regions {
        let kind = if region.is_read_only() { "rom" } else { "ram" };
        let _ = write!(
            xml,
            "<memory type=\"{kind}\" start=\"{:#010x}\" length=\"{:#x}\"/>",
            region.base(),
            region.size()
        );
    }
    xml.push_str("</memory-map>");
    xml
}

/// Writes the `qXfer` reply for `length` bytes of `document` from `offset`.
///
/// The chunk is also limited by the space left in `buffer`.
pub fn write_chunk(
    buffer: &mut Buffer,
    document: &str,
    offset: u32,
    length: u32,
) -> Result<(), BufferError> {
    let bytes = document.as_bytes();
    let start = (offset as usize).min(bytes.len());
    let room = buffer.bytes_left().saturating_sub(1);
    let end = start + (length as usize).min(room).min(bytes.len() - start);
    buffer.write_byte(if end < bytes.len() { b'm' } else { b'l' })?;
    bytes[start..end]
        .iter()
        .try_for_each(|&b| buffer.write_byte(b))
}
