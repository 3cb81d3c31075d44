//! # Command Parsing Tests
//!
//! Maps received payloads to commands, including the argument errors that
//! the stub answers with `E01`.

use pinkysim_core::gdb::commands::{BreakpointSpec, Command, parse};
use pinkysim_core::gdb::{Buffer, BufferError};
use pinkysim_core::soc::WatchKind;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn parsed(payload: &str) -> Result<Command, BufferError> {
    let mut buffer = Buffer::new(256);
    buffer.write_str(payload).unwrap();
    buffer.set_end_of_data();
    parse(&mut buffer)
}

const fn spec(kind: WatchKind, address: u32, size: u32) -> BreakpointSpec {
    BreakpointSpec {
        kind,
        address,
        size,
    }
}

// ─── Simple commands ────────────────────────────────────────────────────────

#[rstest]
#[case::halt_reason("?", Command::HaltReason)]
#[case::read_registers("g", Command::ReadRegisters)]
#[case::read_pc("pf", Command::ReadRegister(15))]
#[case::read_xpsr("p10", Command::ReadRegister(16))]
#[case::kill("k", Command::Kill)]
#[case::detach("D", Command::Detach)]
#[case::set_thread("Hg0", Command::SetThread)]
#[case::set_thread_any("Hc-1", Command::SetThread)]
#[case::empty("", Command::Unknown)]
#[case::vcont("vCont?", Command::Unknown)]
#[case::extended("!", Command::Unknown)]
fn simple_commands(#[case] payload: &str, #[case] expected: Command) {
    assert_eq!(parsed(payload), Ok(expected));
}

#[test]
fn write_register_value_is_little_endian() {
    assert_eq!(
        parsed("P10=00000001"),
        Ok(Command::WriteRegister {
            regnum: 16,
            value: 0x0100_0000,
        })
    );
    assert_eq!(
        parsed("Pd=00100020"),
        Ok(Command::WriteRegister {
            regnum: 13,
            value: 0x2000_1000,
        })
    );
}

#[test]
fn write_register_needs_equals() {
    assert_eq!(parsed("P1:00000000"), Err(BufferError::UnexpectedChar));
}

#[test]
fn write_registers_takes_seventeen_words() {
    let mut payload = String::from("G");
    for n in 0..17u32 {
        payload.push_str(&format!("{:08x}", n.swap_bytes()));
    }
    let Ok(Command::WriteRegisters(set)) = parsed(&payload) else {
        panic!("expected a register set");
    };
    assert_eq!(set[0], 0);
    assert_eq!(set[15], 15);
    assert_eq!(set[16], 16);
}

#[test]
fn short_register_set_is_rejected() {
    assert_eq!(parsed("G00000000"), Err(BufferError::Overrun));
}

// ─── Memory ─────────────────────────────────────────────────────────────────

#[test]
fn read_memory_arguments() {
    assert_eq!(
        parsed("m20000000,4"),
        Ok(Command::ReadMemory {
            address: 0x2000_0000,
            length: 4,
        })
    );
}

#[test]
fn write_memory_decodes_data() {
    assert_eq!(
        parsed("M20000000,3:00aBff"),
        Ok(Command::WriteMemory {
            address: 0x2000_0000,
            data: vec![0x00, 0xAB, 0xFF],
        })
    );
}

#[rstest]
#[case::missing_comma("m20000000", BufferError::UnexpectedChar)]
#[case::bad_address("mzz,4", BufferError::InvalidHexDigit(b'z'))]
#[case::missing_colon("M0,1ab", BufferError::UnexpectedChar)]
#[case::short_data("M0,2:ab", BufferError::Overrun)]
#[case::bad_data("M0,1:g0", BufferError::InvalidHexDigit(b'g'))]
fn malformed_memory_commands(#[case] payload: &str, #[case] error: BufferError) {
    assert_eq!(parsed(payload), Err(error));
}

// ─── Execution ──────────────────────────────────────────────────────────────

#[rstest]
#[case::continue_here("c", Command::Continue(None))]
#[case::continue_at("c100", Command::Continue(Some(0x100)))]
#[case::step_here("s", Command::Step(None))]
#[case::step_at("s2000", Command::Step(Some(0x2000)))]
fn resume_commands(#[case] payload: &str, #[case] expected: Command) {
    assert_eq!(parsed(payload), Ok(expected));
}

// ─── Breakpoints ────────────────────────────────────────────────────────────

#[rstest]
#[case::software_narrow("Z0,100,2", spec(WatchKind::Breakpoint, 0x100, 2))]
#[case::software_wide("Z0,100,4", spec(WatchKind::Breakpoint, 0x100, 4))]
#[case::thumb2_kind("Z1,100,3", spec(WatchKind::Breakpoint, 0x100, 4))]
#[case::write("Z2,20000000,4", spec(WatchKind::Write, 0x2000_0000, 4))]
#[case::read("Z3,20000010,1", spec(WatchKind::Read, 0x2000_0010, 1))]
#[case::access("Z4,20000020,8", spec(WatchKind::ReadWrite, 0x2000_0020, 8))]
fn insert_breakpoint(#[case] payload: &str, #[case] expected: BreakpointSpec) {
    assert_eq!(parsed(payload), Ok(Command::InsertBreakpoint(expected)));
}

#[test]
fn remove_breakpoint_uses_same_arguments() {
    assert_eq!(
        parsed("z2,20000000,4"),
        Ok(Command::RemoveBreakpoint(spec(
            WatchKind::Write,
            0x2000_0000,
            4
        )))
    );
}

#[rstest]
#[case::odd_breakpoint_kind("Z0,100,1")]
#[case::zero_length_watch("Z2,20000000,0")]
#[case::unknown_type("Z5,100,2")]
#[case::missing_kind("Z0,100")]
fn malformed_breakpoints(#[case] payload: &str) {
    assert!(parsed(payload).is_err(), "{payload} should be rejected");
}

// ─── Queries ────────────────────────────────────────────────────────────────

#[rstest]
#[case::supported("qSupported:multiprocess+;swbreak+", Command::QuerySupported)]
#[case::attached("qAttached", Command::QueryAttached)]
#[case::current_thread("qC", Command::QueryCurrentThread)]
#[case::crc("qCRC:0,4", Command::Unknown)]
#[case::thread_info("qfThreadInfo", Command::Unknown)]
#[case::offsets("qOffsets", Command::Unknown)]
fn queries(#[case] payload: &str, #[case] expected: Command) {
    assert_eq!(parsed(payload), Ok(expected));
}

#[test]
fn features_transfer_names_annex() {
    assert_eq!(
        parsed("qXfer:features:read:target.xml:0,ffb"),
        Ok(Command::ReadFeatures {
            annex: "target.xml".to_owned(),
            offset: 0,
            length: 0xFFB,
        })
    );
}

#[test]
fn memory_map_transfer_has_empty_annex() {
    assert_eq!(
        parsed("qXfer:memory-map:read::10,200"),
        Ok(Command::ReadMemoryMap {
            offset: 0x10,
            length: 0x200,
        })
    );
}

#[test]
fn features_transfer_without_range_is_rejected() {
    assert_eq!(
        parsed("qXfer:features:read:target.xml"),
        Err(BufferError::UnexpectedChar)
    );
}
