//! # Semihosting Tests
//!
//! Host calls are serviced against a flash/RAM memory map. Each test places
//! the call arguments in registers and RAM, services one call, and checks the
//! result in R0, the console output, and the PC.

use pinkysim_core::sim::SemihostAction;
use pinkysim_core::sim::semihost::{ADP_STOPPED_APPLICATION_EXIT, SemihostHost, op};
use pinkysim_core::soc::{Memory, WatchKind};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::{RAM_BASE, RAM_SIZE, TestContext};
use crate::common::mocks::memory::MockBus;

const FAILURE: u32 = u32::MAX;
const BLOCK: u32 = RAM_BASE;
const DATA: u32 = RAM_BASE + 0x100;

struct Call {
    tc: TestContext,
    out: Vec<u8>,
    action: SemihostAction,
}

impl Call {
    fn r0(&self) -> u32 {
        self.tc.ctx.r[0]
    }
}

fn call(host: &SemihostHost, tc: TestContext, operation: u32, param: u32) -> Call {
    let mut tc = tc.with_reg(0, operation).with_reg(1, param);
    tc.ctx.pc = 0x40;
    let mut out = Vec::new();
    let action = host.service(&mut tc.ctx, &mut tc.mem, &mut out);
    Call { tc, out, action }
}

fn service(tc: TestContext, operation: u32, param: u32) -> Call {
    call(&SemihostHost::default(), tc, operation, param)
}

fn with_bytes(tc: TestContext, address: u32, bytes: &[u8]) -> TestContext {
    let mut tc = tc;
    tc.mem.load(address, bytes).unwrap();
    tc
}

// ─── Console ────────────────────────────────────────────────────────────────

#[test]
fn writec_emits_one_character() {
    let tc = with_bytes(TestContext::new(), DATA, b"xyz");
    let done = service(tc, op::SYS_WRITEC, DATA);
    assert_eq!(done.out, b"x");
    assert_eq!(done.r0(), 0);
    assert_eq!(done.action, SemihostAction::Resume);
    assert_eq!(done.tc.ctx.pc, 0x42);
}

#[test]
fn write0_stops_at_terminator() {
    let tc = with_bytes(TestContext::new(), DATA, b"hello\0world");
    let done = service(tc, op::SYS_WRITE0, DATA);
    assert_eq!(done.out, b"hello");
    assert_eq!(done.r0(), 0);
}

#[test]
fn write0_running_off_memory_fails() {
    let end = RAM_BASE + RAM_SIZE - 3;
    let tc = with_bytes(TestContext::new(), end, b"abc");
    let done = service(tc, op::SYS_WRITE0, end);
    assert!(done.out.is_empty());
    assert_eq!(done.r0(), FAILURE);
    assert_eq!(done.tc.ctx.pc, 0x42);
}

#[rstest]
#[case::stdout(1)]
#[case::stderr(2)]
fn write_to_console_handles(#[case] handle: u32) {
    let tc = with_bytes(TestContext::new(), DATA, b"log line")
        .with_word(BLOCK, handle)
        .with_word(BLOCK + 4, DATA)
        .with_word(BLOCK + 8, 3);
    let done = service(tc, op::SYS_WRITE, BLOCK);
    assert_eq!(done.out, b"log");
    assert_eq!(done.r0(), 0);
}

#[test]
fn write_running_off_memory_emits_nothing() {
    let end = RAM_BASE + RAM_SIZE - 4;
    let tc = with_bytes(TestContext::new(), end, b"tail")
        .with_word(BLOCK, 1)
        .with_word(BLOCK + 4, end)
        .with_word(BLOCK + 8, 8);
    let done = service(tc, op::SYS_WRITE, BLOCK);
    assert!(done.out.is_empty());
    assert_eq!(done.r0(), FAILURE);
    assert_eq!(done.tc.ctx.pc, 0x42);
}

#[test]
fn write_to_other_handle_reports_nothing_written() {
    let tc = TestContext::new()
        .with_word(BLOCK, 7)
        .with_word(BLOCK + 4, DATA)
        .with_word(BLOCK + 8, 5);
    let done = service(tc, op::SYS_WRITE, BLOCK);
    assert!(done.out.is_empty());
    assert_eq!(done.r0(), 5);
}

#[test]
fn console_reads_use_debug_path() {
    let mut bus = MockBus::new();
    let _ = bus
        .expect_debug_read8()
        .times(1)
        .returning(|_| Ok(b'!'));
    let mut ctx = pinkysim_core::CpuContext::new();
    ctx.r[0] = op::SYS_WRITEC;
    ctx.r[1] = DATA;
    let mut out = Vec::new();
    let action = SemihostHost::default().service(&mut ctx, &mut bus, &mut out);
    assert_eq!(action, SemihostAction::Resume);
    assert_eq!(out, b"!");
}

#[test]
fn console_reads_do_not_trip_watchpoints() {
    let mut tc = with_bytes(TestContext::new(), DATA, b"ok\0");
    tc.mem.set_watchpoint(WatchKind::Read, DATA, 4).unwrap();
    let mut done = service(tc, op::SYS_WRITE0, DATA);
    assert_eq!(done.out, b"ok");
    assert_eq!(done.tc.mem.take_watchpoint_hit(), None);
}

// ─── Environment ────────────────────────────────────────────────────────────

#[test]
fn command_line_is_copied_with_terminator() {
    let host = SemihostHost::new("fw --fast".to_owned());
    let tc = TestContext::new()
        .with_word(BLOCK, DATA)
        .with_word(BLOCK + 4, 64);
    let mut done = call(&host, tc, op::SYS_GET_CMDLINE, BLOCK);
    assert_eq!(done.r0(), 0);
    assert_eq!(done.tc.word(BLOCK + 4), 9);
    let copied: Vec<u8> = (0..10)
        .map(|i| done.tc.mem.debug_read8(DATA + i).unwrap())
        .collect();
    assert_eq!(copied, b"fw --fast\0");
}

#[test]
fn command_line_too_long_for_buffer_fails() {
    let host = SemihostHost::new("firmware".to_owned());
    let tc = TestContext::new()
        .with_word(BLOCK, DATA)
        .with_word(BLOCK + 4, 8);
    let mut done = call(&host, tc, op::SYS_GET_CMDLINE, BLOCK);
    assert_eq!(done.r0(), FAILURE);
    assert_eq!(done.tc.word(BLOCK + 4), 8);
    assert_eq!(done.tc.word(DATA), 0);
}

#[test]
fn heapinfo_reports_unknown_bounds() {
    let tc = TestContext::new()
        .with_word(BLOCK, DATA)
        .with_word(DATA, 0x1111_1111)
        .with_word(DATA + 12, 0x2222_2222);
    let mut done = service(tc, op::SYS_HEAPINFO, BLOCK);
    assert_eq!(done.r0(), 0);
    for offset in [0, 4, 8, 12] {
        assert_eq!(done.tc.word(DATA + offset), 0);
    }
}

#[test]
fn errno_is_zero() {
    assert_eq!(service(TestContext::new(), op::SYS_ERRNO, 0).r0(), 0);
}

#[test]
fn time_is_seconds_since_epoch() {
    let done = service(TestContext::new(), op::SYS_TIME, 0);
    assert!(done.r0() > 1_600_000_000, "time {}", done.r0());
}

#[test]
fn clock_starts_near_zero() {
    let done = service(TestContext::new(), op::SYS_CLOCK, 0);
    assert!(done.r0() < 100, "clock {}", done.r0());
}

#[test]
fn unknown_operation_fails_and_resumes() {
    let done = service(TestContext::new(), 0x01, 0);
    assert_eq!(done.r0(), FAILURE);
    assert_eq!(done.action, SemihostAction::Resume);
    assert_eq!(done.tc.ctx.pc, 0x42);
}

#[test]
fn unreadable_argument_block_fails() {
    let done = service(TestContext::new(), op::SYS_WRITE, 0x4000_0000);
    assert_eq!(done.r0(), FAILURE);
    assert_eq!(done.tc.ctx.pc, 0x42);
}

// ─── Termination ────────────────────────────────────────────────────────────

#[test]
fn exit_with_application_exit_reason_is_success() {
    let done = service(TestContext::new(), op::SYS_EXIT, ADP_STOPPED_APPLICATION_EXIT);
    assert_eq!(done.action, SemihostAction::Exit(0));
    assert_eq!(done.tc.ctx.pc, 0x40);
}

#[test]
fn exit_with_other_reason_is_failure() {
    let done = service(TestContext::new(), op::SYS_EXIT, 0x2_0023);
    assert_eq!(done.action, SemihostAction::Exit(1));
}

#[rstest]
#[case::success(ADP_STOPPED_APPLICATION_EXIT, 0, 0)]
#[case::subcode(ADP_STOPPED_APPLICATION_EXIT, 42, 42)]
#[case::other_reason(0x2_0023, 42, 1)]
fn exit_extended_reads_block(#[case] reason: u32, #[case] subcode: u32, #[case] code: i32) {
    let tc = TestContext::new()
        .with_word(BLOCK, reason)
        .with_word(BLOCK + 4, subcode);
    let done = service(tc, op::SYS_EXIT_EXTENDED, BLOCK);
    assert_eq!(done.action, SemihostAction::Exit(code));
}

#[test]
fn exit_extended_with_unreadable_block_is_failure() {
    let done = service(TestContext::new(), op::SYS_EXIT_EXTENDED, 0x4000_0000);
    assert_eq!(done.action, SemihostAction::Exit(1));
}
