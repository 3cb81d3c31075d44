//! # Stop Classification Tests
//!
//! Which signal and console message GDB sees for each way execution stops.

use pinkysim_core::common::StepResult;
use pinkysim_core::gdb::StopReason;
use pinkysim_core::gdb::signal::{SIGILL, SIGINT, SIGSEGV, SIGTRAP};
use pinkysim_core::soc::{WatchKind, WatchpointHit};
use pretty_assertions::assert_eq;
use rstest::rstest;

const HIT: WatchpointHit = WatchpointHit {
    kind: WatchKind::Write,
    address: 0x2000_0004,
};

#[rstest]
#[case::step_done(StepResult::Ok, SIGTRAP, None)]
#[case::bkpt(StepResult::Bkpt, SIGTRAP, None)]
#[case::interrupt(StepResult::Interrupt, SIGINT, None)]
#[case::svc(StepResult::Svc, SIGTRAP, Some("**SVC Call**"))]
#[case::undefined(StepResult::Undefined, SIGILL, Some("**Undefined Instruction**"))]
#[case::unpredictable(StepResult::Unpredictable, SIGILL, Some("**Unpredictable Instruction**"))]
#[case::unsupported(StepResult::Unsupported, SIGILL, Some("**Unsupported Instruction**"))]
#[case::hard_fault(StepResult::HardFault, SIGSEGV, Some("**Hard Fault**"))]
fn signal_for_result(
    #[case] result: StepResult,
    #[case] signal: u8,
    #[case] message: Option<&'static str>,
) {
    let reason = StopReason::classify(result, false, None);
    assert_eq!(reason.signal, signal);
    assert_eq!(reason.message, message);
    assert_eq!(reason.watchpoint, None);
}

#[test]
fn fault_on_breakpoint_is_a_trap() {
    let reason = StopReason::classify(StepResult::HardFault, true, None);
    assert_eq!(reason, StopReason::TRAP);
}

#[test]
fn watchpoint_stop_carries_hit() {
    let reason = StopReason::classify(StepResult::Watchpoint, false, Some(HIT));
    assert_eq!(reason.signal, SIGTRAP);
    assert_eq!(reason.watchpoint, Some(HIT));
}

#[test]
fn hit_is_dropped_for_other_results() {
    let reason = StopReason::classify(StepResult::Bkpt, false, Some(HIT));
    assert_eq!(reason.watchpoint, None);
}

#[rstest]
#[case::write(WatchKind::Write, "watch")]
#[case::read(WatchKind::Read, "rwatch")]
#[case::access(WatchKind::ReadWrite, "awatch")]
fn watch_field_names(#[case] kind: WatchKind, #[case] field: &str) {
    let hit = WatchpointHit { kind, address: 0 };
    assert_eq!(StopReason::watch_field(&hit), field);
}
