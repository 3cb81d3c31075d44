//! # Step Result Tests
//!
//! How each executor outcome moves PC, which outcomes count as faults, and
//! how bus errors surface to the executor.

use pinkysim_core::common::{AccessType, BusError, BusFault, StepResult};
use rstest::rstest;

#[rstest]
#[case(StepResult::Ok, true, false)]
#[case(StepResult::Svc, true, false)]
#[case(StepResult::Unsupported, true, true)]
#[case(StepResult::Undefined, false, true)]
#[case(StepResult::Unpredictable, false, true)]
#[case(StepResult::HardFault, false, true)]
#[case(StepResult::Bkpt, false, false)]
#[case(StepResult::Interrupt, false, false)]
#[case(StepResult::Watchpoint, false, false)]
fn pc_movement_and_fault_class(
    #[case] result: StepResult,
    #[case] advances: bool,
    #[case] fault: bool,
) {
    assert_eq!(result.advances_pc(), advances);
    assert_eq!(result.is_fault(), fault);
}

#[test]
fn bus_errors_become_hard_faults() {
    let err = BusError::new(0x2000_0001, 4, AccessType::Read, BusFault::Misaligned);
    assert_eq!(StepResult::from(err), StepResult::HardFault);
}

#[test]
fn bus_error_message_names_the_access() {
    let err = BusError::new(0x1000_0000, 2, AccessType::Write, BusFault::Unmapped);
    let text = err.to_string();
    assert!(text.contains("2-byte write"), "{text}");
    assert!(text.contains("0x10000000"), "{text}");
    assert!(text.contains("Unmapped"), "{text}");
}

#[test]
fn display_strings() {
    assert_eq!(StepResult::HardFault.to_string(), "hard fault");
    assert_eq!(StepResult::Bkpt.to_string(), "breakpoint");
    assert_eq!(AccessType::Fetch.to_string(), "fetch");
}
