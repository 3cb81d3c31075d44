//! # Step Tests
//!
//! Fetch preconditions, PC update rules, and the observer hook of
//! `step_observed`.

use pinkysim_core::common::StepResult;
use pinkysim_core::core::cpu::step_observed;
use pinkysim_core::isa::Instruction;
use pinkysim_core::isa::instruction::HintOp;
use pinkysim_core::soc::{Memory, WatchKind};
use pinkysim_core::CpuContext;
use pinkysim_core::core::step;
use pretty_assertions::assert_eq;

use crate::common::builder::thumb;
use crate::common::harness::{FLASH_SIZE, TestContext};
use crate::common::mocks::memory::MockBus;

#[test]
fn thumb_bit_clear_faults_before_fetch() {
    // No expectations: any bus access would panic.
    let mut bus = MockBus::new();
    let mut ctx = CpuContext::new();
    ctx.set_thumb(false);
    ctx.pc = 0x100;
    assert_eq!(step(&mut ctx, &mut bus), StepResult::HardFault);
    assert_eq!(ctx.pc, 0x100);
}

#[test]
fn fetch_from_unmapped_address_faults() {
    let mut tc = TestContext::new();
    tc.ctx.pc = FLASH_SIZE;
    assert_eq!(tc.step(), StepResult::HardFault);
    assert_eq!(tc.ctx.pc, FLASH_SIZE);
}

#[test]
fn wide_instruction_needs_both_halfwords() {
    let mut tc = TestContext::new();
    let (first, _) = thumb::bl(0);
    tc.mem
        .load(FLASH_SIZE - 2, &first.to_le_bytes())
        .unwrap();
    tc.ctx.pc = FLASH_SIZE - 2;
    assert_eq!(tc.step(), StepResult::HardFault);
    assert_eq!(tc.ctx.pc, FLASH_SIZE - 2);
    assert_eq!(tc.ctx.lr, 0);
}

#[test]
fn fetch_of_breakpointed_halfword_faults() {
    let mut tc = TestContext::new().load_program(&[thumb::NOP, thumb::NOP]);
    tc.mem.set_watchpoint(WatchKind::Breakpoint, 2, 2).unwrap();
    assert_eq!(tc.step(), StepResult::Ok);
    assert_eq!(tc.step(), StepResult::HardFault);
    assert_eq!(tc.ctx.pc, 2);
}

#[test]
fn observer_sees_address_instruction_and_result() {
    let mut tc = TestContext::new().load_program(&[thumb::NOP, thumb::svc(3)]);
    let mut seen = Vec::new();
    for _ in 0..2 {
        let _ = step_observed(&mut tc.ctx, &mut tc.mem, |pc, insn: &Instruction, result| {
            seen.push((pc, *insn, result));
        });
    }
    assert_eq!(
        seen,
        vec![
            (0, Instruction::Hint { op: HintOp::Nop }, StepResult::Ok),
            (2, Instruction::Svc { imm: 3 }, StepResult::Svc),
        ]
    );
}

#[test]
fn observer_is_skipped_when_fetch_fails() {
    let mut tc = TestContext::new();
    tc.ctx.pc = FLASH_SIZE;
    let mut calls = 0;
    let result = step_observed(&mut tc.ctx, &mut tc.mem, |_, _, _| calls += 1);
    assert_eq!(result, StepResult::HardFault);
    assert_eq!(calls, 0);
}

#[test]
fn observer_sees_decode_failures() {
    let mut tc = TestContext::new().load_program(&[0xDE01]);
    let mut seen = None;
    let _ = step_observed(&mut tc.ctx, &mut tc.mem, |_, insn, result| {
        seen = Some((*insn, result));
    });
    assert_eq!(
        seen,
        Some((Instruction::Undefined { encoding: 0xDE01 }, StepResult::Undefined))
    );
}

#[test]
fn wide_instructions_advance_by_four() {
    let mut tc = TestContext::new()
        .load_program(&[thumb::DSB_SY.0, thumb::DSB_SY.1, thumb::NOP]);
    tc.step_n(2);
    assert_eq!(tc.ctx.pc, 6);
}
