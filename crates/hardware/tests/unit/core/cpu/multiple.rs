//! # Multiple Transfer Tests
//!
//! PUSH, POP, STM, and LDM: memory layout, base write-back, and the
//! all-or-nothing update of SP.

use pinkysim_core::common::StepResult;
use pretty_assertions::assert_eq;

use crate::common::builder::thumb;
use crate::common::harness::{RAM_BASE, STACK_TOP, TestContext};

// ─── PUSH and POP ────────────────────────────────────────────────────────────

#[test]
fn push_stores_lowest_register_lowest() {
    let mut tc = TestContext::new()
        .load_program(&[thumb::push(0b0000_0011, true)])
        .with_reg(0, 0xA0)
        .with_reg(1, 0xA1);
    tc.ctx.lr = 0x0000_0101;
    tc.step_n(1);
    assert_eq!(tc.ctx.sp, STACK_TOP - 12);
    assert_eq!(tc.word(STACK_TOP - 12), 0xA0);
    assert_eq!(tc.word(STACK_TOP - 8), 0xA1);
    assert_eq!(tc.word(STACK_TOP - 4), 0x101);
}

#[test]
fn pop_restores_pushed_registers() {
    let mut tc = TestContext::new()
        .load_program(&[thumb::push(0b1001_0000, false), thumb::pop(0b0000_0110, false)])
        .with_reg(4, 0x44)
        .with_reg(7, 0x77);
    tc.step_n(2);
    assert_eq!((tc.reg(1), tc.reg(2)), (0x44, 0x77));
    assert_eq!(tc.ctx.sp, STACK_TOP);
}

#[test]
fn pop_pc_is_an_interworking_branch() {
    let mut tc = TestContext::new()
        .load_program(&[thumb::pop(0b0000_0001, true)])
        .with_word(STACK_TOP - 8, 0x1234)
        .with_word(STACK_TOP - 4, 0x0000_0201);
    tc.ctx.sp = STACK_TOP - 8;
    assert_eq!(tc.step(), StepResult::Ok);
    assert_eq!(tc.reg(0), 0x1234);
    assert_eq!(tc.ctx.pc, 0x200);
    assert!(tc.ctx.thumb());
    assert_eq!(tc.ctx.sp, STACK_TOP);
}

#[test]
fn pop_pc_with_bit_zero_clear_leaves_arm_state() {
    let mut tc = TestContext::new()
        .load_program(&[thumb::pop(0, true)])
        .with_word(STACK_TOP - 4, 0x0000_0200);
    tc.ctx.sp = STACK_TOP - 4;
    assert_eq!(tc.step(), StepResult::Ok);
    assert!(!tc.ctx.thumb());
    assert_eq!(tc.step(), StepResult::HardFault);
}

#[test]
fn faulting_push_leaves_sp_alone() {
    let mut tc = TestContext::new()
        .load_program(&[thumb::push(0b0000_0001, false)])
        .with_reg(0, 1);
    tc.ctx.sp = RAM_BASE;
    assert_eq!(tc.step(), StepResult::HardFault);
    assert_eq!(tc.ctx.sp, RAM_BASE);
    assert_eq!(tc.ctx.pc, 0);
}

#[test]
fn faulting_pop_leaves_registers_alone() {
    // The second word sits past the end of RAM.
    let mut tc = TestContext::new()
        .load_program(&[thumb::pop(0b0000_0011, false)])
        .with_reg(0, 0xAA)
        .with_reg(1, 0xBB);
    tc.ctx.sp = STACK_TOP - 4;
    assert_eq!(tc.step(), StepResult::HardFault);
    assert_eq!((tc.reg(0), tc.reg(1)), (0xAA, 0xBB));
    assert_eq!(tc.ctx.sp, STACK_TOP - 4);
}

// ─── STM and LDM ─────────────────────────────────────────────────────────────

#[test]
fn stm_writes_back() {
    let mut tc = TestContext::new()
        .load_program(&[thumb::stm(0, 0b0000_0110)])
        .with_reg(0, RAM_BASE)
        .with_reg(1, 1)
        .with_reg(2, 2);
    tc.step_n(1);
    assert_eq!(tc.reg(0), RAM_BASE + 8);
    assert_eq!((tc.word(RAM_BASE), tc.word(RAM_BASE + 4)), (1, 2));
}

#[test]
fn stm_with_base_lowest_stores_original_base() {
    let mut tc = TestContext::new()
        .load_program(&[thumb::stm(1, 0b0000_0110)])
        .with_reg(1, RAM_BASE)
        .with_reg(2, 0x22);
    tc.step_n(1);
    assert_eq!(tc.word(RAM_BASE), RAM_BASE);
    assert_eq!(tc.word(RAM_BASE + 4), 0x22);
    assert_eq!(tc.reg(1), RAM_BASE + 8);
}

#[test]
fn stm_with_base_not_lowest_is_unpredictable() {
    let mut tc = TestContext::new()
        .load_program(&[thumb::stm(2, 0b0000_0110)])
        .with_reg(2, RAM_BASE);
    assert_eq!(tc.step(), StepResult::Unpredictable);
    assert_eq!(tc.word(RAM_BASE), 0);
}

#[test]
fn ldm_writes_back_when_base_not_loaded() {
    let mut tc = TestContext::new()
        .load_program(&[thumb::ldm(0, 0b0000_1100)])
        .with_word(RAM_BASE, 0x33)
        .with_word(RAM_BASE + 4, 0x44)
        .with_reg(0, RAM_BASE);
    tc.step_n(1);
    assert_eq!((tc.reg(2), tc.reg(3)), (0x33, 0x44));
    assert_eq!(tc.reg(0), RAM_BASE + 8);
}

#[test]
fn ldm_loading_base_skips_write_back() {
    let mut tc = TestContext::new()
        .load_program(&[thumb::ldm(0, 0b0000_0011)])
        .with_word(RAM_BASE, 0x1000)
        .with_word(RAM_BASE + 4, 0x2000)
        .with_reg(0, RAM_BASE);
    tc.step_n(1);
    assert_eq!((tc.reg(0), tc.reg(1)), (0x1000, 0x2000));
}

#[test]
fn empty_register_list_is_unpredictable() {
    let mut tc = TestContext::new().load_program(&[thumb::ldm(0, 0)]);
    assert_eq!(tc.step(), StepResult::Unpredictable);
}
