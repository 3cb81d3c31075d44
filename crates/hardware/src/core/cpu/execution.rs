//! Instruction Execution.
//!
//! This module applies one decoded [`Instruction`] to the CPU context. It performs the following:
//! 1. **Data Processing:** Shifts, adds, logic, multiplies, and extends with ARM flag rules.
//! 2. **Memory Operations:** Single and multiple loads and stores through the checked helpers.
//! 3. **Control Flow:** Branches, BX/BLX interworking, and ALU writes to PC.
//! 4. **System Operations:** MSR/MRS, CPS, hints, barriers, BKPT, and SVC.
//!
//! Every handler either completes and reports how PC moves, or stops with a
//! [`StepResult`] before touching any register.

use super::memory::{load, store};
use crate::common::StepResult;
use crate::common::constants::XPSR_NZCV;
use crate::core::arch::CpuContext;
use crate::core::arch::context::PC;
use crate::core::arch::psr::{
    SYSM_APSR, SYSM_CONTROL, SYSM_EAPSR, SYSM_EPSR, SYSM_EXCLUDE_APSR, SYSM_IAPSR, SYSM_IEPSR,
    SYSM_IPSR, SYSM_MSP, SYSM_PRIMASK, SYSM_PSP, SYSM_XPSR,
};
use crate::core::units::alu::arithmetic::{AddResult, multiply, sub_with_carry};
use crate::core::units::alu::logic::{
    reverse_halves, reverse_signed_half, reverse_word, sign_extend_byte, sign_extend_half,
    zero_extend_byte, zero_extend_half,
};
use crate::core::units::alu::{SRType, add_with_carry, decode_imm_shift, shift_c};
use crate::isa::instruction::{DataOp, ExtendOp, HintOp, Instruction, LoadStoreOp, Reg, ReverseOp};
use crate::soc::Memory;

/// Offset between the address of an instruction and the PC value it reads.
const PC_READ_OFFSET: u32 = 4;

/// Mask clearing the Thumb bit from a branch target.
const THUMB_BIT_CLEAR: u32 = !1;

/// How PC moves after an instruction completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// PC advances past the instruction.
    Next,
    /// The instruction wrote PC.
    Jump,
}

/// Result of executing one instruction.
///
/// `Err` carries the stop reason; the caller decides whether PC advances.
pub type Exec = Result<Flow, StepResult>;

/// Whether the current instruction sits inside an IT block.
///
/// ARMv6-M has no IT instruction, so this is always `false`.
#[inline]
const fn in_it_block(_ctx: &CpuContext) -> bool {
    false
}

/// Whether flag-setting encodings update the flags.
#[inline]
const fn set_flags(ctx: &CpuContext) -> bool {
    !in_it_block(ctx)
}

/// Reads a register as an operand, with PC reading as the instruction address plus 4.
#[inline]
const fn operand(ctx: &CpuContext, reg: Reg) -> u32 {
    if reg == PC {
        ctx.pc.wrapping_add(PC_READ_OFFSET)
    } else {
        ctx.reg(reg)
    }
}

/// Returns `Align(PC + 4, 4)`, the base of PC-relative literal addressing.
#[inline]
const fn literal_base(ctx: &CpuContext) -> u32 {
    ctx.pc.wrapping_add(PC_READ_OFFSET) & !3
}

/// Returns the branch target `PC + 4 + offset`.
#[inline]
const fn branch_target(ctx: &CpuContext, offset: i32) -> u32 {
    ctx.pc
        .wrapping_add(PC_READ_OFFSET)
        .wrapping_add_signed(offset)
}

/// Performs an interworking branch: the Thumb bit follows target bit 0.
#[inline]
const fn bx_write(ctx: &mut CpuContext, target: u32) {
    ctx.set_thumb(target & 1 != 0);
    ctx.pc = target & THUMB_BIT_CLEAR;
}

/// Writes the result of a non-flag-setting ALU instruction, which may target PC.
#[inline]
const fn alu_write(ctx: &mut CpuContext, rd: Reg, value: u32) -> Flow {
    if rd == PC {
        ctx.pc = value & THUMB_BIT_CLEAR;
        Flow::Jump
    } else {
        ctx.set_reg(rd, value);
        Flow::Next
    }
}

/// Iterates the register numbers set in a register-list bitmask, lowest first.
fn registers_in(list: u16) -> impl Iterator<Item = Reg> {
    (0..16u8).filter(move |reg| list & (1 << reg) != 0)
}

/// Executes one decoded instruction.
///
/// # Arguments
///
/// * `ctx` - CPU context; `ctx.pc` is the address of `insn`.
/// * `mem` - Memory backend.
/// * `insn` - The decoded instruction.
///
/// # Returns
///
/// `Ok(Flow)` when the instruction completed, or `Err` with the reason execution stopped.
pub fn execute<M: Memory + ?Sized>(ctx: &mut CpuContext, mem: &mut M, insn: Instruction) -> Exec {
    match insn {
        Instruction::ShiftImm {
            shift,
            rd,
            rm,
            imm5,
        } => {
            let value = ctx.reg(rm);
            if shift == SRType::Lsl && imm5 == 0 {
                ctx.set_reg(rd, value);
                if set_flags(ctx) {
                    ctx.set_nz(value);
                }
            } else {
                let (kind, amount) = decode_imm_shift(shift, u32::from(imm5));
                let (result, carry) = shift_c(value, kind, amount, ctx.carry());
                ctx.set_reg(rd, result);
                if set_flags(ctx) {
                    ctx.set_nzc(result, carry);
                }
            }
            Ok(Flow::Next)
        }
        Instruction::AddReg { rd, rn, rm } => {
            arithmetic(ctx, Some(rd), add_with_carry(ctx.reg(rn), ctx.reg(rm), false))
        }
        Instruction::SubReg { rd, rn, rm } => {
            arithmetic(ctx, Some(rd), sub_with_carry(ctx.reg(rn), ctx.reg(rm)))
        }
        Instruction::AddImm { rd, rn, imm } => {
            arithmetic(ctx, Some(rd), add_with_carry(ctx.reg(rn), imm, false))
        }
        Instruction::SubImm { rd, rn, imm } => {
            arithmetic(ctx, Some(rd), sub_with_carry(ctx.reg(rn), imm))
        }
        Instruction::MovImm { rd, imm } => {
            ctx.set_reg(rd, imm);
            if set_flags(ctx) {
                ctx.set_nz(imm);
            }
            Ok(Flow::Next)
        }
        Instruction::CmpImm { rn, imm } => arithmetic(ctx, None, sub_with_carry(ctx.reg(rn), imm)),
        Instruction::DataProc { op, rdn, rm } => data_processing(ctx, op, rdn, rm),
        Instruction::AddHigh { rdn, rm } => {
            let (result, _, _) = add_with_carry(operand(ctx, rdn), operand(ctx, rm), false);
            Ok(alu_write(ctx, rdn, result))
        }
        Instruction::CmpHigh { rn, rm } => {
            let (result, carry, overflow) = sub_with_carry(ctx.reg(rn), ctx.reg(rm));
            ctx.set_nzcv(result, carry, overflow);
            Ok(Flow::Next)
        }
        Instruction::MovHigh { rd, rm } => Ok(alu_write(ctx, rd, operand(ctx, rm))),
        Instruction::Bx { rm } => {
            bx_write(ctx, ctx.reg(rm));
            Ok(Flow::Jump)
        }
        Instruction::Blx { rm } => {
            let target = ctx.reg(rm);
            ctx.lr = ctx.pc.wrapping_add(2) | 1;
            bx_write(ctx, target);
            Ok(Flow::Jump)
        }
        Instruction::LdrLiteral { rt, imm } => {
            let value = load(mem, literal_base(ctx).wrapping_add(imm), 4)?;
            ctx.set_reg(rt, value);
            Ok(Flow::Next)
        }
        Instruction::LoadStoreReg { op, rt, rn, rm } => {
            let address = ctx.reg(rn).wrapping_add(ctx.reg(rm));
            load_store(ctx, mem, op, rt, address)
        }
        Instruction::LoadStoreImm { op, rt, rn, imm } => {
            let address = ctx.reg(rn).wrapping_add(imm);
            load_store(ctx, mem, op, rt, address)
        }
        Instruction::Adr { rd, imm } => {
            ctx.set_reg(rd, literal_base(ctx).wrapping_add(imm));
            Ok(Flow::Next)
        }
        Instruction::AddSpImm { rd, imm } => {
            ctx.set_reg(rd, ctx.sp.wrapping_add(imm));
            Ok(Flow::Next)
        }
        Instruction::SubSpImm { imm } => {
            ctx.sp = ctx.sp.wrapping_sub(imm);
            Ok(Flow::Next)
        }
        Instruction::Extend { op, rd, rm } => {
            let value = ctx.reg(rm);
            ctx.set_reg(
                rd,
                match op {
                    ExtendOp::Sxth => sign_extend_half(value),
                    ExtendOp::Sxtb => sign_extend_byte(value),
                    ExtendOp::Uxth => zero_extend_half(value),
                    ExtendOp::Uxtb => zero_extend_byte(value),
                },
            );
            Ok(Flow::Next)
        }
        Instruction::Reverse { op, rd, rm } => {
            let value = ctx.reg(rm);
            ctx.set_reg(
                rd,
                match op {
                    ReverseOp::Rev => reverse_word(value),
                    ReverseOp::Rev16 => reverse_halves(value),
                    ReverseOp::Revsh => reverse_signed_half(value),
                },
            );
            Ok(Flow::Next)
        }
        Instruction::Push { registers } => push(ctx, mem, registers),
        Instruction::Pop { registers } => pop(ctx, mem, registers),
        Instruction::Cps { disable } => {
            ctx.primask = disable;
            Ok(Flow::Next)
        }
        Instruction::Bkpt { .. } => Err(StepResult::Bkpt),
        Instruction::Hint { op } => match op {
            HintOp::Nop => Ok(Flow::Next),
            HintOp::Yield | HintOp::Wfe | HintOp::Wfi | HintOp::Sev => {
                Err(StepResult::Unsupported)
            }
        },
        Instruction::Stm { rn, registers } => store_multiple(ctx, mem, rn, registers),
        Instruction::Ldm { rn, registers } => load_multiple(ctx, mem, rn, registers),
        Instruction::BranchCond { cond, offset } => {
            if cond.passed(ctx.flags()) {
                ctx.pc = branch_target(ctx, offset);
                Ok(Flow::Jump)
            } else {
                Ok(Flow::Next)
            }
        }
        Instruction::Svc { .. } => Err(StepResult::Svc),
        Instruction::Branch { offset } => {
            ctx.pc = branch_target(ctx, offset);
            Ok(Flow::Jump)
        }
        Instruction::Bl { offset } => {
            ctx.lr = ctx.pc.wrapping_add(PC_READ_OFFSET) | 1;
            ctx.pc = branch_target(ctx, offset);
            Ok(Flow::Jump)
        }
        Instruction::Msr { rn, sysm } => move_to_special(ctx, rn, sysm),
        Instruction::Mrs { rd, sysm } => move_from_special(ctx, rd, sysm),
        Instruction::Barrier { .. } => Ok(Flow::Next),
        Instruction::Undefined { .. } => Err(StepResult::Undefined),
        Instruction::Unpredictable { .. } => Err(StepResult::Unpredictable),
    }
}

/// Commits an `AddWithCarry` result, or only its flags when `rd` is `None`.
fn arithmetic(ctx: &mut CpuContext, rd: Option<Reg>, sum: AddResult) -> Exec {
    let (result, carry, overflow) = sum;
    if let Some(rd) = rd {
        ctx.set_reg(rd, result);
    }
    if set_flags(ctx) || rd.is_none() {
        ctx.set_nzcv(result, carry, overflow);
    }
    Ok(Flow::Next)
}

/// Register-register data processing on low registers.
fn data_processing(ctx: &mut CpuContext, op: DataOp, rdn: Reg, rm: Reg) -> Exec {
    let a = ctx.reg(rdn);
    let b = ctx.reg(rm);
    let carry = ctx.carry();
    let logical = |ctx: &mut CpuContext, result: u32, write: bool| -> Exec {
        if write {
            ctx.set_reg(rdn, result);
        }
        if set_flags(ctx) || !write {
            ctx.set_nz(result);
        }
        Ok(Flow::Next)
    };
    let shifted = |ctx: &mut CpuContext, kind: SRType| -> Exec {
        let (result, carry_out) = shift_c(a, kind, b & 0xFF, carry);
        ctx.set_reg(rdn, result);
        if set_flags(ctx) {
            ctx.set_nzc(result, carry_out);
        }
        Ok(Flow::Next)
    };
    match op {
        DataOp::And => logical(ctx, a & b, true),
        DataOp::Eor => logical(ctx, a ^ b, true),
        DataOp::Orr => logical(ctx, a | b, true),
        DataOp::Bic => logical(ctx, a & !b, true),
        DataOp::Mvn => logical(ctx, !b, true),
        DataOp::Mul => logical(ctx, multiply(b, a), true),
        DataOp::Tst => logical(ctx, a & b, false),
        DataOp::Lsl => shifted(ctx, SRType::Lsl),
        DataOp::Lsr => shifted(ctx, SRType::Lsr),
        DataOp::Asr => shifted(ctx, SRType::Asr),
        DataOp::Ror => shifted(ctx, SRType::Ror),
        DataOp::Adc => arithmetic(ctx, Some(rdn), add_with_carry(a, b, carry)),
        DataOp::Sbc => arithmetic(ctx, Some(rdn), add_with_carry(a, !b, carry)),
        DataOp::Rsb => arithmetic(ctx, Some(rdn), sub_with_carry(0, b)),
        DataOp::Cmp => arithmetic(ctx, None, sub_with_carry(a, b)),
        DataOp::Cmn => arithmetic(ctx, None, add_with_carry(a, b, false)),
    }
}

/// Single-register load or store at a computed address.
fn load_store<M: Memory + ?Sized>(
    ctx: &mut CpuContext,
    mem: &mut M,
    op: LoadStoreOp,
    rt: Reg,
    address: u32,
) -> Exec {
    let size = op.size();
    if op.is_load() {
        let raw = load(mem, address, size)?;
        let value = match op {
            LoadStoreOp::Ldrsb => sign_extend_byte(raw),
            LoadStoreOp::Ldrsh => sign_extend_half(raw),
            _ => raw,
        };
        ctx.set_reg(rt, value);
    } else {
        store(mem, address, size, ctx.reg(rt))?;
    }
    Ok(Flow::Next)
}

/// Number of bytes a register list transfers.
#[inline]
const fn list_bytes(list: u16) -> u32 {
    list.count_ones() * 4
}

/// PUSH: stores the list below SP, lowest register at the lowest address.
///
/// SP is only updated once every store has succeeded.
fn push<M: Memory + ?Sized>(ctx: &mut CpuContext, mem: &mut M, registers: u16) -> Exec {
    let start = ctx.sp.wrapping_sub(list_bytes(registers));
    let mut address = start;
    for reg in registers_in(registers) {
        store(mem, address, 4, ctx.reg(reg))?;
        address = address.wrapping_add(4);
    }
    ctx.sp = start;
    Ok(Flow::Next)
}

/// Reads every word of a register list starting at `address`.
fn read_list<M: Memory + ?Sized>(
    mem: &mut M,
    address: u32,
    registers: u16,
) -> Result<[u32; 16], StepResult> {
    let mut values = [0u32; 16];
    let mut address = address;
    for reg in registers_in(registers) {
        values[usize::from(reg)] = load(mem, address, 4)?;
        address = address.wrapping_add(4);
    }
    Ok(values)
}

/// POP: loads the list from SP upwards. Popping PC is an interworking branch.
fn pop<M: Memory + ?Sized>(ctx: &mut CpuContext, mem: &mut M, registers: u16) -> Exec {
    let values = read_list(mem, ctx.sp, registers)?;
    for reg in registers_in(registers & !(1 << PC)) {
        ctx.set_reg(reg, values[usize::from(reg)]);
    }
    ctx.sp = ctx.sp.wrapping_add(list_bytes(registers));
    if registers & (1 << PC) != 0 {
        bx_write(ctx, values[usize::from(PC)]);
        return Ok(Flow::Jump);
    }
    Ok(Flow::Next)
}

/// STM Rn!, {list}: always writes the base back.
fn store_multiple<M: Memory + ?Sized>(
    ctx: &mut CpuContext,
    mem: &mut M,
    rn: Reg,
    registers: u8,
) -> Exec {
    let list = u16::from(registers);
    let base = ctx.reg(rn);
    let mut address = base;
    for reg in registers_in(list) {
        store(mem, address, 4, ctx.reg(reg))?;
        address = address.wrapping_add(4);
    }
    ctx.set_reg(rn, base.wrapping_add(list_bytes(list)));
    Ok(Flow::Next)
}

/// LDM Rn{!}, {list}: writes the base back only when it is not loaded.
fn load_multiple<M: Memory + ?Sized>(
    ctx: &mut CpuContext,
    mem: &mut M,
    rn: Reg,
    registers: u8,
) -> Exec {
    let list = u16::from(registers);
    let base = ctx.reg(rn);
    let values = read_list(mem, base, list)?;
    for reg in registers_in(list) {
        ctx.set_reg(reg, values[usize::from(reg)]);
    }
    if list & (1 << rn) == 0 {
        ctx.set_reg(rn, base.wrapping_add(list_bytes(list)));
    }
    Ok(Flow::Next)
}

/// MSR: writes a special register from `rn`.
fn move_to_special(ctx: &mut CpuContext, rn: Reg, sysm: u8) -> Exec {
    let value = ctx.reg(rn);
    match sysm {
        SYSM_APSR | SYSM_IAPSR | SYSM_EAPSR | SYSM_XPSR => {
            ctx.set_xpsr((ctx.xpsr() & !XPSR_NZCV) | (value & XPSR_NZCV));
        }
        SYSM_IPSR | SYSM_EPSR | SYSM_IEPSR => {}
        SYSM_MSP => ctx.sp = value & !3,
        SYSM_PRIMASK => ctx.primask = value & 1 != 0,
        SYSM_PSP | SYSM_CONTROL => return Err(StepResult::Unsupported),
        _ => return Err(StepResult::Unpredictable),
    }
    Ok(Flow::Next)
}

/// MRS: reads a special register into `rd`.
fn move_from_special(ctx: &mut CpuContext, rd: Reg, sysm: u8) -> Exec {
    let value = match sysm {
        SYSM_APSR | SYSM_IAPSR | SYSM_EAPSR | SYSM_XPSR | SYSM_IPSR | SYSM_EPSR | SYSM_IEPSR => {
            if sysm & SYSM_EXCLUDE_APSR == 0 {
                ctx.xpsr() & XPSR_NZCV
            } else {
                0
            }
        }
        SYSM_MSP => ctx.sp,
        SYSM_PRIMASK => u32::from(ctx.primask),
        SYSM_PSP | SYSM_CONTROL => return Err(StepResult::Unsupported),
        _ => return Err(StepResult::Unpredictable),
    };
    ctx.set_reg(rd, value);
    Ok(Flow::Next)
}
