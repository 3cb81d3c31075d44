//! Instruction Disassembler for ARMv6-M Thumb.
//!
//! Formats a decoded [`Instruction`] as unified-syntax assembly for debug
//! tracing, logging, and test diagnostics. PC-relative targets are printed
//! as signed offsets since the disassembler does not know the address.
//!
//! # Usage
//!
//! ```ignore
//! use pinkysim_core::isa::decode::decode16;
//! assert_eq!(decode16(0x2001).to_string(), "movs r0, #1");
//! ```

use std::fmt;

use crate::core::arch::psr::{
    SYSM_APSR, SYSM_CONTROL, SYSM_EAPSR, SYSM_EPSR, SYSM_IAPSR, SYSM_IEPSR, SYSM_IPSR, SYSM_MSP,
    SYSM_PRIMASK, SYSM_PSP, SYSM_XPSR,
};
use crate::core::units::alu::SRType;
use crate::isa::instruction::{BarrierOp, DataOp, ExtendOp, HintOp, Instruction, Reg, ReverseOp};

/// Register names for r0-r15.
const REG_NAMES: [&str; 16] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "r12", "sp", "lr",
    "pc",
];

/// Returns the name of a register number.
#[inline]
pub fn reg_name(reg: Reg) -> &'static str {
    REG_NAMES.get(usize::from(reg)).copied().unwrap_or("r??")
}

/// Returns the name of a special register selector.
pub const fn special_name(sysm: u8) -> &'static str {
    match sysm {
        SYSM_APSR => "apsr",
        SYSM_IAPSR => "iapsr",
        SYSM_EAPSR => "eapsr",
        SYSM_XPSR => "xpsr",
        SYSM_IPSR => "ipsr",
        SYSM_EPSR => "epsr",
        SYSM_IEPSR => "iepsr",
        SYSM_MSP => "msp",
        SYSM_PSP => "psp",
        SYSM_PRIMASK => "primask",
        SYSM_CONTROL => "control",
        _ => "sysm?",
    }
}

/// Writes `{r0, r4, lr}` for a register bitmask.
fn write_list(f: &mut fmt::Formatter<'_>, registers: u16) -> fmt::Result {
    f.write_str("{")?;
    let mut first = true;
    for reg in 0..16u8 {
        if registers & (1 << reg) != 0 {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(reg_name(reg))?;
            first = false;
        }
    }
    f.write_str("}")
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = reg_name;
        match *self {
            Self::ShiftImm {
                shift: SRType::Lsl,
                rd,
                rm,
                imm5: 0,
            } => write!(f, "movs {}, {}", r(rd), r(rm)),
            Self::ShiftImm {
                shift,
                rd,
                rm,
                imm5,
            } => {
                let amount = if imm5 == 0 { 32 } else { u32::from(imm5) };
                write!(f, "{}s {}, {}, #{amount}", shift.mnemonic(), r(rd), r(rm))
            }
            Self::AddReg { rd, rn, rm } => write!(f, "adds {}, {}, {}", r(rd), r(rn), r(rm)),
            Self::SubReg { rd, rn, rm } => write!(f, "subs {}, {}, {}", r(rd), r(rn), r(rm)),
            Self::AddImm { rd, rn, imm } => write!(f, "adds {}, {}, #{imm}", r(rd), r(rn)),
            Self::SubImm { rd, rn, imm } => write!(f, "subs {}, {}, #{imm}", r(rd), r(rn)),
            Self::MovImm { rd, imm } => write!(f, "movs {}, #{imm}", r(rd)),
            Self::CmpImm { rn, imm } => write!(f, "cmp {}, #{imm}", r(rn)),
            Self::DataProc { op, rdn, rm } => match op {
                DataOp::Rsb => write!(f, "rsbs {}, {}, #0", r(rdn), r(rm)),
                DataOp::Mul => write!(f, "muls {}, {}, {}", r(rdn), r(rm), r(rdn)),
                _ if op.is_compare() => write!(f, "{} {}, {}", op.mnemonic(), r(rdn), r(rm)),
                _ => write!(f, "{}s {}, {}", op.mnemonic(), r(rdn), r(rm)),
            },
            Self::AddHigh { rdn, rm } => write!(f, "add {}, {}", r(rdn), r(rm)),
            Self::CmpHigh { rn, rm } => write!(f, "cmp {}, {}", r(rn), r(rm)),
            Self::MovHigh { rd, rm } => write!(f, "mov {}, {}", r(rd), r(rm)),
            Self::Bx { rm } => write!(f, "bx {}", r(rm)),
            Self::Blx { rm } => write!(f, "blx {}", r(rm)),
            Self::LdrLiteral { rt, imm } => write!(f, "ldr {}, [pc, #{imm}]", r(rt)),
            Self::LoadStoreReg { op, rt, rn, rm } => {
                write!(f, "{} {}, [{}, {}]", op.mnemonic(), r(rt), r(rn), r(rm))
            }
            Self::LoadStoreImm { op, rt, rn, imm } => {
                write!(f, "{} {}, [{}, #{imm}]", op.mnemonic(), r(rt), r(rn))
            }
            Self::Adr { rd, imm } => write!(f, "adr {}, #{imm}", r(rd)),
            Self::AddSpImm { rd, imm } => write!(f, "add {}, sp, #{imm}", r(rd)),
            Self::SubSpImm { imm } => write!(f, "sub sp, sp, #{imm}"),
            Self::Extend { op, rd, rm } => {
                let name = match op {
                    ExtendOp::Sxth => "sxth",
                    ExtendOp::Sxtb => "sxtb",
                    ExtendOp::Uxth => "uxth",
                    ExtendOp::Uxtb => "uxtb",
                };
                write!(f, "{name} {}, {}", r(rd), r(rm))
            }
            Self::Reverse { op, rd, rm } => {
                let name = match op {
                    ReverseOp::Rev => "rev",
                    ReverseOp::Rev16 => "rev16",
                    ReverseOp::Revsh => "revsh",
                };
                write!(f, "{name} {}, {}", r(rd), r(rm))
            }
            Self::Push { registers } => {
                f.write_str("push ")?;
                write_list(f, registers)
            }
            Self::Pop { registers } => {
                f.write_str("pop ")?;
                write_list(f, registers)
            }
            Self::Cps { disable } => f.write_str(if disable { "cpsid i" } else { "cpsie i" }),
            Self::Bkpt { imm } => write!(f, "bkpt {imm:#04x}"),
            Self::Hint { op } => f.write_str(match op {
                HintOp::Nop => "nop",
                HintOp::Yield => "yield",
                HintOp::Wfe => "wfe",
                HintOp::Wfi => "wfi",
                HintOp::Sev => "sev",
            }),
            Self::Stm { rn, registers } => {
                write!(f, "stm {}!, ", r(rn))?;
                write_list(f, u16::from(registers))
            }
            Self::Ldm { rn, registers } => {
                let writeback = if registers & (1 << rn) == 0 { "!" } else { "" };
                write!(f, "ldm {}{writeback}, ", r(rn))?;
                write_list(f, u16::from(registers))
            }
            Self::BranchCond { cond, offset } => write!(f, "b{} {offset:+}", cond.mnemonic()),
            Self::Svc { imm } => write!(f, "svc {imm:#04x}"),
            Self::Branch { offset } => write!(f, "b {offset:+}"),
            Self::Bl { offset } => write!(f, "bl {offset:+}"),
            Self::Msr { rn, sysm } => write!(f, "msr {}, {}", special_name(sysm), r(rn)),
            Self::Mrs { rd, sysm } => write!(f, "mrs {}, {}", r(rd), special_name(sysm)),
            Self::Barrier { op, option } => {
                let name = match op {
                    BarrierOp::Dsb => "dsb",
                    BarrierOp::Dmb => "dmb",
                    BarrierOp::Isb => "isb",
                };
                if option == 0xF {
                    write!(f, "{name} sy")
                } else {
                    write!(f, "{name} #{option}")
                }
            }
            Self::Undefined { encoding } => write!(f, "undefined {encoding:#06x}"),
            Self::Unpredictable { encoding } => write!(f, "unpredictable {encoding:#06x}"),
        }
    }
}
