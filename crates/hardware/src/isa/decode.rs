//! ARMv6-M Thumb Instruction Decoder.
//!
//! This module turns 16-bit and 32-bit Thumb encodings into [`Instruction`]
//! values. The 16-bit space is partitioned by successively narrower opcode
//! fields, following the encoding tables of the ARMv6-M architecture manual:
//!
//! | Bits 15:10 | Group                                   |
//! |------------|-----------------------------------------|
//! | `00xxxx`   | Shift (immediate), add, subtract, move, compare |
//! | `010000`   | Data processing                         |
//! | `010001`   | Special data and branch/exchange        |
//! | `01001x`   | LDR (literal)                           |
//! | `0101xx`, `011xxx`, `100xxx` | Load/store single        |
//! | `10100x`   | ADR                                     |
//! | `10101x`   | ADD (SP plus immediate)                 |
//! | `1011xx`   | Miscellaneous                           |
//! | `11000x`, `11001x` | STM, LDM                        |
//! | `1101xx`   | Conditional branch, UDF, SVC            |
//! | `11100x`   | Unconditional branch                    |
//!
//! Encodings outside these tables decode to [`Instruction::Undefined`].
//! Encodings whose operands the manual calls UNPREDICTABLE decode to
//! [`Instruction::Unpredictable`], so the executor can reject them before
//! any state changes.

use crate::common::constants::{WIDE_PREFIX_MASK, WIDE_PREFIX_MIN};
use crate::core::arch::context::{PC, SP};
use crate::core::units::alu::SRType;
use crate::isa::instruction::{
    BarrierOp, Condition, DataOp, ExtendOp, HintOp, Instruction, LoadStoreOp, Reg, ReverseOp,
};

/// Register list bit for LR in PUSH.
const PUSH_LR_BIT: u16 = 1 << 14;

/// Register list bit for PC in POP.
const POP_PC_BIT: u16 = 1 << 15;

/// Required low nibble of CPS (`(0)(0)(1)(0)`).
const CPS_LOW_BITS: u16 = 0b0010;

/// Returns `true` when `first` is the first halfword of a 32-bit encoding.
///
/// The top five bits must be `0b11101`, `0b11110`, or `0b11111`.
#[inline]
pub const fn is_32bit(first: u16) -> bool {
    first & WIDE_PREFIX_MASK >= WIDE_PREFIX_MIN
}

/// Extracts a 3-bit low register field starting at bit `lo`.
#[inline]
const fn low_reg(hw: u16, lo: u32) -> Reg {
    ((hw >> lo) & 0x7) as Reg
}

/// Extracts an 8-bit immediate from bits 7:0.
#[inline]
const fn imm8(hw: u16) -> u32 {
    (hw & 0xFF) as u32
}

/// Sign-extends the low `bits` bits of `value`.
#[inline]
const fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

/// Decodes a 16-bit Thumb instruction.
///
/// # Arguments
///
/// * `hw` - The halfword fetched at PC; must not be a 32-bit prefix.
///
/// # Returns
///
/// The decoded instruction, or `Undefined`/`Unpredictable` markers.
pub const fn decode16(hw: u16) -> Instruction {
    match hw >> 10 {
        0b00_0000..=0b00_1111 => shift_add_sub_move_compare(hw),
        0b01_0000 => Instruction::DataProc {
            op: DataOp::from_bits(hw >> 6),
            rdn: low_reg(hw, 0),
            rm: low_reg(hw, 3),
        },
        0b01_0001 => special_data_branch(hw),
        0b01_0010 | 0b01_0011 => Instruction::LdrLiteral {
            rt: low_reg(hw, 8),
            imm: imm8(hw) << 2,
        },
        0b01_0100..=0b01_0111 => Instruction::LoadStoreReg {
            op: LoadStoreOp::from_bits(hw >> 9),
            rt: low_reg(hw, 0),
            rn: low_reg(hw, 3),
            rm: low_reg(hw, 6),
        },
        0b01_1000..=0b10_0111 => load_store_immediate(hw),
        0b10_1000 | 0b10_1001 => Instruction::Adr {
            rd: low_reg(hw, 8),
            imm: imm8(hw) << 2,
        },
        0b10_1010 | 0b10_1011 => Instruction::AddSpImm {
            rd: low_reg(hw, 8),
            imm: imm8(hw) << 2,
        },
        0b10_1100..=0b10_1111 => miscellaneous(hw),
        0b11_0000 | 0b11_0001 => store_multiple(hw),
        0b11_0010 | 0b11_0011 => load_multiple(hw),
        0b11_0100..=0b11_0111 => conditional_branch(hw),
        0b11_1000 | 0b11_1001 => Instruction::Branch {
            offset: sign_extend(((hw & 0x7FF) as u32) << 1, 12),
        },
        _ => undefined16(hw),
    }
}

const fn undefined16(hw: u16) -> Instruction {
    Instruction::Undefined {
        encoding: hw as u32,
    }
}

const fn unpredictable16(hw: u16) -> Instruction {
    Instruction::Unpredictable {
        encoding: hw as u32,
    }
}

/// Opcode group `00xxxx`: bits 13:9 select the operation.
const fn shift_add_sub_move_compare(hw: u16) -> Instruction {
    let rd = low_reg(hw, 0);
    let rn = low_reg(hw, 3);
    let imm5 = ((hw >> 6) & 0x1F) as u8;
    let rdn = low_reg(hw, 8);
    match (hw >> 9) & 0x1F {
        0b0_0000..=0b0_0011 => Instruction::ShiftImm {
            shift: SRType::Lsl,
            rd,
            rm: rn,
            imm5,
        },
        0b0_0100..=0b0_0111 => Instruction::ShiftImm {
            shift: SRType::Lsr,
            rd,
            rm: rn,
            imm5,
        },
        0b0_1000..=0b0_1011 => Instruction::ShiftImm {
            shift: SRType::Asr,
            rd,
            rm: rn,
            imm5,
        },
        0b0_1100 => Instruction::AddReg {
            rd,
            rn,
            rm: low_reg(hw, 6),
        },
        0b0_1101 => Instruction::SubReg {
            rd,
            rn,
            rm: low_reg(hw, 6),
        },
        0b0_1110 => Instruction::AddImm {
            rd,
            rn,
            imm: ((hw >> 6) & 0x7) as u32,
        },
        0b0_1111 => Instruction::SubImm {
            rd,
            rn,
            imm: ((hw >> 6) & 0x7) as u32,
        },
        0b1_0000..=0b1_0011 => Instruction::MovImm {
            rd: rdn,
            imm: imm8(hw),
        },
        0b1_0100..=0b1_0111 => Instruction::CmpImm {
            rn: rdn,
            imm: imm8(hw),
        },
        0b1_1000..=0b1_1011 => Instruction::AddImm {
            rd: rdn,
            rn: rdn,
            imm: imm8(hw),
        },
        _ => Instruction::SubImm {
            rd: rdn,
            rn: rdn,
            imm: imm8(hw),
        },
    }
}

/// Opcode group `010001`: high-register ADD, CMP, MOV, and BX/BLX.
const fn special_data_branch(hw: u16) -> Instruction {
    let rm = ((hw >> 3) & 0xF) as Reg;
    let rdn = (((hw >> 4) & 0x8) | (hw & 0x7)) as Reg;
    match (hw >> 6) & 0xF {
        0b0000..=0b0011 => {
            if rdn == PC && rm == PC {
                unpredictable16(hw)
            } else {
                Instruction::AddHigh { rdn, rm }
            }
        }
        0b0100..=0b0111 => {
            if (rdn < 8 && rm < 8) || rdn == PC || rm == PC {
                unpredictable16(hw)
            } else {
                Instruction::CmpHigh { rn: rdn, rm }
            }
        }
        0b1000..=0b1011 => Instruction::MovHigh { rd: rdn, rm },
        op => {
            if hw & 0x7 != 0 || rm == PC {
                unpredictable16(hw)
            } else if op & 0b10 == 0 {
                Instruction::Bx { rm }
            } else {
                Instruction::Blx { rm }
            }
        }
    }
}

/// Opcode groups `011xxx` and `100xxx`: immediate-offset and SP-relative transfers.
const fn load_store_immediate(hw: u16) -> Instruction {
    let rt = low_reg(hw, 0);
    let rn = low_reg(hw, 3);
    let imm5 = ((hw >> 6) & 0x1F) as u32;
    let (op, rt, rn, imm) = match hw >> 11 {
        0b01100 => (LoadStoreOp::Str, rt, rn, imm5 << 2),
        0b01101 => (LoadStoreOp::Ldr, rt, rn, imm5 << 2),
        0b01110 => (LoadStoreOp::Strb, rt, rn, imm5),
        0b01111 => (LoadStoreOp::Ldrb, rt, rn, imm5),
        0b10000 => (LoadStoreOp::Strh, rt, rn, imm5 << 1),
        0b10001 => (LoadStoreOp::Ldrh, rt, rn, imm5 << 1),
        0b10010 => (LoadStoreOp::Str, low_reg(hw, 8), SP, imm8(hw) << 2),
        _ => (LoadStoreOp::Ldr, low_reg(hw, 8), SP, imm8(hw) << 2),
    };
    Instruction::LoadStoreImm { op, rt, rn, imm }
}

/// Opcode group `1011xx`: bits 11:5 select the operation.
const fn miscellaneous(hw: u16) -> Instruction {
    let rd = low_reg(hw, 0);
    let rm = low_reg(hw, 3);
    match (hw >> 5) & 0x7F {
        0b000_0000..=0b000_0011 => Instruction::AddSpImm {
            rd: SP,
            imm: ((hw & 0x7F) as u32) << 2,
        },
        0b000_0100..=0b000_0111 => Instruction::SubSpImm {
            imm: ((hw & 0x7F) as u32) << 2,
        },
        0b001_0000..=0b001_0111 => {
            let op = match (hw >> 6) & 0x3 {
                0 => ExtendOp::Sxth,
                1 => ExtendOp::Sxtb,
                2 => ExtendOp::Uxth,
                _ => ExtendOp::Uxtb,
            };
            Instruction::Extend { op, rd, rm }
        }
        0b010_0000..=0b010_1111 => {
            let lr = if hw & 0x100 != 0 { PUSH_LR_BIT } else { 0 };
            let registers = (hw & 0xFF) | lr;
            if registers == 0 {
                unpredictable16(hw)
            } else {
                Instruction::Push { registers }
            }
        }
        0b011_0011 => {
            if hw & 0xF != CPS_LOW_BITS {
                unpredictable16(hw)
            } else {
                Instruction::Cps {
                    disable: hw & 0x10 != 0,
                }
            }
        }
        0b101_0000..=0b101_0111 => {
            let op = match (hw >> 6) & 0x3 {
                0 => ReverseOp::Rev,
                1 => ReverseOp::Rev16,
                3 => ReverseOp::Revsh,
                _ => return undefined16(hw),
            };
            Instruction::Reverse { op, rd, rm }
        }
        0b110_0000..=0b110_1111 => {
            let pc = if hw & 0x100 != 0 { POP_PC_BIT } else { 0 };
            let registers = (hw & 0xFF) | pc;
            if registers == 0 {
                unpredictable16(hw)
            } else {
                Instruction::Pop { registers }
            }
        }
        0b111_0000..=0b111_0111 => Instruction::Bkpt {
            imm: (hw & 0xFF) as u8,
        },
        0b111_1000..=0b111_1111 => hint(hw),
        _ => undefined16(hw),
    }
}

/// Hint space `1011 1111 opA opB`. A non-zero `opB` is IT, which ARMv6-M lacks.
const fn hint(hw: u16) -> Instruction {
    if hw & 0xF != 0 {
        return undefined16(hw);
    }
    let op = match (hw >> 4) & 0xF {
        1 => HintOp::Yield,
        2 => HintOp::Wfe,
        3 => HintOp::Wfi,
        4 => HintOp::Sev,
        _ => HintOp::Nop,
    };
    Instruction::Hint { op }
}

const fn store_multiple(hw: u16) -> Instruction {
    let rn = low_reg(hw, 8);
    let registers = (hw & 0xFF) as u8;
    let base_bit = 1u8 << rn;
    let below_base = base_bit - 1;
    if registers == 0 || (registers & base_bit != 0 && registers & below_base != 0) {
        unpredictable16(hw)
    } else {
        Instruction::Stm { rn, registers }
    }
}

const fn load_multiple(hw: u16) -> Instruction {
    let registers = (hw & 0xFF) as u8;
    if registers == 0 {
        unpredictable16(hw)
    } else {
        Instruction::Ldm {
            rn: low_reg(hw, 8),
            registers,
        }
    }
}

/// Opcode group `1101xx`: conditional branch, with UDF at cond `1110` and SVC at `1111`.
const fn conditional_branch(hw: u16) -> Instruction {
    match (hw >> 8) & 0xF {
        0xE => undefined16(hw),
        0xF => Instruction::Svc {
            imm: (hw & 0xFF) as u8,
        },
        bits => match Condition::from_bits(bits as u8) {
            Some(cond) => Instruction::BranchCond {
                cond,
                offset: sign_extend(imm8(hw) << 1, 9),
            },
            None => undefined16(hw),
        },
    }
}

/// Decodes a 32-bit Thumb instruction.
///
/// Only the ARMv6-M subset is recognised: BL, MSR, MRS, DSB, DMB, and ISB.
/// Every other 32-bit encoding, including UDF.W, is `Undefined`.
///
/// # Arguments
///
/// * `hw1` - The first halfword (at PC).
/// * `hw2` - The second halfword (at PC + 2).
pub const fn decode32(hw1: u16, hw2: u16) -> Instruction {
    let encoding = ((hw1 as u32) << 16) | hw2 as u32;
    if hw1 & 0xF800 != 0xF000 || hw2 & 0x8000 == 0 {
        return Instruction::Undefined { encoding };
    }
    let op1 = (hw1 >> 4) & 0x7F;
    let op2 = (hw2 >> 12) & 0x7;

    if op2 & 0b101 == 0b101 {
        return branch_link(hw1, hw2);
    }
    if op2 & 0b101 == 0b000 {
        return match op1 {
            0b011_1000 | 0b011_1001 => move_to_special(hw1, hw2, encoding),
            0b011_1011 => misc_control(hw1, hw2, encoding),
            0b011_1110 | 0b011_1111 => move_from_special(hw1, hw2, encoding),
            _ => Instruction::Undefined { encoding },
        };
    }
    Instruction::Undefined { encoding }
}

/// BL: `11110 S imm10 | 11 J1 1 J2 imm11`.
const fn branch_link(hw1: u16, hw2: u16) -> Instruction {
    let s = ((hw1 >> 10) & 1) as u32;
    let imm10 = (hw1 & 0x3FF) as u32;
    let j1 = ((hw2 >> 13) & 1) as u32;
    let j2 = ((hw2 >> 11) & 1) as u32;
    let imm11 = (hw2 & 0x7FF) as u32;
    let i1 = !(j1 ^ s) & 1;
    let i2 = !(j2 ^ s) & 1;
    let imm = (s << 24) | (i1 << 23) | (i2 << 22) | (imm10 << 12) | (imm11 << 1);
    Instruction::Bl {
        offset: sign_extend(imm, 25),
    }
}

/// MSR: `11110 0 1110 0 (0) Rn | 10 (0) 0 (1)(0)(0)(0) SYSm`.
const fn move_to_special(hw1: u16, hw2: u16, encoding: u32) -> Instruction {
    let rn = (hw1 & 0xF) as Reg;
    let should_be_ok = hw1 & 0x10 == 0 && hw2 & 0x2000 == 0 && (hw2 >> 8) & 0xF == 0b1000;
    if !should_be_ok || rn == SP || rn == PC {
        return Instruction::Unpredictable { encoding };
    }
    Instruction::Msr {
        rn,
        sysm: (hw2 & 0xFF) as u8,
    }
}

/// MRS: `11110 0 1111 1 (0)(1)(1)(1)(1) | 10 (0) 0 Rd SYSm`.
const fn move_from_special(hw1: u16, hw2: u16, encoding: u32) -> Instruction {
    let rd = ((hw2 >> 8) & 0xF) as Reg;
    let should_be_ok = hw1 & 0x10 == 0 && hw1 & 0xF == 0xF && hw2 & 0x2000 == 0;
    if !should_be_ok || rd == SP || rd == PC {
        return Instruction::Unpredictable { encoding };
    }
    Instruction::Mrs {
        rd,
        sysm: (hw2 & 0xFF) as u8,
    }
}

/// DSB/DMB/ISB: `11110 0 1110 1 1 (1)(1)(1)(1) | 10 (0) 0 (1)(1)(1)(1) opc option`.
const fn misc_control(hw1: u16, hw2: u16, encoding: u32) -> Instruction {
    let op = match (hw2 >> 4) & 0xF {
        0b0100 => BarrierOp::Dsb,
        0b0101 => BarrierOp::Dmb,
        0b0110 => BarrierOp::Isb,
        _ => return Instruction::Undefined { encoding },
    };
    let should_be_ok = hw1 & 0xF == 0xF && hw2 & 0x2000 == 0 && (hw2 >> 8) & 0xF == 0xF;
    if !should_be_ok {
        return Instruction::Unpredictable { encoding };
    }
    Instruction::Barrier {
        op,
        option: (hw2 & 0xF) as u8,
    }
}
