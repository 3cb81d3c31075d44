//! Decoded Thumb instruction representation.
//!
//! Provides the closed [`Instruction`] enum produced by the decoder, its
//! operand sub-enums, condition codes, and the instruction class used for
//! statistics. Register operands are plain register numbers (0-15).

use crate::core::arch::Flags;
use crate::core::units::alu::SRType;

/// A register number, 0-15.
pub type Reg = u8;

/// Condition codes for `B<cond>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Equal (Z set).
    Eq,
    /// Not equal (Z clear).
    Ne,
    /// Carry set / unsigned higher or same.
    Cs,
    /// Carry clear / unsigned lower.
    Cc,
    /// Minus (N set).
    Mi,
    /// Plus or zero (N clear).
    Pl,
    /// Overflow (V set).
    Vs,
    /// No overflow (V clear).
    Vc,
    /// Unsigned higher.
    Hi,
    /// Unsigned lower or same.
    Ls,
    /// Signed greater than or equal.
    Ge,
    /// Signed less than.
    Lt,
    /// Signed greater than.
    Gt,
    /// Signed less than or equal.
    Le,
    /// Always.
    Al,
}

impl Condition {
    /// Maps a 4-bit condition field to a condition.
    ///
    /// Returns `None` for `0b1111`, which is not a condition code.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits & 0xF {
            0x0 => Self::Eq,
            0x1 => Self::Ne,
            0x2 => Self::Cs,
            0x3 => Self::Cc,
            0x4 => Self::Mi,
            0x5 => Self::Pl,
            0x6 => Self::Vs,
            0x7 => Self::Vc,
            0x8 => Self::Hi,
            0x9 => Self::Ls,
            0xA => Self::Ge,
            0xB => Self::Lt,
            0xC => Self::Gt,
            0xD => Self::Le,
            0xE => Self::Al,
            _ => return None,
        })
    }

    /// Evaluates the condition against the current flags.
    pub const fn passed(self, flags: Flags) -> bool {
        match self {
            Self::Eq => flags.z,
            Self::Ne => !flags.z,
            Self::Cs => flags.c,
            Self::Cc => !flags.c,
            Self::Mi => flags.n,
            Self::Pl => !flags.n,
            Self::Vs => flags.v,
            Self::Vc => !flags.v,
            Self::Hi => flags.c && !flags.z,
            Self::Ls => !flags.c || flags.z,
            Self::Ge => flags.n == flags.v,
            Self::Lt => flags.n != flags.v,
            Self::Gt => !flags.z && flags.n == flags.v,
            Self::Le => flags.z || flags.n != flags.v,
            Self::Al => true,
        }
    }

    /// Lowercase suffix used by the disassembler.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Cs => "cs",
            Self::Cc => "cc",
            Self::Mi => "mi",
            Self::Pl => "pl",
            Self::Vs => "vs",
            Self::Vc => "vc",
            Self::Hi => "hi",
            Self::Ls => "ls",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Le => "le",
            Self::Al => "al",
        }
    }
}

/// Register-register data-processing operations (encoding `010000 op Rm Rdn`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataOp {
    /// Bitwise AND.
    And,
    /// Bitwise exclusive OR.
    Eor,
    /// Logical shift left by register.
    Lsl,
    /// Logical shift right by register.
    Lsr,
    /// Arithmetic shift right by register.
    Asr,
    /// Add with carry.
    Adc,
    /// Subtract with carry.
    Sbc,
    /// Rotate right by register.
    Ror,
    /// Test (AND, flags only).
    Tst,
    /// Reverse subtract from zero (`RSBS Rd, Rn, #0`).
    Rsb,
    /// Compare (SUB, flags only).
    Cmp,
    /// Compare negative (ADD, flags only).
    Cmn,
    /// Bitwise OR.
    Orr,
    /// Multiply, low word.
    Mul,
    /// Bit clear.
    Bic,
    /// Bitwise NOT.
    Mvn,
}

impl DataOp {
    /// Maps the 4-bit opcode field to an operation.
    pub const fn from_bits(bits: u16) -> Self {
        match bits & 0xF {
            0x0 => Self::And,
            0x1 => Self::Eor,
            0x2 => Self::Lsl,
            0x3 => Self::Lsr,
            0x4 => Self::Asr,
            0x5 => Self::Adc,
            0x6 => Self::Sbc,
            0x7 => Self::Ror,
            0x8 => Self::Tst,
            0x9 => Self::Rsb,
            0xA => Self::Cmp,
            0xB => Self::Cmn,
            0xC => Self::Orr,
            0xD => Self::Mul,
            0xE => Self::Bic,
            _ => Self::Mvn,
        }
    }

    /// Lowercase mnemonic, without the `s` suffix.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Eor => "eor",
            Self::Lsl => "lsl",
            Self::Lsr => "lsr",
            Self::Asr => "asr",
            Self::Adc => "adc",
            Self::Sbc => "sbc",
            Self::Ror => "ror",
            Self::Tst => "tst",
            Self::Rsb => "rsb",
            Self::Cmp => "cmp",
            Self::Cmn => "cmn",
            Self::Orr => "orr",
            Self::Mul => "mul",
            Self::Bic => "bic",
            Self::Mvn => "mvn",
        }
    }

    /// Returns `true` for operations that only update flags.
    pub const fn is_compare(self) -> bool {
        matches!(self, Self::Tst | Self::Cmp | Self::Cmn)
    }
}

/// Single-register load and store operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadStoreOp {
    /// Store word.
    Str,
    /// Store halfword.
    Strh,
    /// Store byte.
    Strb,
    /// Load signed byte.
    Ldrsb,
    /// Load word.
    Ldr,
    /// Load unsigned halfword.
    Ldrh,
    /// Load unsigned byte.
    Ldrb,
    /// Load signed halfword.
    Ldrsh,
}

impl LoadStoreOp {
    /// Maps the 3-bit `opB` field of the register-offset encoding.
    pub const fn from_bits(bits: u16) -> Self {
        match bits & 0x7 {
            0 => Self::Str,
            1 => Self::Strh,
            2 => Self::Strb,
            3 => Self::Ldrsb,
            4 => Self::Ldr,
            5 => Self::Ldrh,
            6 => Self::Ldrb,
            _ => Self::Ldrsh,
        }
    }

    /// Access width in bytes.
    pub const fn size(self) -> u32 {
        match self {
            Self::Str | Self::Ldr => 4,
            Self::Strh | Self::Ldrh | Self::Ldrsh => 2,
            Self::Strb | Self::Ldrb | Self::Ldrsb => 1,
        }
    }

    /// Returns `true` for loads.
    pub const fn is_load(self) -> bool {
        matches!(
            self,
            Self::Ldr | Self::Ldrh | Self::Ldrb | Self::Ldrsb | Self::Ldrsh
        )
    }

    /// Lowercase mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Strh => "strh",
            Self::Strb => "strb",
            Self::Ldrsb => "ldrsb",
            Self::Ldr => "ldr",
            Self::Ldrh => "ldrh",
            Self::Ldrb => "ldrb",
            Self::Ldrsh => "ldrsh",
        }
    }
}

/// Sign and zero extension operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExtendOp {
    /// Sign-extend halfword.
    Sxth,
    /// Sign-extend byte.
    Sxtb,
    /// Zero-extend halfword.
    Uxth,
    /// Zero-extend byte.
    Uxtb,
}

/// Byte reversal operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReverseOp {
    /// Reverse word.
    Rev,
    /// Reverse each halfword.
    Rev16,
    /// Reverse low halfword and sign-extend.
    Revsh,
}

/// Hint instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HintOp {
    /// No operation, including the unallocated hint slots.
    Nop,
    /// Yield.
    Yield,
    /// Wait for event.
    Wfe,
    /// Wait for interrupt.
    Wfi,
    /// Send event.
    Sev,
}

/// Memory barrier instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BarrierOp {
    /// Data synchronization barrier.
    Dsb,
    /// Data memory barrier.
    Dmb,
    /// Instruction synchronization barrier.
    Isb,
}

/// Broad instruction category, used for statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstructionClass {
    /// Data processing, moves, and extends.
    Alu,
    /// Single and multiple loads.
    Load,
    /// Single and multiple stores.
    Store,
    /// Branches and PC-writing instructions.
    Branch,
    /// Status register access, hints, barriers, and traps.
    System,
}

/// One decoded ARMv6-M Thumb instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// LSLS/LSRS/ASRS Rd, Rm, #imm5. `LSLS #0` is `MOVS Rd, Rm`.
    ShiftImm {
        /// Shift type.
        shift: SRType,
        /// Destination.
        rd: Reg,
        /// Source.
        rm: Reg,
        /// Raw 5-bit immediate, before `DecodeImmShift`.
        imm5: u8,
    },
    /// ADDS Rd, Rn, Rm.
    AddReg {
        /// Destination.
        rd: Reg,
        /// First operand.
        rn: Reg,
        /// Second operand.
        rm: Reg,
    },
    /// SUBS Rd, Rn, Rm.
    SubReg {
        /// Destination.
        rd: Reg,
        /// First operand.
        rn: Reg,
        /// Second operand.
        rm: Reg,
    },
    /// ADDS Rd, Rn, #imm (imm3 and imm8 forms).
    AddImm {
        /// Destination.
        rd: Reg,
        /// First operand.
        rn: Reg,
        /// Zero-extended immediate.
        imm: u32,
    },
    /// SUBS Rd, Rn, #imm (imm3 and imm8 forms).
    SubImm {
        /// Destination.
        rd: Reg,
        /// First operand.
        rn: Reg,
        /// Zero-extended immediate.
        imm: u32,
    },
    /// MOVS Rd, #imm8.
    MovImm {
        /// Destination.
        rd: Reg,
        /// Zero-extended immediate.
        imm: u32,
    },
    /// CMP Rn, #imm8.
    CmpImm {
        /// Operand.
        rn: Reg,
        /// Zero-extended immediate.
        imm: u32,
    },
    /// Register-register data processing on low registers.
    DataProc {
        /// Operation.
        op: DataOp,
        /// Destination and first operand (`Rd` for RSBS, `Rdm` for MULS).
        rdn: Reg,
        /// Second operand (`Rn` for RSBS and MULS).
        rm: Reg,
    },
    /// ADD Rdn, Rm with any registers; never sets flags.
    AddHigh {
        /// Destination and first operand.
        rdn: Reg,
        /// Second operand.
        rm: Reg,
    },
    /// CMP Rn, Rm with at least one high register.
    CmpHigh {
        /// First operand.
        rn: Reg,
        /// Second operand.
        rm: Reg,
    },
    /// MOV Rd, Rm with any registers; never sets flags.
    MovHigh {
        /// Destination.
        rd: Reg,
        /// Source.
        rm: Reg,
    },
    /// BX Rm.
    Bx {
        /// Target register.
        rm: Reg,
    },
    /// BLX Rm.
    Blx {
        /// Target register.
        rm: Reg,
    },
    /// LDR Rt, [PC, #imm].
    LdrLiteral {
        /// Destination.
        rt: Reg,
        /// Word-multiple offset from `Align4(PC + 4)`.
        imm: u32,
    },
    /// Load or store with register offset.
    LoadStoreReg {
        /// Operation.
        op: LoadStoreOp,
        /// Transfer register.
        rt: Reg,
        /// Base register.
        rn: Reg,
        /// Offset register.
        rm: Reg,
    },
    /// Load or store with immediate offset (including SP-relative).
    LoadStoreImm {
        /// Operation.
        op: LoadStoreOp,
        /// Transfer register.
        rt: Reg,
        /// Base register.
        rn: Reg,
        /// Scaled, zero-extended offset.
        imm: u32,
    },
    /// ADR Rd, label.
    Adr {
        /// Destination.
        rd: Reg,
        /// Offset from `Align4(PC + 4)`.
        imm: u32,
    },
    /// ADD Rd, SP, #imm (Rd may be SP).
    AddSpImm {
        /// Destination.
        rd: Reg,
        /// Scaled, zero-extended immediate.
        imm: u32,
    },
    /// SUB SP, SP, #imm.
    SubSpImm {
        /// Scaled, zero-extended immediate.
        imm: u32,
    },
    /// SXTH/SXTB/UXTH/UXTB Rd, Rm.
    Extend {
        /// Operation.
        op: ExtendOp,
        /// Destination.
        rd: Reg,
        /// Source.
        rm: Reg,
    },
    /// REV/REV16/REVSH Rd, Rm.
    Reverse {
        /// Operation.
        op: ReverseOp,
        /// Destination.
        rd: Reg,
        /// Source.
        rm: Reg,
    },
    /// PUSH {list}. Bit 14 is LR.
    Push {
        /// Register list.
        registers: u16,
    },
    /// POP {list}. Bit 15 is PC.
    Pop {
        /// Register list.
        registers: u16,
    },
    /// CPSIE i / CPSID i.
    Cps {
        /// `true` for CPSID (set PRIMASK).
        disable: bool,
    },
    /// BKPT #imm8.
    Bkpt {
        /// Immediate inspected by the debugger.
        imm: u8,
    },
    /// NOP, YIELD, WFE, WFI, SEV.
    Hint {
        /// Hint kind.
        op: HintOp,
    },
    /// STM Rn!, {list}.
    Stm {
        /// Base register.
        rn: Reg,
        /// Low-register list.
        registers: u8,
    },
    /// LDM Rn{!}, {list}. Writeback happens when Rn is not in the list.
    Ldm {
        /// Base register.
        rn: Reg,
        /// Low-register list.
        registers: u8,
    },
    /// B<cond> label.
    BranchCond {
        /// Condition.
        cond: Condition,
        /// Signed offset from `PC + 4`.
        offset: i32,
    },
    /// SVC #imm8.
    Svc {
        /// Immediate.
        imm: u8,
    },
    /// B label.
    Branch {
        /// Signed offset from `PC + 4`.
        offset: i32,
    },
    /// BL label (32-bit).
    Bl {
        /// Signed offset from `PC + 4`.
        offset: i32,
    },
    /// MSR spec_reg, Rn (32-bit).
    Msr {
        /// Source.
        rn: Reg,
        /// Special register selector.
        sysm: u8,
    },
    /// MRS Rd, spec_reg (32-bit).
    Mrs {
        /// Destination.
        rd: Reg,
        /// Special register selector.
        sysm: u8,
    },
    /// DSB/DMB/ISB (32-bit).
    Barrier {
        /// Barrier kind.
        op: BarrierOp,
        /// Option field.
        option: u8,
    },
    /// Any encoding outside the ARMv6-M instruction set, including UDF.
    Undefined {
        /// Raw encoding (first halfword in the upper 16 bits for 32-bit forms).
        encoding: u32,
    },
    /// A defined encoding with UNPREDICTABLE operands.
    Unpredictable {
        /// Raw encoding (first halfword in the upper 16 bits for 32-bit forms).
        encoding: u32,
    },
}

impl Instruction {
    /// Returns the broad category of the instruction.
    pub const fn class(&self) -> InstructionClass {
        match self {
            Self::LdrLiteral { .. } | Self::Pop { .. } | Self::Ldm { .. } => InstructionClass::Load,
            Self::LoadStoreReg { op, .. } | Self::LoadStoreImm { op, .. } => {
                if op.is_load() {
                    InstructionClass::Load
                } else {
                    InstructionClass::Store
                }
            }
            Self::Push { .. } | Self::Stm { .. } => InstructionClass::Store,
            Self::Bx { .. }
            | Self::Blx { .. }
            | Self::BranchCond { .. }
            | Self::Branch { .. }
            | Self::Bl { .. } => InstructionClass::Branch,
            Self::Cps { .. }
            | Self::Bkpt { .. }
            | Self::Hint { .. }
            | Self::Svc { .. }
            | Self::Msr { .. }
            | Self::Mrs { .. }
            | Self::Barrier { .. }
            | Self::Undefined { .. }
            | Self::Unpredictable { .. } => InstructionClass::System,
            _ => InstructionClass::Alu,
        }
    }
}
