//! ARMv6-M CPU register context.
//!
//! This module implements the complete architectural state the executor
//! mutates. It performs the following:
//! 1. **Storage:** R0-R12, SP, LR, and PC, with the three special registers held apart.
//! 2. **Invariant Enforcement:** xPSR only keeps its implemented bits, so IPSR reads as 0.
//! 3. **Debugging:** Provides a register dump for diagnostics.

use std::fmt;

use super::psr::Flags;
use crate::common::constants::{
    XPSR_C, XPSR_IMPLEMENTED, XPSR_N, XPSR_NZCV, XPSR_RESET, XPSR_T, XPSR_V, XPSR_Z,
};

/// Register number of the stack pointer.
pub const SP: u8 = 13;

/// Register number of the link register.
pub const LR: u8 = 14;

/// Register number of the program counter.
pub const PC: u8 = 15;

/// Number of registers R0-R12 stored in the general array.
pub const GPR_COUNT: usize = 13;

/// Architectural state of one ARMv6-M core.
///
/// The context is owned by the caller and passed by `&mut` into every
/// executor entry point.
#[derive(Clone, PartialEq, Eq)]
pub struct CpuContext {
    /// R0-R12.
    pub r: [u32; GPR_COUNT],
    /// Main stack pointer (R13).
    pub sp: u32,
    /// Link register (R14).
    pub lr: u32,
    /// Program counter (R15), the address of the current instruction.
    pub pc: u32,
    xpsr: u32,
    /// PRIMASK bit 0.
    pub primask: bool,
}

impl Default for CpuContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuContext {
    /// Creates a context in the reset state: registers zero, Thumb bit set.
    pub const fn new() -> Self {
        Self {
            r: [0; GPR_COUNT],
            sp: 0,
            lr: 0,
            pc: 0,
            xpsr: XPSR_RESET,
            primask: false,
        }
    }

    /// Reads register `n` (0-15).
    ///
    /// R15 returns the raw stored PC. The executor adds the pipeline offset
    /// itself when an instruction reads PC as an operand.
    ///
    /// # Arguments
    ///
    /// * `n` - Register number; values above 15 are masked to 4 bits.
    pub const fn reg(&self, n: u8) -> u32 {
        match n & 0xF {
            SP => self.sp,
            LR => self.lr,
            PC => self.pc,
            i => self.r[i as usize],
        }
    }

    /// Writes register `n` (0-15) verbatim.
    pub const fn set_reg(&mut self, n: u8, value: u32) {
        match n & 0xF {
            SP => self.sp = value,
            LR => self.lr = value,
            PC => self.pc = value,
            i => self.r[i as usize] = value,
        }
    }

    /// Returns the xPSR value.
    #[inline]
    pub const fn xpsr(&self) -> u32 {
        self.xpsr
    }

    /// Replaces xPSR, keeping only the implemented bits.
    #[inline]
    pub const fn set_xpsr(&mut self, value: u32) {
        self.xpsr = value & XPSR_IMPLEMENTED;
    }

    /// Returns the condition flags.
    #[inline]
    pub const fn flags(&self) -> Flags {
        Flags::from_xpsr(self.xpsr)
    }

    /// Replaces all four condition flags.
    #[inline]
    pub const fn set_flags(&mut self, flags: Flags) {
        self.xpsr = (self.xpsr & !XPSR_NZCV) | flags.to_xpsr_bits();
    }

    /// Returns the carry flag.
    #[inline]
    pub const fn carry(&self) -> bool {
        self.xpsr & XPSR_C != 0
    }

    /// Sets N and Z from `result`, leaving C and V alone.
    pub const fn set_nz(&mut self, result: u32) {
        self.xpsr &= !(XPSR_N | XPSR_Z);
        if result & (1 << 31) != 0 {
            self.xpsr |= XPSR_N;
        }
        if result == 0 {
            self.xpsr |= XPSR_Z;
        }
    }

    /// Sets N, Z, and C, leaving V alone.
    pub const fn set_nzc(&mut self, result: u32, carry: bool) {
        self.set_nz(result);
        self.xpsr = (self.xpsr & !XPSR_C) | if carry { XPSR_C } else { 0 };
    }

    /// Sets all four condition flags from an arithmetic result.
    pub const fn set_nzcv(&mut self, result: u32, carry: bool, overflow: bool) {
        self.set_nzc(result, carry);
        self.xpsr = (self.xpsr & !XPSR_V) | if overflow { XPSR_V } else { 0 };
    }

    /// Returns the Thumb execution state bit.
    #[inline]
    pub const fn thumb(&self) -> bool {
        self.xpsr & XPSR_T != 0
    }

    /// Sets or clears the Thumb execution state bit.
    #[inline]
    pub const fn set_thumb(&mut self, thumb: bool) {
        if thumb {
            self.xpsr |= XPSR_T;
        } else {
            self.xpsr &= !XPSR_T;
        }
    }

    /// Dumps all registers to stdout.
    pub fn dump(&self) {
        println!("{self:?}");
    }
}

impl fmt::Debug for CpuContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pair) in self.r.chunks(2).enumerate() {
            for (j, value) in pair.iter().enumerate() {
                write!(f, "r{:<2}={value:#010x} ", i * 2 + j)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "sp ={:#010x} lr ={:#010x}", self.sp, self.lr)?;
        writeln!(f, "pc ={:#010x} psr={:#010x}", self.pc, self.xpsr)?;
        write!(f, "primask={}", u8::from(self.primask))
    }
}
