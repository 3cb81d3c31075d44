//! Program Status Register views.
//!
//! This module describes the pieces of xPSR and the special registers
//! addressed by MSR and MRS. It provides:
//! 1. **Flags:** A decoded view of the N, Z, C, and V condition flags.
//! 2. **SYSm Numbers:** The special-register selectors valid on ARMv6-M.

use crate::common::constants::{XPSR_C, XPSR_N, XPSR_V, XPSR_Z};

/// SYSm selector for APSR.
pub const SYSM_APSR: u8 = 0;
/// SYSm selector for the combined IAPSR view.
pub const SYSM_IAPSR: u8 = 1;
/// SYSm selector for the combined EAPSR view.
pub const SYSM_EAPSR: u8 = 2;
/// SYSm selector for the full xPSR.
pub const SYSM_XPSR: u8 = 3;
/// SYSm selector for IPSR.
pub const SYSM_IPSR: u8 = 5;
/// SYSm selector for EPSR.
pub const SYSM_EPSR: u8 = 6;
/// SYSm selector for the combined IEPSR view.
pub const SYSM_IEPSR: u8 = 7;
/// SYSm selector for the main stack pointer.
pub const SYSM_MSP: u8 = 8;
/// SYSm selector for the process stack pointer.
pub const SYSM_PSP: u8 = 9;
/// SYSm selector for PRIMASK.
pub const SYSM_PRIMASK: u8 = 16;
/// SYSm selector for CONTROL.
pub const SYSM_CONTROL: u8 = 20;

/// Bit in a PSR-view SYSm that excludes the APSR flags from the view.
pub const SYSM_EXCLUDE_APSR: u8 = 1 << 2;

/// Decoded condition flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    /// Negative.
    pub n: bool,
    /// Zero.
    pub z: bool,
    /// Carry (or "no borrow" after subtraction).
    pub c: bool,
    /// Signed overflow.
    pub v: bool,
}

impl Flags {
    /// Extracts the flags from an xPSR value.
    pub const fn from_xpsr(xpsr: u32) -> Self {
        Self {
            n: xpsr & XPSR_N != 0,
            z: xpsr & XPSR_Z != 0,
            c: xpsr & XPSR_C != 0,
            v: xpsr & XPSR_V != 0,
        }
    }

    /// Packs the flags into xPSR bits 31:28.
    pub const fn to_xpsr_bits(self) -> u32 {
        (if self.n { XPSR_N } else { 0 })
            | (if self.z { XPSR_Z } else { 0 })
            | (if self.c { XPSR_C } else { 0 })
            | (if self.v { XPSR_V } else { 0 })
    }
}
