//! ALU shift operations.
//!
//! Implements the architecture's `Shift_C`, `Shift`, and `DecodeImmShift`
//! primitives for LSL, LSR, ASR, and ROR.
//!
//! A shift amount of zero always returns the value and the incoming carry
//! unchanged. Register-specified amounts arrive already reduced mod 256 by
//! the caller (`Rm<7:0>`), so a shift by 256 behaves as a shift by zero.
//! Amounts of 32 or more follow the per-type saturation rules.

/// Number of bits in a register.
const WORD_BITS: u32 = 32;

/// Shift type selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SRType {
    /// Logical shift left.
    Lsl,
    /// Logical shift right.
    Lsr,
    /// Arithmetic shift right.
    Asr,
    /// Rotate right.
    Ror,
}

impl SRType {
    /// Lowercase mnemonic used by the disassembler.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Lsl => "lsl",
            Self::Lsr => "lsr",
            Self::Asr => "asr",
            Self::Ror => "ror",
        }
    }
}

/// Decodes an immediate shift field into a shift type and amount.
///
/// # Arguments
///
/// * `shift` - The shift type from the encoding (LSL, LSR, or ASR).
/// * `imm5`  - The 5-bit immediate shift amount.
///
/// # Returns
///
/// The effective `(type, amount)`. LSR and ASR encode a shift of 32 as
/// `imm5 == 0`; ROR with `imm5 == 0` (RRX) does not exist on ARMv6-M and is
/// returned as a rotate by zero.
pub const fn decode_imm_shift(shift: SRType, imm5: u32) -> (SRType, u32) {
    match shift {
        SRType::Lsr | SRType::Asr if imm5 == 0 => (shift, WORD_BITS),
        _ => (shift, imm5 & 0x1F),
    }
}

/// Shifts `value` and reports the carry out.
///
/// # Arguments
///
/// * `value`    - The value to shift.
/// * `shift`    - The shift type.
/// * `amount`   - The shift amount (0-255).
/// * `carry_in` - The current carry flag.
///
/// # Returns
///
/// `(result, carry_out)`. When `amount == 0` the result is `value` and the
/// carry is `carry_in`, untouched.
pub fn shift_c(value: u32, shift: SRType, amount: u32, carry_in: bool) -> (u32, bool) {
    if amount == 0 {
        return (value, carry_in);
    }
    match shift {
        SRType::Lsl => match amount {
            1..=31 => (value << amount, (value >> (WORD_BITS - amount)) & 1 != 0),
            32 => (0, value & 1 != 0),
            _ => (0, false),
        },
        SRType::Lsr => match amount {
            1..=31 => (value >> amount, (value >> (amount - 1)) & 1 != 0),
            32 => (0, value >> 31 != 0),
            _ => (0, false),
        },
        SRType::Asr => {
            if amount < WORD_BITS {
                (
                    ((value as i32) >> amount) as u32,
                    (value >> (amount - 1)) & 1 != 0,
                )
            } else {
                let fill = ((value as i32) >> 31) as u32;
                (fill, fill & 1 != 0)
            }
        }
        SRType::Ror => {
            let result = value.rotate_right(amount % WORD_BITS);
            (result, result >> 31 != 0)
        }
    }
}

/// Shifts `value`, discarding the carry out.
#[inline]
pub fn shift(value: u32, shift: SRType, amount: u32, carry_in: bool) -> u32 {
    shift_c(value, shift, amount, carry_in).0
}
