//! ALU byte manipulation operations.
//!
//! Implements the ARMv6-M extend (SXTB, SXTH, UXTB, UXTH) and reverse
//! (REV, REV16, REVSH) families. These never touch the condition flags.

/// Sign-extends the low byte of `value` (SXTB).
#[inline]
pub const fn sign_extend_byte(value: u32) -> u32 {
    value as u8 as i8 as i32 as u32
}

/// Sign-extends the low halfword of `value` (SXTH).
#[inline]
pub const fn sign_extend_half(value: u32) -> u32 {
    value as u16 as i16 as i32 as u32
}

/// Zero-extends the low byte of `value` (UXTB).
#[inline]
pub const fn zero_extend_byte(value: u32) -> u32 {
    value & 0xFF
}

/// Zero-extends the low halfword of `value` (UXTH).
#[inline]
pub const fn zero_extend_half(value: u32) -> u32 {
    value & 0xFFFF
}

/// Reverses the byte order of a word (REV).
#[inline]
pub const fn reverse_word(value: u32) -> u32 {
    value.swap_bytes()
}

/// Reverses the bytes within each halfword (REV16).
#[inline]
pub const fn reverse_halves(value: u32) -> u32 {
    ((value & 0xFF00_FF00) >> 8) | ((value & 0x00FF_00FF) << 8)
}

/// Reverses the low halfword and sign-extends the result (REVSH).
#[inline]
pub const fn reverse_signed_half(value: u32) -> u32 {
    (value as u16).swap_bytes() as i16 as i32 as u32
}
