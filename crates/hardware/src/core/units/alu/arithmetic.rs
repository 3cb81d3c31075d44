//! ALU arithmetic operations.
//!
//! Implements the architecture's `AddWithCarry` primitive and the
//! subtraction and multiply helpers built on top of it. Carry and overflow
//! are computed from the exact unsigned and signed 64-bit sums, so the
//! result does not depend on host wrapping behaviour.

/// Result of an `AddWithCarry` operation: `(result, carry_out, overflow)`.
pub type AddResult = (u32, bool, bool);

/// Adds `x`, `y`, and `carry_in`, returning the result and the C/V flags.
///
/// # Arguments
///
/// * `x`        - First operand.
/// * `y`        - Second operand.
/// * `carry_in` - Carry into bit 0.
///
/// # Returns
///
/// `(result, carry_out, overflow)`. `carry_out` is set when the unsigned sum
/// does not fit in 32 bits, `overflow` when the signed sum does not fit in
/// a signed 32-bit value.
pub fn add_with_carry(x: u32, y: u32, carry_in: bool) -> AddResult {
    let unsigned_sum = u64::from(x) + u64::from(y) + u64::from(carry_in);
    let signed_sum = i64::from(x as i32) + i64::from(y as i32) + i64::from(carry_in);
    let result = unsigned_sum as u32;
    let carry_out = u64::from(result) != unsigned_sum;
    let overflow = i64::from(result as i32) != signed_sum;
    (result, carry_out, overflow)
}

/// Computes `x - y` as `AddWithCarry(x, NOT(y), 1)`.
///
/// The returned carry is the ARM "no borrow" flag: set when `x >= y` unsigned.
#[inline]
pub fn sub_with_carry(x: u32, y: u32) -> AddResult {
    add_with_carry(x, !y, true)
}

/// Computes the low 32 bits of `x * y`.
///
/// ARMv6-M MULS only produces the low word, which is identical for signed
/// and unsigned operands.
#[inline]
pub const fn multiply(x: u32, y: u32) -> u32 {
    x.wrapping_mul(y)
}
