//! # ALU Arithmetic Tests
//!
//! Deterministic `AddWithCarry` vectors at the signed and unsigned
//! boundaries, plus properties checked against 64-bit reference arithmetic.

use pinkysim_core::core::units::alu::add_with_carry;
use pinkysim_core::core::units::alu::arithmetic::{multiply, sub_with_carry};
use proptest::prelude::*;
use rstest::rstest;

// ─── Constants ───────────────────────────────────────────────────────────────

const I32_MAX: u32 = i32::MAX as u32;
const I32_MIN: u32 = i32::MIN as u32;
const U32_MAX: u32 = u32::MAX;

// ─── Addition ────────────────────────────────────────────────────────────────

#[rstest]
#[case(0, 0, false, (0, false, false))]
#[case(1, 2, false, (3, false, false))]
#[case(1, 2, true, (4, false, false))]
#[case(U32_MAX, 1, false, (0, true, false))]
#[case(U32_MAX, 0, true, (0, true, false))]
#[case(I32_MAX, 1, false, (I32_MIN, false, true))]
#[case(I32_MIN, I32_MIN, false, (0, true, true))]
#[case(I32_MIN, U32_MAX, false, (I32_MAX, true, true))]
#[case(U32_MAX, U32_MAX, true, (U32_MAX, true, false))]
fn add_with_carry_vectors(
    #[case] x: u32,
    #[case] y: u32,
    #[case] carry_in: bool,
    #[case] expected: (u32, bool, bool),
) {
    assert_eq!(add_with_carry(x, y, carry_in), expected);
}

// ─── Subtraction ─────────────────────────────────────────────────────────────

#[rstest]
// Carry is "no borrow".
#[case(5, 3, (2, true, false))]
#[case(3, 5, (U32_MAX - 1, false, false))]
#[case(0, 0, (0, true, false))]
#[case(0, 1, (U32_MAX, false, false))]
#[case(I32_MIN, 1, (I32_MAX, true, true))]
#[case(I32_MAX, U32_MAX, (I32_MIN, false, true))]
fn sub_with_carry_vectors(#[case] x: u32, #[case] y: u32, #[case] expected: (u32, bool, bool)) {
    assert_eq!(sub_with_carry(x, y), expected);
}

#[test]
fn multiply_keeps_low_word() {
    assert_eq!(multiply(0x1_0001, 0x1_0001), 0x0002_0001);
    assert_eq!(multiply(U32_MAX, U32_MAX), 1);
    assert_eq!(multiply(7, 0), 0);
}

// ─── Properties ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn add_matches_wide_reference(x in any::<u32>(), y in any::<u32>(), carry_in in any::<bool>()) {
        let (result, carry, overflow) = add_with_carry(x, y, carry_in);
        let unsigned = u64::from(x) + u64::from(y) + u64::from(carry_in);
        let signed = i64::from(x as i32) + i64::from(y as i32) + i64::from(carry_in);
        prop_assert_eq!(result, unsigned as u32);
        prop_assert_eq!(carry, unsigned > u64::from(U32_MAX));
        prop_assert_eq!(overflow, signed != i64::from(result as i32));
    }

    #[test]
    fn sub_carry_is_not_borrow(x in any::<u32>(), y in any::<u32>()) {
        let (result, carry, _) = sub_with_carry(x, y);
        prop_assert_eq!(result, x.wrapping_sub(y));
        prop_assert_eq!(carry, x >= y);
    }

    #[test]
    fn sub_overflow_matches_checked_sub(x in any::<u32>(), y in any::<u32>()) {
        let (_, _, overflow) = sub_with_carry(x, y);
        prop_assert_eq!(overflow, (x as i32).checked_sub(y as i32).is_none());
    }
}
