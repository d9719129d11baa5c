// SPDX-License-Identifier: GPL-3.0
// lib.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

// This crate contains small integer helpers used throughout the SPU code, where
// the console hardware relies on specific bit widths and saturation behaviour.

/// Exists to allow us to define custom trait operations on `i32`.
type CustomInt32 = i32;

/// This trait exists to allow us to express the handful of fixed-width integer
/// operations the SPU hardware performs, in the same way everywhere.
pub trait SpuInteger {

    type Output;

    /// This function should return a sign-extended version of the original value,
    /// based on extension from the n-th bit as specified. It can be used for
    /// arbitrary widths within the type (for example 4-bit ADPCM nibbles).
    fn sign_extend(self, from_bit: i32) -> Self::Output;

    /// This function should return the value clamped into the signed 16-bit range,
    /// which is what the SPU does with every intermediate sample and volume.
    fn saturate_i16(self) -> i16;
}

impl SpuInteger for CustomInt32 {

    type Output = i32;

    /// Sign extends based on the specified bit, with 31 being most significant and
    /// 0 being least significant. Bits above `from_bit` are ignored.
    #[inline(always)]
    fn sign_extend(self, from_bit: i32) -> Self::Output {

        let bit_pattern_to_test = 0x1_i32 << from_bit;
        let extension_pattern = (0xFFFFFFFE_u32 as i32) << from_bit;
        let value_pattern = !extension_pattern;

        if self & bit_pattern_to_test == 0 {
            self & value_pattern
        } else {
            self | extension_pattern
        }
    }

    /// Clamps to -32768..=32767.
    #[inline(always)]
    fn saturate_i16(self) -> i16 {
        self.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }
}

/// Re-exported stdlib `min` function, to keep all our utility functions together
/// here in one place.
pub use std::cmp::min;


#[cfg(test)]
mod tests {

    use super::SpuInteger;

    #[test]
    fn sign_extend_should_extend_4_bit_value_if_bit_3_is_set() {

        let input = 0xB_i32;
        let output = input.sign_extend(3);

        assert_eq!(output, -5);
    }

    #[test]
    fn sign_extend_should_leave_4_bit_value_if_bit_3_is_unset() {

        let input = 0x7_i32;
        let output = input.sign_extend(3);

        assert_eq!(output, 7);
    }

    #[test]
    fn sign_extend_should_ignore_bits_above_the_source_width() {

        // The high nibble of a packed ADPCM byte must not leak into the low one.
        let input = 0xA5_i32;
        let output = input.sign_extend(3);

        assert_eq!(output, 5);
    }

    #[test]
    fn sign_extend_should_extend_16_bit_value_if_bit_15_is_set() {

        let input = 0x8000_i32;
        let output = input.sign_extend(15);

        assert_eq!(output, 0xFFFF8000_u32 as i32);
    }

    #[test]
    fn saturate_i16_should_clamp_large_positive_values() {

        assert_eq!(40000_i32.saturate_i16(), i16::MAX);
    }

    #[test]
    fn saturate_i16_should_clamp_large_negative_values() {

        assert_eq!((-40000_i32).saturate_i16(), i16::MIN);
    }

    #[test]
    fn saturate_i16_should_pass_through_in_range_values() {

        assert_eq!(1234_i32.saturate_i16(), 1234);
        assert_eq!((-1234_i32).saturate_i16(), -1234);
    }
}
