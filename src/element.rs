
//! Abstraction over the two supported element types, `f32` and `f64`,
//! and over their fixed-point companion words used by the bit-plane coders.

use bit_field::BitField;
use crate::io::Data;


/// An unsigned machine word holding the fixed-point form of a coefficient.
/// Bit-plane coders address its bits individually.
pub trait FixedWord: Copy + Default + Eq + std::fmt::Debug {

    /// Number of bits in this word, which bounds the usable bit-plane count.
    const BIT_COUNT: u8;

    /// Truncate a non-negative value toward zero.
    fn from_magnitude(value: f64) -> Self;

    /// Truncate a value toward zero and store it in two's complement.
    fn from_signed(value: f64) -> Self;

    /// The value of this word read as an unsigned magnitude.
    fn magnitude_to_f64(self) -> f64;

    /// The value of this word read as a two's complement signed number.
    fn signed_to_f64(self) -> f64;

    /// Whether the bit at the index is set, index `0` being the least significant bit.
    fn bit(self, index: u8) -> bool;

    /// This word with the bit at the index set or cleared.
    fn with_bit(self, index: u8, enabled: bool) -> Self;

    /// This word with the lowest `count` bits cleared.
    /// Clearing all bits or more yields zero.
    fn clear_low_bits(self, count: u8) -> Self;

    /// Reinterpret a two's complement word as base minus two:
    /// afterwards, bit `i` carries the digit of weight `(-2)^i`.
    fn to_negabinary(self) -> Self;

    /// Undo `to_negabinary`. Exact for any subset of the digits,
    /// which is what allows decoding a prefix of the planes.
    fn from_negabinary(self) -> Self;
}


macro_rules! implement_fixed_word {
    ($word: ident, $signed: ident, $mask: expr) => {
        impl FixedWord for $word {
            const BIT_COUNT: u8 = $word::BITS as u8;

            fn from_magnitude(value: f64) -> Self { value as $word }
            fn from_signed(value: f64) -> Self { (value as $signed) as $word }

            fn magnitude_to_f64(self) -> f64 { self as f64 }
            fn signed_to_f64(self) -> f64 { (self as $signed) as f64 }

            fn bit(self, index: u8) -> bool { self.get_bit(index as usize) }

            fn with_bit(mut self, index: u8, enabled: bool) -> Self {
                self.set_bit(index as usize, enabled);
                self
            }

            fn clear_low_bits(self, count: u8) -> Self {
                if count >= <Self as FixedWord>::BIT_COUNT { 0 }
                else { (self >> count) << count }
            }

            fn to_negabinary(self) -> Self {
                self.wrapping_add($mask) ^ $mask
            }

            fn from_negabinary(self) -> Self {
                (self ^ $mask).wrapping_sub($mask)
            }
        }
    };
}

implement_fixed_word!(u32, i32, 0xaaaa_aaaa_u32);
implement_fixed_word!(u64, i64, 0xaaaa_aaaa_aaaa_aaaa_u64);


/// A floating-point element of a refactorable array.
/// Implemented for `f32` and `f64`.
pub trait Element: Copy + Default + PartialOrd + Data + std::fmt::Debug + 'static {

    /// The fixed-point word matching this precision.
    type Fixed: FixedWord;

    /// The most bit planes a level of this element type can be encoded into.
    const MAX_BIT_PLANES: u8;

    /// Lossless widening conversion.
    fn to_f64(self) -> f64;

    /// Narrowing conversion. Values that originated as `Self` convert back exactly.
    fn from_f64(value: f64) -> Self;
}

impl Element for f32 {
    type Fixed = u32;
    const MAX_BIT_PLANES: u8 = 32;

    fn to_f64(self) -> f64 { self as f64 }
    fn from_f64(value: f64) -> Self { value as f32 }
}

impl Element for f64 {
    type Fixed = u64;
    const MAX_BIT_PLANES: u8 = 64;

    fn to_f64(self) -> f64 { self }
    fn from_f64(value: f64) -> Self { value }
}


/// The largest absolute value in the slice, or zero for an empty slice.
/// This is the error bound of a level: dropping all its planes
/// changes no reconstructed element by more than this amount.
pub fn max_abs<T: Element>(values: &[T]) -> f64 {
    values.iter()
        .map(|value| value.to_f64().abs())
        .fold(0.0, f64::max)
}
