
//! Base-minus-two bit-plane coding.
//!
//! Converting each coefficient to negabinary removes the dedicated sign
//! plane: every plane carries pure digit bits. The price is dynamic range,
//! a negabinary word needs up to two extra digits for the same magnitude,
//! so the stored level error bound is scaled by four before its exponent
//! is taken.

use super::*;
use crate::element::FixedWord;
use crate::math::shift_exponent;


/// Sign-free coding in base minus two.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegaBinaryEncoder;

impl<T: Element> BitPlaneEncoder<T> for NegaBinaryEncoder {

    fn is_negabinary(&self) -> bool { true }

    fn encode(&self, coefficients: &[T], exponent: i32, num_bit_planes: u8) -> Result<EncodedLevel> {
        validate_plane_count::<T>(num_bit_planes)?;

        let plane_count = num_bit_planes as usize;
        let bytes_per_plane = plane_byte_size(coefficients.len());

        let mut planes = vec![vec![0_u8; bytes_per_plane]; plane_count];
        let mut plane_errors = vec![0.0_f64; plane_count + 1];

        // the exponent already contains the four-fold bound scaling,
        // so every signed fixed-point value is representable in the digit count
        let shift = plane_count as i32 - 1 - exponent;

        for (index, &coefficient) in coefficients.iter().enumerate() {
            let value = coefficient.to_f64();
            let digits = T::Fixed::from_signed(shift_exponent(value, shift)).to_negabinary();

            for plane in 0 .. plane_count {
                if digits.bit((plane_count - 1 - plane) as u8) {
                    set_bit(&mut planes[plane], index);
                }
            }

            plane_errors[0] += value * value;

            for plane in 1 ..= plane_count {
                let kept = digits.clear_low_bits((plane_count - plane) as u8);
                let approximation = shift_exponent(kept.from_negabinary().signed_to_f64(), -shift);
                let residual = value - approximation;
                plane_errors[plane] += residual * residual;
            }
        }

        // a partial sum of negabinary digits can overshoot its target value,
        // so the raw residual table is not monotone. publish its non-increasing
        // majorant: still an upper bound for every prefix decode
        for plane in (0 .. plane_count).rev() {
            plane_errors[plane] = plane_errors[plane].max(plane_errors[plane + 1]);
        }

        let sizes = planes.iter().map(|plane| plane.len() as u32).collect();
        Ok(EncodedLevel { planes, sizes, plane_errors })
    }

    fn decode(&self, planes: &[Vec<u8>], count: usize, exponent: i32, num_bit_planes: u8) -> Result<Vec<T>> {
        validate_plane_count::<T>(num_bit_planes)?;

        let plane_count = num_bit_planes as usize;
        let available = planes.len().min(plane_count);
        validate_plane_bytes(&planes[.. available], count)?;

        let shift = plane_count as i32 - 1 - exponent;
        let mut coefficients = Vec::with_capacity(count);

        for index in 0 .. count {
            let mut digits = T::Fixed::default();

            for plane in 0 .. available {
                if read_bit(&planes[plane], index) {
                    digits = digits.with_bit((plane_count - 1 - plane) as u8, true);
                }
            }

            let value = shift_exponent(digits.from_negabinary().signed_to_f64(), -shift);
            coefficients.push(T::from_f64(value));
        }

        Ok(coefficients)
    }
}
