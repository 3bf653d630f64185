
//! Sign-magnitude bit-plane coding:
//! the first plane carries one sign bit per coefficient,
//! the remaining planes carry the magnitude bits from high to low significance.

use super::*;
use crate::element::FixedWord;
use crate::math::shift_exponent;


/// The straightforward coding scheme. Signs cost one full plane,
/// in exchange the error bound needs no scaling.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignMagnitudeEncoder;

impl<T: Element> BitPlaneEncoder<T> for SignMagnitudeEncoder {

    fn encode(&self, coefficients: &[T], exponent: i32, num_bit_planes: u8) -> Result<EncodedLevel> {
        validate_plane_count::<T>(num_bit_planes)?;

        let plane_count = num_bit_planes as usize;
        let bytes_per_plane = plane_byte_size(coefficients.len());

        let mut planes = vec![vec![0_u8; bytes_per_plane]; plane_count];
        let mut plane_errors = vec![0.0_f64; plane_count + 1];

        // scale so the magnitude occupies the bits below the sign bit
        let shift = plane_count as i32 - 1 - exponent;

        for (index, &coefficient) in coefficients.iter().enumerate() {
            let value = coefficient.to_f64();
            let magnitude = T::Fixed::from_magnitude(shift_exponent(value.abs(), shift));

            if value.is_sign_negative() {
                set_bit(&mut planes[0], index);
            }

            for plane in 1 .. plane_count {
                if magnitude.bit((plane_count - 1 - plane) as u8) {
                    set_bit(&mut planes[plane], index);
                }
            }

            plane_errors[0] += value * value;

            for plane in 1 ..= plane_count {
                let kept = magnitude.clear_low_bits((plane_count - plane) as u8);
                let approximation = shift_exponent(kept.magnitude_to_f64(), -shift);
                let residual = value.abs() - approximation;
                plane_errors[plane] += residual * residual;
            }
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
            let negative = available > 0 && read_bit(&planes[0], index);

            let mut magnitude = T::Fixed::default();
            for plane in 1 .. available {
                if read_bit(&planes[plane], index) {
                    magnitude = magnitude.with_bit((plane_count - 1 - plane) as u8, true);
                }
            }

            let mut value = shift_exponent(magnitude.magnitude_to_f64(), -shift);
            if negative { value = -value; }

            coefficients.push(T::from_f64(value));
        }

        Ok(coefficients)
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::math::frexp_exponent;

    #[test]
    fn plane_layout(){
        let coefficients = [0.75_f32, -0.5];
        let exponent = frexp_exponent(0.75);
        assert_eq!(exponent, 0);

        let encoded = SignMagnitudeEncoder.encode(&coefficients, exponent, 4).unwrap();
        assert_eq!(encoded.planes.len(), 4);
        assert_eq!(encoded.sizes, vec![1, 1, 1, 1]);

        // fixed point: 0.75 -> 0b110, 0.5 -> 0b100
        assert_eq!(encoded.planes[0], vec![0b10]); // signs
        assert_eq!(encoded.planes[1], vec![0b11]); // highest magnitude bit
        assert_eq!(encoded.planes[2], vec![0b01]);
        assert_eq!(encoded.planes[3], vec![0b00]);

        assert_eq!(encoded.plane_errors[0], 0.75 * 0.75 + 0.5 * 0.5);
        assert_eq!(*encoded.plane_errors.last().unwrap(), 0.0);
    }

    #[test]
    fn full_prefix_decodes_exactly(){
        let coefficients = [0.75_f32, -0.5, 0.0, 0.625];
        let exponent = frexp_exponent(0.75);

        let encoded = SignMagnitudeEncoder.encode(&coefficients, exponent, 8).unwrap();
        let decoded: Vec<f32> = SignMagnitudeEncoder.decode(&encoded.planes, 4, exponent, 8).unwrap();

        assert_eq!(decoded, coefficients);
    }

    #[test]
    fn shorter_prefixes_degrade_monotonically(){
        let coefficients: Vec<f64> = (0 .. 100)
            .map(|index| ((index * 7919) % 200) as f64 / 100.0 - 1.0)
            .collect();

        let bound = crate::element::max_abs(&coefficients);
        let exponent = frexp_exponent(bound);
        let encoded = SignMagnitudeEncoder.encode(&coefficients, exponent, 16).unwrap();

        let mut previous = f64::INFINITY;
        for plane in 0 ..= 16 {
            let error = encoded.plane_errors[plane];
            assert!(error <= previous, "plane {} error {} above {}", plane, error, previous);
            previous = error;

            let decoded: Vec<f64> = SignMagnitudeEncoder
                .decode(&encoded.planes[.. plane], coefficients.len(), exponent, 16)
                .unwrap();

            let squared: f64 = decoded.iter().zip(&coefficients)
                .map(|(&approximate, &exact)| (exact - approximate) * (exact - approximate))
                .sum();

            assert!(squared <= encoded.plane_errors[plane] + 1e-12,
                "decoded error {} must not exceed the declared error {}", squared, error);
        }
    }

    #[test]
    fn zero_bound_levels_encode_to_zero_planes(){
        let coefficients = [0.0_f32; 10];
        let encoded = SignMagnitudeEncoder.encode(&coefficients, 0, 4).unwrap();

        assert!(encoded.planes.iter().all(|plane| plane.iter().all(|&byte| byte == 0)));
        assert!(encoded.plane_errors.iter().all(|&error| error == 0.0));
    }

    #[test]
    fn rejects_too_many_planes(){
        assert!(SignMagnitudeEncoder.encode(&[1.0_f32], 1, 40).is_err());
    }
}
