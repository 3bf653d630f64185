
//! Bit-plane encoding of level coefficients.
//!
//! A level's coefficients are converted to fixed point relative to the level
//! error bound, then sliced into planes: plane `j` collects one bit of every
//! coefficient, ordered from most to least significant. Any prefix of the
//! planes decodes on its own, missing planes read as zero bits.

pub mod sign_magnitude;
pub mod negabinary;

pub use self::sign_magnitude::SignMagnitudeEncoder;
pub use self::negabinary::NegaBinaryEncoder;

use bit_field::BitField;
use crate::element::Element;
use crate::error::{Error, Result, UnitResult};


/// The bit planes of one encoded level, with their byte sizes
/// and the squared reconstruction error remaining after each plane.
#[derive(Debug, Clone)]
pub struct EncodedLevel {

    /// One byte buffer per plane. Plane `0` is consumed first on reconstruction.
    pub planes: Vec<Vec<u8>>,

    /// Byte length of each plane. Updated by the level compressor.
    pub sizes: Vec<u32>,

    /// `plane_errors[j]` is the summed squared reconstruction error over all
    /// coefficients when only the planes before `j` are used.
    /// One entry more than there are planes; monotone non-increasing.
    pub plane_errors: Vec<f64>,
}


/// Encodes the coefficients of one level into independently decodable planes.
pub trait BitPlaneEncoder<T: Element> {

    /// Whether coefficients are coded in base minus two.
    /// If so, the stored level error bound must absorb the
    /// four-fold dynamic range of that representation.
    fn is_negabinary(&self) -> bool { false }

    /// Slice the coefficients into `num_bit_planes` planes.
    /// The exponent is the `frexp` exponent of the stored level error bound.
    fn encode(&self, coefficients: &[T], exponent: i32, num_bit_planes: u8) -> Result<EncodedLevel>;

    /// Rebuild `count` coefficients from a prefix of the planes.
    /// Planes beyond the prefix contribute zero bits.
    fn decode(&self, planes: &[Vec<u8>], count: usize, exponent: i32, num_bit_planes: u8) -> Result<Vec<T>>;
}


/// Bytes needed to store one bit per coefficient.
pub(crate) fn plane_byte_size(coefficient_count: usize) -> usize {
    (coefficient_count + 7) / 8
}

pub(crate) fn validate_plane_count<T: Element>(num_bit_planes: u8) -> UnitResult {
    if num_bit_planes == 0 || num_bit_planes > T::MAX_BIT_PLANES {
        Err(Error::invalid("bit plane count"))
    }
    else { Ok(()) }
}

/// Check that each available plane is long enough for the coefficient count.
pub(crate) fn validate_plane_bytes(planes: &[Vec<u8>], coefficient_count: usize) -> UnitResult {
    let required = plane_byte_size(coefficient_count);

    if planes.iter().any(|plane| plane.len() < required) {
        Err(Error::invalid("plane byte length"))
    }
    else { Ok(()) }
}

#[inline]
pub(crate) fn read_bit(plane: &[u8], coefficient: usize) -> bool {
    plane[coefficient >> 3].get_bit(coefficient & 7)
}

#[inline]
pub(crate) fn set_bit(plane: &mut [u8], coefficient: usize) {
    plane[coefficient >> 3].set_bit(coefficient & 7, true);
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn packed_bits(){
        let mut plane = vec![0_u8; 2];
        set_bit(&mut plane, 0);
        set_bit(&mut plane, 7);
        set_bit(&mut plane, 9);

        assert_eq!(plane, vec![0b1000_0001, 0b0000_0010]);
        assert!(read_bit(&plane, 0));
        assert!(!read_bit(&plane, 1));
        assert!(read_bit(&plane, 9));
    }

    #[test]
    fn plane_sizes(){
        assert_eq!(plane_byte_size(0), 0);
        assert_eq!(plane_byte_size(1), 1);
        assert_eq!(plane_byte_size(8), 1);
        assert_eq!(plane_byte_size(9), 2);
    }

    #[test]
    fn plane_count_limits(){
        assert!(validate_plane_count::<f32>(32).is_ok());
        assert!(validate_plane_count::<f32>(33).is_err());
        assert!(validate_plane_count::<f64>(64).is_ok());
        assert!(validate_plane_count::<f64>(0).is_err());
    }
}
