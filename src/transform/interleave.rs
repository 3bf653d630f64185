
//! Extraction of one level's coefficients from the pyramid buffer
//! into a contiguous vector, and the inverse placement.

use smallvec::smallvec;
use crate::element::Element;
use crate::error::{Error, UnitResult};
use crate::math;


/// Moves coefficients between the pyramid buffer and a per-level vector.
///
/// The coefficients of a level are the buffer positions inside that level's
/// grid box but outside the embedded coarser box. For the coarsest level the
/// embedded box is empty, so the whole coarse grid is extracted.
pub trait Interleaver<T: Element> {

    /// Copy the level's coefficients out of the pyramid, into `coefficients`.
    /// The target must hold exactly the level's coefficient count.
    fn interleave(
        &self, pyramid: &[T], dimensions: &[u32],
        level: &[u32], embedded: &[u32], coefficients: &mut [T],
    ) -> UnitResult;

    /// Copy a coefficient vector back to its pyramid positions.
    fn deinterleave(
        &self, coefficients: &[T], dimensions: &[u32],
        level: &[u32], embedded: &[u32], pyramid: &mut [T],
    ) -> UnitResult;
}


/// Visits the level box in row-major order and skips the embedded box,
/// so a level's coefficients keep their buffer order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectInterleaver;

impl DirectInterleaver {
    fn traverse(
        dimensions: &[u32], level: &[u32], embedded: &[u32], expected: usize,
        mut visit: impl FnMut(usize, usize),
    ) -> UnitResult {
        if level.len() != dimensions.len() || embedded.len() != dimensions.len() {
            return Err(Error::invalid("level dimension count"));
        }

        let strides = math::strides(dimensions);
        let total = math::element_count(level);

        let mut coordinates: math::Dimensions = smallvec![0; dimensions.len()];
        let mut offset = 0_usize;
        let mut extracted = 0_usize;

        for _ in 0 .. total {
            let inside_embedded = coordinates.iter().zip(embedded)
                .all(|(&coordinate, &extent)| coordinate < extent);

            if !inside_embedded {
                if extracted == expected {
                    return Err(Error::invalid("coefficient buffer too small for level"));
                }

                visit(offset, extracted);
                extracted += 1;
            }

            for dimension in (0 .. level.len()).rev() {
                coordinates[dimension] += 1;
                offset += strides[dimension];

                if coordinates[dimension] < level[dimension] { break; }

                offset -= strides[dimension] * level[dimension] as usize;
                coordinates[dimension] = 0;
            }
        }

        if extracted != expected {
            return Err(Error::invalid("coefficient buffer length does not match level"));
        }

        Ok(())
    }
}

impl<T: Element> Interleaver<T> for DirectInterleaver {

    fn interleave(
        &self, pyramid: &[T], dimensions: &[u32],
        level: &[u32], embedded: &[u32], coefficients: &mut [T],
    ) -> UnitResult {
        Self::traverse(dimensions, level, embedded, coefficients.len(), |offset, index| {
            coefficients[index] = pyramid[offset];
        })
    }

    fn deinterleave(
        &self, coefficients: &[T], dimensions: &[u32],
        level: &[u32], embedded: &[u32], pyramid: &mut [T],
    ) -> UnitResult {
        Self::traverse(dimensions, level, embedded, coefficients.len(), |offset, index| {
            pyramid[offset] = coefficients[index];
        })
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn coarsest_level_is_the_embedded_box(){
        let dimensions = [4_u32, 4];
        let pyramid: Vec<f32> = (0 .. 16).map(|index| index as f32).collect();

        let mut coarse = vec![0.0_f32; 9];
        DirectInterleaver.interleave(&pyramid, &dimensions, &[3, 3], &[0, 0], &mut coarse).unwrap();

        assert_eq!(coarse, vec![0.0, 1.0, 2.0, 4.0, 5.0, 6.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn detail_level_skips_the_embedded_box(){
        let dimensions = [4_u32, 4];
        let pyramid: Vec<f32> = (0 .. 16).map(|index| index as f32).collect();

        let mut details = vec![0.0_f32; 16 - 9];
        DirectInterleaver.interleave(&pyramid, &dimensions, &[4, 4], &[3, 3], &mut details).unwrap();

        assert_eq!(details, vec![3.0, 7.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
    }

    #[test]
    fn levels_partition_the_buffer(){
        let dimensions = [8_u32, 8, 8];
        let levels = math::level_dimensions(&dimensions, 1);
        let counts = math::level_element_counts(&levels);
        let pyramid: Vec<f64> = (0 .. 512).map(|index| index as f64).collect();
        let no_embedded = [0_u32; 3];

        let mut coarse = vec![0.0; counts[0] as usize];
        let mut details = vec![0.0; counts[1] as usize];

        DirectInterleaver.interleave(&pyramid, &dimensions, &levels[0], &no_embedded, &mut coarse).unwrap();
        DirectInterleaver.interleave(&pyramid, &dimensions, &levels[1], &levels[0], &mut details).unwrap();

        let mut all: Vec<f64> = coarse.iter().chain(&details).cloned().collect();
        all.sort_by(|left, right| left.partial_cmp(right).unwrap());

        assert_eq!(all, pyramid, "every buffer position belongs to exactly one level");
    }

    #[test]
    fn deinterleave_inverts_interleave(){
        let dimensions = [6_u32, 5];
        let levels = math::level_dimensions(&dimensions, 1);
        let pyramid: Vec<f32> = (0 .. 30).map(|index| (index as f32).sin()).collect();

        let mut details = vec![0.0_f32; 30 - 12];
        DirectInterleaver.interleave(&pyramid, &dimensions, &levels[1], &levels[0], &mut details).unwrap();

        let mut rebuilt = vec![0.0_f32; 30];
        DirectInterleaver.deinterleave(&details, &dimensions, &levels[1], &levels[0], &mut rebuilt).unwrap();

        for (index, (&value, &original)) in rebuilt.iter().zip(&pyramid).enumerate() {
            if value != 0.0 {
                assert_eq!(value, original, "position {}", index);
            }
        }
    }

    #[test]
    fn wrong_coefficient_count_is_rejected(){
        let pyramid = vec![0.0_f32; 16];
        let mut too_small = vec![0.0_f32; 3];
        let result = DirectInterleaver.interleave(
            &pyramid, &[4, 4], &[3, 3], &[0, 0], &mut too_small
        );

        assert!(result.is_err());
    }
}
