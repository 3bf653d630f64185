
//! The multilevel transform that turns an array into a pyramid of
//! detail coefficients, and its exact inverse.

pub mod interleave;

use smallvec::{SmallVec, smallvec};
use crate::element::Element;
use crate::error::{Error, UnitResult};
use crate::math;


/// Computes a hierarchy of resolution levels inside one buffer.
///
/// After decomposition, the box of the coarsest level grid holds a
/// subsampled approximation of the array, and the remainder of each level box
/// holds that level's detail coefficients. `recompose` inverts the transform.
pub trait Decomposer<T: Element> {

    /// Transform the array in place into the level pyramid.
    fn decompose(&self, data: &mut [T], dimensions: &[u32], target_level: u8) -> UnitResult;

    /// Undo `decompose` in place.
    fn recompose(&self, data: &mut [T], dimensions: &[u32], target_level: u8) -> UnitResult;
}


/// The hierarchical-basis decomposer.
///
/// One coarsening pass halves every dimension: even-index nodes survive into
/// the coarser grid, odd-index nodes are replaced by their difference from the
/// linear interpolation of their two even neighbors. Each one-dimensional lane
/// is repacked as `[coarse nodes | detail coefficients]` so that the coarser
/// grid occupies the low corner of the buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalDecomposer;

impl<T: Element> Decomposer<T> for HierarchicalDecomposer {

    fn decompose(&self, data: &mut [T], dimensions: &[u32], target_level: u8) -> UnitResult {
        let (levels, strides, mut lane) = prepare(data, dimensions, target_level)?;

        for level in (1 ..= target_level as usize).rev() {
            let current = &levels[level];
            let coarse = &levels[level - 1];

            for axis in 0 .. dimensions.len() {
                let extents = processed_box(current, coarse, axis);

                for_each_lane(&extents, &strides, axis, |origin| {
                    decompose_lane(data, origin, current[axis] as usize, strides[axis], &mut lane);
                });
            }
        }

        Ok(())
    }

    fn recompose(&self, data: &mut [T], dimensions: &[u32], target_level: u8) -> UnitResult {
        let (levels, strides, mut lane) = prepare(data, dimensions, target_level)?;

        for level in 1 ..= target_level as usize {
            let current = &levels[level];
            let coarse = &levels[level - 1];

            // inverse axis order, so each step sees exactly the state
            // its forward counterpart produced
            for axis in (0 .. dimensions.len()).rev() {
                let extents = processed_box(current, coarse, axis);

                for_each_lane(&extents, &strides, axis, |origin| {
                    recompose_lane(data, origin, current[axis] as usize, strides[axis], &mut lane);
                });
            }
        }

        Ok(())
    }
}


type Extents = SmallVec<[u32; 4]>;

fn prepare<T: Element>(data: &[T], dimensions: &[u32], target_level: u8)
    -> crate::error::Result<(Vec<math::Dimensions>, SmallVec<[usize; 4]>, Vec<T>)>
{
    if data.len() as u64 != math::element_count(dimensions) {
        return Err(Error::invalid("data length does not match dimensions"));
    }

    let levels = math::level_dimensions(dimensions, target_level);
    let strides = math::strides(dimensions);
    let longest = dimensions.iter().cloned().max().unwrap_or(0) as usize;

    Ok((levels, strides, vec![T::default(); longest]))
}

/// The box a transform along `axis` operates on: axes already processed at
/// this level are reduced to the coarse extent, later axes still span the
/// current extent.
fn processed_box(current: &[u32], coarse: &[u32], axis: usize) -> Extents {
    current.iter().zip(coarse).enumerate()
        .map(|(dimension, (&fine, &coarsened))| if dimension < axis { coarsened } else { fine })
        .collect()
}

/// Calls back with the buffer offset of the first element of every
/// one-dimensional lane along `axis` inside the box.
fn for_each_lane(extents: &[u32], strides: &[usize], axis: usize, mut per_lane: impl FnMut(usize)) {
    let lane_count: u64 = extents.iter().enumerate()
        .filter(|&(dimension, _)| dimension != axis)
        .map(|(_, &extent)| extent as u64)
        .product();

    let mut coordinates: Extents = smallvec![0; extents.len()];

    for _ in 0 .. lane_count {
        let origin = coordinates.iter().zip(strides)
            .map(|(&coordinate, &stride)| coordinate as usize * stride)
            .sum();

        per_lane(origin);

        for dimension in (0 .. extents.len()).rev() {
            if dimension == axis { continue; }

            coordinates[dimension] += 1;
            if coordinates[dimension] < extents[dimension] { break; }
            coordinates[dimension] = 0;
        }
    }
}

/// Transform one lane of `extent` strided values into `[coarse | detail]`.
///
/// Coarse nodes are the even indices, plus the last node when the extent is
/// even. Each odd interior node becomes its interpolation residual.
fn decompose_lane<T: Element>(data: &mut [T], origin: usize, extent: usize, stride: usize, lane: &mut [T]) {
    if extent <= 2 { return; }
    let coarse_count = extent / 2 + 1;

    for index in 0 .. extent {
        lane[index] = data[origin + index * stride];
    }

    for index in 0 .. coarse_count {
        let source = (2 * index).min(extent - 1);
        data[origin + index * stride] = lane[source];
    }

    let mut write = coarse_count;
    let mut odd = 1;

    while odd + 1 < extent {
        let center = lane[odd].to_f64();
        let interpolated = (lane[odd - 1].to_f64() + lane[odd + 1].to_f64()) / 2.0;

        data[origin + write * stride] = T::from_f64(center - interpolated);
        write += 1;
        odd += 2;
    }

    debug_assert_eq!(write, extent, "lane repacking must fill the lane exactly");
}

/// Exact inverse of `decompose_lane`.
fn recompose_lane<T: Element>(data: &mut [T], origin: usize, extent: usize, stride: usize, lane: &mut [T]) {
    if extent <= 2 { return; }
    let coarse_count = extent / 2 + 1;

    for index in 0 .. extent {
        lane[index] = data[origin + index * stride];
    }

    // restore the coarse nodes first, the residuals interpolate between them
    for index in 0 .. coarse_count {
        let target = (2 * index).min(extent - 1);
        data[origin + target * stride] = lane[index];
    }

    let mut read = coarse_count;
    let mut odd = 1;

    while odd + 1 < extent {
        let interpolated = (
            data[origin + (odd - 1) * stride].to_f64() +
            data[origin + (odd + 1) * stride].to_f64()
        ) / 2.0;

        data[origin + odd * stride] = T::from_f64(lane[read].to_f64() + interpolated);
        read += 1;
        odd += 2;
    }
}
