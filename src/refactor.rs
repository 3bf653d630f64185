
//! The refactor driver.
//!
//! Owns the whole pipeline: decompose the array into the level pyramid,
//! extract and bit-plane encode every level, compress the planes, derive the
//! per-level error tables, schedule all chunks globally, and pack them into
//! one stream described by a metadata header.

use smallvec::smallvec;

use crate::backend::Writer;
use crate::compress::LevelCompressor;
use crate::element::{self, Element};
use crate::encode::{BitPlaneEncoder, EncodedLevel};
use crate::error::{Error, Result, UnitResult, usize_to_u32, u64_to_u32};
use crate::estimate::{ErrorEstimator, ErrorMetric, MaxErrorCollector};
use crate::math::{self, Dimensions};
use crate::meta::Metadata;
use crate::order;
use crate::transform::Decomposer;
use crate::transform::interleave::Interleaver;


/// A refactoring pipeline, composed from a decomposer, an interleaver,
/// a bit-plane encoder, a level compressor and an error estimator.
///
/// All intermediate buffers live and die inside one `refactor` call;
/// only the metadata and the packed stream leave it. Peak memory is one
/// copy of the input, plus one level coefficient buffer at a time, plus
/// the encoded chunks of all levels, plus the packed output.
#[derive(Debug, Clone)]
pub struct Refactor<D, I, E, C, S> {

    /// Produces the level pyramid.
    pub decomposer: D,

    /// Extracts each level's coefficients from the pyramid.
    pub interleaver: I,

    /// Slices level coefficients into bit planes.
    pub encoder: E,

    /// Losslessly compresses the planes of each level.
    pub compressor: C,

    /// Prices the error reduction of every chunk for the global schedule.
    pub estimator: S,
}


impl<D, I, E, C, S> Refactor<D, I, E, C, S> {

    /// Compose a refactoring pipeline from its collaborators.
    pub fn new(decomposer: D, interleaver: I, encoder: E, compressor: C, estimator: S) -> Self {
        Refactor { decomposer, interleaver, encoder, compressor, estimator }
    }

    /// Refactor the array into a self-describing header and a packed chunk
    /// stream, ordered such that every byte prefix that ends on a chunk
    /// boundary is the cheapest prefix reaching its accumulated error.
    ///
    /// `target_level` selects the pyramid depth, `num_bit_planes` the encoded
    /// precision per level.
    pub fn refactor<T: Element>(
        &self, data: &[T], dimensions: &[u32], target_level: u8, num_bit_planes: u8,
    ) -> Result<(Metadata<T>, Vec<u8>)>
        where D: Decomposer<T>, I: Interleaver<T>, E: BitPlaneEncoder<T>,
              C: LevelCompressor, S: ErrorEstimator,
    {
        validate_arguments::<T>(data.len(), dimensions, target_level, num_bit_planes)?;

        let level_count = target_level as usize + 1;
        let level_dimensions = math::level_dimensions(dimensions, target_level);
        let level_counts = math::level_element_counts(&level_dimensions);
        let no_embedded: Dimensions = smallvec![0; dimensions.len()];

        let mut pyramid = data.to_vec();
        self.decomposer.decompose(&mut pyramid, dimensions, target_level)?;

        let bound_scale = if self.encoder.is_negabinary() { 4.0 } else { 1.0 };

        let mut level_error_bounds = Vec::with_capacity(level_count);
        let mut level_components = Vec::with_capacity(level_count);
        let mut level_sizes = Vec::with_capacity(level_count);
        let mut level_squared_errors = Vec::with_capacity(level_count);
        let mut stopping_indices = Vec::with_capacity(level_count);

        for level in 0 .. level_count {
            let embedded: &[u32] =
                if level == 0 { &no_embedded }
                else { &level_dimensions[level - 1] };

            let mut coefficients = vec![T::default(); level_counts[level] as usize];
            self.interleaver.interleave(
                &pyramid, dimensions, &level_dimensions[level], embedded, &mut coefficients,
            )?;

            let bound = element::max_abs(&coefficients) * bound_scale;
            level_error_bounds.push(T::from_f64(bound));

            let EncodedLevel { mut planes, mut sizes, plane_errors } = self.encoder.encode(
                &coefficients, math::frexp_exponent(bound), num_bit_planes,
            )?;

            drop(coefficients);
            level_squared_errors.push(plane_errors);

            stopping_indices.push(self.compressor.compress_level(&mut planes, &mut sizes)?);
            level_components.push(planes);
            level_sizes.push(sizes);
        }

        // the error tables the scheduler prices chunks with: recomputed from
        // the bounds alone for the max metric, taken from the encoder for the
        // squared metric
        let level_errors = match self.estimator.metric() {
            ErrorMetric::Max => level_error_bounds.iter()
                .map(|bound: &T| MaxErrorCollector.collect(num_bit_planes, bound.to_f64()))
                .collect(),

            ErrorMetric::Squared => level_squared_errors,
        };

        let (chunk_order, error_per_step) =
            order::chunk_order(&level_errors, &level_sizes, &self.estimator)?;

        let metadata = Metadata {
            dimensions: Dimensions::from_slice(dimensions),
            negabinary: self.encoder.is_negabinary(),
            level_error_bounds, level_sizes, stopping_indices,
            chunk_order, error_per_step,
        };

        let total_size = u64_to_u32(metadata.packed_byte_size(), "packed stream size")? as usize;

        let mut packed = Vec::with_capacity(total_size);
        let mut consumed = vec![0_usize; level_count];

        for &entry in &metadata.chunk_order {
            let level = entry as usize;
            packed.extend_from_slice(&level_components[level][consumed[level]]);
            consumed[level] += 1;
        }

        debug_assert_eq!(packed.len(), total_size, "packed stream must match the declared sizes");
        Ok((metadata, packed))
    }

    /// Refactor into one caller-allocated buffer, laid out as a little-endian
    /// `u32` metadata size, the metadata, then the packed stream. Returns the
    /// total bytes written.
    ///
    /// The customary conservative allocation is the byte size of `data` plus
    /// one KiB. That covers common plane counts; an uncompressed stream at
    /// the maximum plane count can exceed it, in which case the call fails
    /// with a resource error instead of writing anything.
    pub fn refactor_to_buffer<T: Element>(
        &self, data: &[T], dimensions: &[u32], target_level: u8, num_bit_planes: u8,
        output: &mut [u8],
    ) -> Result<usize>
        where D: Decomposer<T>, I: Interleaver<T>, E: BitPlaneEncoder<T>,
              C: LevelCompressor, S: ErrorEstimator,
    {
        let (metadata, packed) = self.refactor(data, dimensions, target_level, num_bit_planes)?;

        let metadata_bytes = metadata.write_to_vec()?;
        let metadata_size = usize_to_u32(metadata_bytes.len(), "metadata size")?;

        let packed_start = 4 + metadata_bytes.len();
        let total_size = packed_start + packed.len();

        if output.len() < total_size {
            return Err(Error::resource("output buffer too small for the refactored data"));
        }

        output[.. 4].copy_from_slice(&metadata_size.to_le_bytes());
        output[4 .. packed_start].copy_from_slice(&metadata_bytes);
        output[packed_start .. total_size].copy_from_slice(&packed);

        Ok(total_size)
    }

    /// Refactor and hand both blobs to a back-end writer.
    pub fn refactor_to_backend<T: Element, W: Writer>(
        &self, data: &[T], dimensions: &[u32], target_level: u8, num_bit_planes: u8,
        writer: &mut W,
    ) -> UnitResult
        where D: Decomposer<T>, I: Interleaver<T>, E: BitPlaneEncoder<T>,
              C: LevelCompressor, S: ErrorEstimator,
    {
        let (metadata, packed) = self.refactor(data, dimensions, target_level, num_bit_planes)?;

        writer.write_metadata(&metadata.write_to_vec()?)?;
        writer.write_components(&packed)?;
        Ok(())
    }
}


fn validate_arguments<T: Element>(
    data_length: usize, dimensions: &[u32], target_level: u8, num_bit_planes: u8,
) -> UnitResult {
    if dimensions.is_empty() || dimensions.len() > 255 {
        return Err(Error::invalid("dimension count"));
    }

    if dimensions.iter().any(|&extent| extent == 0) {
        return Err(Error::invalid("dimension of extent zero"));
    }

    let element_count = math::element_count(dimensions);
    if element_count > u32::MAX as u64 {
        return Err(Error::invalid("element count exceeds 32 bits"));
    }

    if data_length as u64 != element_count {
        return Err(Error::invalid("data length does not match dimensions"));
    }

    match math::max_target_level(dimensions) {
        Some(deepest) if target_level <= deepest => {},
        _ => return Err(Error::invalid("target level too deep for these dimensions")),
    }

    if num_bit_planes == 0 || num_bit_planes > T::MAX_BIT_PLANES {
        return Err(Error::invalid("bit plane count"));
    }

    Ok(())
}
