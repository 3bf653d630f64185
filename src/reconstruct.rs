
//! Progressive reconstruction from a refactored stream.
//!
//! A reader needs only the header and a byte prefix of the packed stream:
//! it looks up the smallest step count whose accumulated error meets the
//! tolerance, splits that prefix back into per-level planes, and inverts
//! the pipeline. Planes that were not retrieved contribute zero bits.

use smallvec::smallvec;

use crate::backend::Retriever;
use crate::compress::LevelCompressor;
use crate::element::Element;
use crate::encode::BitPlaneEncoder;
use crate::error::{Error, Result};
use crate::math::{self, Dimensions};
use crate::meta::Metadata;
use crate::transform::Decomposer;
use crate::transform::interleave::Interleaver;


/// The inverse pipeline. Must be composed of collaborators matching the
/// ones that produced the stream: same coding scheme, same compressor.
#[derive(Debug, Clone)]
pub struct Reconstructor<D, I, E, C> {

    /// Inverts the level pyramid.
    pub decomposer: D,

    /// Places level coefficients back into the pyramid.
    pub interleaver: I,

    /// Decodes bit planes into coefficients.
    pub encoder: E,

    /// Decompresses the planes below each level's stopping plane.
    pub compressor: C,
}


impl<D, I, E, C> Reconstructor<D, I, E, C> {

    /// Compose the inverse pipeline from its collaborators.
    pub fn new(decomposer: D, interleaver: I, encoder: E, compressor: C) -> Self {
        Reconstructor { decomposer, interleaver, encoder, compressor }
    }

    /// Reconstruct the array from the smallest stream prefix whose
    /// accumulated error meets the tolerance. The tolerance is measured in
    /// the metric of the estimator the stream was refactored with.
    ///
    /// `stream` must hold at least that prefix of the packed chunks;
    /// extra trailing bytes are ignored.
    pub fn reconstruct<T: Element>(
        &self, metadata: &Metadata<T>, stream: &[u8], tolerance: f64,
    ) -> Result<Vec<T>>
        where D: Decomposer<T>, I: Interleaver<T>, E: BitPlaneEncoder<T>, C: LevelCompressor,
    {
        self.reconstruct_chunks(metadata, stream, chunks_for_tolerance(metadata, tolerance))
    }

    /// Reconstruct from a buffer produced by `refactor_to_buffer`:
    /// a `u32` metadata size, the metadata, then the packed stream.
    pub fn reconstruct_from_buffer<T: Element>(
        &self, buffer: &[u8], tolerance: f64,
    ) -> Result<Vec<T>>
        where D: Decomposer<T>, I: Interleaver<T>, E: BitPlaneEncoder<T>, C: LevelCompressor,
    {
        if buffer.len() < 4 {
            return Err(Error::invalid("refactored buffer too short"));
        }

        let metadata_size = u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
        let packed_start = 4 + metadata_size;

        if buffer.len() < packed_start {
            return Err(Error::invalid("refactored buffer too short"));
        }

        let metadata = Metadata::read(&mut &buffer[4 .. packed_start])?;
        self.reconstruct(&metadata, &buffer[packed_start ..], tolerance)
    }

    fn reconstruct_chunks<T: Element>(
        &self, metadata: &Metadata<T>, stream: &[u8], chunk_count: usize,
    ) -> Result<Vec<T>>
        where D: Decomposer<T>, I: Interleaver<T>, E: BitPlaneEncoder<T>, C: LevelCompressor,
    {
        metadata.validate()?;

        let level_count = metadata.level_count();
        let target_level = (level_count - 1) as u8;
        let plane_count = metadata.plane_count() as u8;

        let level_dimensions = math::level_dimensions(&metadata.dimensions, target_level);
        let level_counts = math::level_element_counts(&level_dimensions);
        let no_embedded: Dimensions = smallvec![0; metadata.dimensions.len()];

        // split the prefix back into per-level planes, in chunk order
        let mut level_planes: Vec<Vec<Vec<u8>>> = vec![Vec::new(); level_count];
        let mut position = 0_usize;

        for &entry in metadata.chunk_order.iter().take(chunk_count) {
            let level = entry as usize;
            let size = metadata.level_sizes[level][level_planes[level].len()] as usize;

            let chunk = stream.get(position .. position + size)
                .ok_or_else(|| Error::invalid("stream shorter than the header declares"))?;

            level_planes[level].push(chunk.to_vec());
            position += size;
        }

        let total_elements = math::element_count(&metadata.dimensions);
        if total_elements > u32::MAX as u64 {
            return Err(Error::invalid("element count exceeds 32 bits"));
        }

        let mut pyramid = vec![T::default(); total_elements as usize];

        for (level, mut planes) in level_planes.into_iter().enumerate() {
            self.compressor.decompress_level(&mut planes, metadata.stopping_indices[level])?;

            let exponent = math::frexp_exponent(metadata.level_error_bounds[level].to_f64());
            let coefficients = self.encoder.decode(
                &planes, level_counts[level] as usize, exponent, plane_count,
            )?;

            let embedded: &[u32] =
                if level == 0 { &no_embedded }
                else { &level_dimensions[level - 1] };

            self.interleaver.deinterleave(
                &coefficients, &metadata.dimensions, &level_dimensions[level], embedded, &mut pyramid,
            )?;
        }

        self.decomposer.recompose(&mut pyramid, &metadata.dimensions, target_level)?;
        Ok(pyramid)
    }
}


/// The number of chunks a reader must consume to meet the tolerance:
/// one past the smallest step whose accumulated error is within it.
/// An unreachable tolerance takes the whole stream.
fn chunks_for_tolerance<T: Element>(metadata: &Metadata<T>, tolerance: f64) -> usize {
    let steps = &metadata.error_per_step;

    // the accumulated error never increases along the stream
    let first_within = steps.partition_point(|&error| error > tolerance);

    if first_within < steps.len() { first_within + 1 }
    else { steps.len() }
}


/// Incrementally fetches a refactored stream from a back-end.
///
/// Remembers every byte retrieved so far: asking for a tighter tolerance
/// later only fetches the additional range, never re-reads the front.
#[derive(Debug)]
pub struct ProgressiveReader<T: Element, R: Retriever> {
    retriever: R,
    metadata: Metadata<T>,
    fetched: Vec<u8>,
}

impl<T: Element, R: Retriever> ProgressiveReader<T, R> {

    /// Load and parse the metadata; the component stream stays untouched.
    pub fn new(retriever: R) -> Result<Self> {
        let bytes = retriever.load_metadata()?;
        let metadata = Metadata::read(&mut bytes.as_slice())?;

        Ok(ProgressiveReader { retriever, metadata, fetched: Vec::new() })
    }

    /// The parsed stream header.
    pub fn metadata(&self) -> &Metadata<T> {
        &self.metadata
    }

    /// The underlying retriever, for instrumentation of offsets and
    /// total retrieved bytes.
    pub fn retriever(&self) -> &R {
        &self.retriever
    }

    /// Fetch as much more of the stream as this tolerance requires
    /// and reconstruct from everything fetched so far.
    pub fn reconstruct<D, I, E, C>(
        &mut self, reconstructor: &Reconstructor<D, I, E, C>, tolerance: f64,
    ) -> Result<Vec<T>>
        where D: Decomposer<T>, I: Interleaver<T>, E: BitPlaneEncoder<T>, C: LevelCompressor,
    {
        let chunk_count = chunks_for_tolerance(&self.metadata, tolerance);

        let required: u64 = {
            let mut consumed = vec![0_usize; self.metadata.level_count()];

            self.metadata.chunk_order.iter().take(chunk_count).map(|&entry| {
                let level = entry as usize;
                let size = self.metadata.level_sizes[level][consumed[level]] as u64;
                consumed[level] += 1;
                size
            }).sum()
        };

        if required > self.fetched.len() as u64 {
            let additional = self.retriever
                .retrieve_components((required - self.fetched.len() as u64) as u32)?;
            self.fetched.extend_from_slice(&additional);
        }

        reconstructor.reconstruct_chunks(&self.metadata, &self.fetched, chunk_count)
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use smallvec::smallvec;

    fn metadata_with_steps(steps: Vec<f64>) -> Metadata<f32> {
        let chunk_count = steps.len();
        Metadata {
            dimensions: smallvec![64],
            level_error_bounds: vec![1.0],
            level_sizes: vec![vec![8; chunk_count]],
            stopping_indices: vec![0],
            negabinary: false,
            chunk_order: vec![0; chunk_count],
            error_per_step: steps,
        }
    }

    #[test]
    fn tolerance_selects_the_smallest_prefix(){
        let metadata = metadata_with_steps(vec![8.0, 4.0, 2.0, 1.0, 0.0]);

        assert_eq!(chunks_for_tolerance(&metadata, 100.0), 1, "even a loose tolerance consumes one chunk");
        assert_eq!(chunks_for_tolerance(&metadata, 4.0), 2);
        assert_eq!(chunks_for_tolerance(&metadata, 3.9), 3);
        assert_eq!(chunks_for_tolerance(&metadata, 0.0), 5);
        assert_eq!(chunks_for_tolerance(&metadata, -1.0), 5, "an unreachable tolerance takes everything");
    }

    #[test]
    fn missing_stream_bytes_are_rejected(){
        let metadata = metadata_with_steps(vec![1.0, 0.0]);
        let reconstructor = Reconstructor::new(
            crate::transform::HierarchicalDecomposer,
            crate::transform::interleave::DirectInterleaver,
            crate::encode::SignMagnitudeEncoder,
            crate::compress::NullLevelCompressor,
        );

        let short_stream = vec![0_u8; 3];
        let result: Result<Vec<f32>> = reconstructor.reconstruct(&metadata, &short_stream, 0.0);
        assert!(result.is_err());
    }
}
