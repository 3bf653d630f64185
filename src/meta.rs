
//! The self-describing header of a refactored stream.
//!
//! The layout is byte-exact and little-endian without padding, so readers in
//! other languages can parse it with plain pointer arithmetic:
//!
//! | field | type |
//! |---|---|
//! | dimension count | `u8` |
//! | dimensions | `u32` each |
//! | level count | `u8` |
//! | level error bounds | element type each |
//! | level plane sizes | per level: `u32` count, then `u32` each |
//! | stopping indices | `u8` per level |
//! | negabinary flag | `u8` |
//! | chunk count | `u16` |
//! | chunk order | `u8` per chunk |
//! | error per step | `u32` count, then `f64` each |
//!
//! Every nested vector writes a `u32` length before its payload.

use crate::element::Element;
use crate::error::{Error, Result, UnitResult, usize_to_u32};
use crate::io::{Data, Read, Write};
use crate::math::Dimensions;


/// Everything a reader needs to interpret a packed stream:
/// the array shape, the per-level tables, and the global chunk order
/// with its accumulated error after every chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata<T: Element> {

    /// Extents of the original array, outermost dimension first.
    pub dimensions: Dimensions,

    /// The largest coefficient magnitude of each level, coarsest level first.
    /// Scaled by four when the negabinary flag is set.
    pub level_error_bounds: Vec<T>,

    /// Byte size of every chunk, as `level_sizes[level][plane]`,
    /// after lossless compression.
    pub level_sizes: Vec<Vec<u32>>,

    /// Per level, the first plane that was stored raw instead of compressed.
    pub stopping_indices: Vec<u8>,

    /// Whether coefficients are coded in base minus two.
    pub negabinary: bool,

    /// One level index per chunk in stream order. The `k`-th occurrence
    /// of a level refers to that level's plane `k`.
    pub chunk_order: Vec<u8>,

    /// Accumulated error after consuming each chunk of `chunk_order`.
    pub error_per_step: Vec<f64>,
}


impl<T: Element> Metadata<T> {

    /// Number of levels described by this header.
    pub fn level_count(&self) -> usize {
        self.level_error_bounds.len()
    }

    /// Number of bit planes per level.
    pub fn plane_count(&self) -> usize {
        self.level_sizes.first().map_or(0, Vec::len)
    }

    /// Total byte size of the packed stream this header describes.
    pub fn packed_byte_size(&self) -> u64 {
        self.level_sizes.iter().flatten().map(|&size| size as u64).sum()
    }

    /// Number of bytes the serialized header occupies.
    pub fn byte_size(&self) -> usize {
        1 + 4 * self.dimensions.len()
            + 1 + T::BYTE_SIZE * self.level_error_bounds.len()
            + self.level_sizes.iter().map(|sizes| 4 + 4 * sizes.len()).sum::<usize>()
            + self.stopping_indices.len()
            + 1
            + 2 + self.chunk_order.len()
            + 4 + 8 * self.error_per_step.len()
    }

    /// Check the structural consistency of this header.
    pub fn validate(&self) -> UnitResult {
        let levels = self.level_count();

        if self.dimensions.is_empty() {
            return Err(Error::invalid("dimension count"));
        }

        if levels == 0 || levels > 255 {
            return Err(Error::invalid("level count"));
        }

        if self.level_sizes.len() != levels || self.stopping_indices.len() != levels {
            return Err(Error::invalid("level table lengths"));
        }

        let planes = self.plane_count();
        if planes == 0 || self.level_sizes.iter().any(|sizes| sizes.len() != planes) {
            return Err(Error::invalid("plane count"));
        }

        for (&stopping, sizes) in self.stopping_indices.iter().zip(&self.level_sizes) {
            if stopping as usize > sizes.len() {
                return Err(Error::invalid("stopping index"));
            }
        }

        if self.chunk_order.len() != levels * planes {
            return Err(Error::invalid("chunk count"));
        }

        if self.chunk_order.iter().any(|&level| level as usize >= levels) {
            return Err(Error::invalid("chunk order entry"));
        }

        if self.error_per_step.len() != self.chunk_order.len() {
            return Err(Error::invalid("error table length"));
        }

        Ok(())
    }

    /// Validate this header, then write it to the byte stream.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        self.validate()?;

        (self.dimensions.len() as u8).write(write)?;
        u32::write_slice(write, &self.dimensions)?;

        (self.level_error_bounds.len() as u8).write(write)?;
        T::write_slice(write, &self.level_error_bounds)?;

        for sizes in &self.level_sizes {
            u32::write_u32_sized_slice(write, sizes)?;
        }

        u8::write_slice(write, &self.stopping_indices)?;
        (self.negabinary as u8).write(write)?;

        let chunk_count = usize_to_u32(self.chunk_order.len(), "chunk count")?;
        if chunk_count > u16::MAX as u32 {
            return Err(Error::invalid("chunk count"));
        }

        (chunk_count as u16).write(write)?;
        u8::write_slice(write, &self.chunk_order)?;

        f64::write_u32_sized_slice(write, &self.error_per_step)?;
        Ok(())
    }

    /// Parse a header from the byte stream, validating its consistency.
    pub fn read(read: &mut impl Read) -> Result<Self> {
        let dimension_count = u8::read(read)? as usize;
        let dimensions: Dimensions = u32::read_vec(read, dimension_count)?.into_iter().collect();

        let level_count = u8::read(read)? as usize;
        let level_error_bounds = T::read_vec(read, level_count)?;

        let mut level_sizes = Vec::with_capacity(level_count);
        for _ in 0 .. level_count {
            level_sizes.push(u32::read_u32_sized_vec(read, T::MAX_BIT_PLANES as usize)?);
        }

        let stopping_indices = u8::read_vec(read, level_count)?;

        let negabinary = match u8::read(read)? {
            0 => false,
            1 => true,
            _ => return Err(Error::invalid("negabinary flag")),
        };

        let chunk_count = u16::read(read)? as usize;
        let chunk_order = u8::read_vec(read, chunk_count)?;

        let error_per_step = f64::read_u32_sized_vec(read, chunk_count)?;

        let metadata = Metadata {
            dimensions, level_error_bounds, level_sizes,
            stopping_indices, negabinary, chunk_order, error_per_step,
        };

        metadata.validate()?;
        Ok(metadata)
    }

    /// Serialize this header into a new byte vector.
    pub fn write_to_vec(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.byte_size());
        self.write(&mut bytes)?;

        debug_assert_eq!(bytes.len(), self.byte_size(), "declared byte size must match the layout");
        Ok(bytes)
    }
}
