
//! Lossless compression of encoded bit planes.
//!
//! Planes are compressed front to back, up to a per-level stopping plane.
//! Planes at or beyond the stopping plane stay raw: the low-significance
//! planes of floating-point data are close to random bits, where a codec
//! only adds overhead.

use miniz_oxide::deflate::compress_to_vec_zlib;
use zune_inflate::DeflateDecoder;

use crate::error::{Error, Result, UnitResult, usize_to_u32};


/// How hard the deflate implementation tries. Matches the zlib default.
const COMPRESSION_LEVEL: u8 = 6;


/// Compresses the planes of one level in place and decides the stopping plane.
/// Reconstruction must invert with the same stopping plane, which the
/// metadata records per level.
pub trait LevelCompressor {

    /// Replace `planes[j]` and `sizes[j]` with the compressed form
    /// for every `j` below the returned stopping index.
    fn compress_level(&self, planes: &mut [Vec<u8>], sizes: &mut [u32]) -> Result<u8>;

    /// Undo `compress_level` on the planes that are present.
    /// A retrieved prefix may hold fewer planes than the stopping index.
    fn decompress_level(&self, planes: &mut [Vec<u8>], stopping_index: u8) -> UnitResult;
}


fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    DeflateDecoder::new(compressed)
        .decode_zlib()
        .map_err(|error| Error::invalid(format!("compressed plane ({:?})", error)))
}

fn inflate_planes(planes: &mut [Vec<u8>], stopping_index: u8) -> UnitResult {
    let compressed_count = (stopping_index as usize).min(planes.len());

    for plane in &mut planes[.. compressed_count] {
        *plane = inflate(plane)?;
    }

    Ok(())
}


/// Stores every plane raw. The stopping index is always zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLevelCompressor;

impl LevelCompressor for NullLevelCompressor {

    fn compress_level(&self, _planes: &mut [Vec<u8>], _sizes: &mut [u32]) -> Result<u8> {
        Ok(0)
    }

    fn decompress_level(&self, _planes: &mut [Vec<u8>], stopping_index: u8) -> UnitResult {
        if stopping_index != 0 {
            return Err(Error::invalid("stopping index of uncompressed level"));
        }

        Ok(())
    }
}


/// Compresses every plane with zlib, whether it shrinks or not.
/// The stopping index is always the plane count.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeflateLevelCompressor;

impl LevelCompressor for DeflateLevelCompressor {

    fn compress_level(&self, planes: &mut [Vec<u8>], sizes: &mut [u32]) -> Result<u8> {
        for (plane, size) in planes.iter_mut().zip(sizes.iter_mut()) {
            *plane = compress_to_vec_zlib(plane, COMPRESSION_LEVEL);
            *size = usize_to_u32(plane.len(), "compressed plane size")?;
        }

        Ok(planes.len() as u8)
    }

    fn decompress_level(&self, planes: &mut [Vec<u8>], stopping_index: u8) -> UnitResult {
        inflate_planes(planes, stopping_index)
    }
}


/// Compresses planes front to back and stops at the first plane
/// that zlib cannot shrink. High planes are sparse and compress well,
/// low planes approach noise; this cuts the codec off where it stops paying.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveLevelCompressor;

impl LevelCompressor for AdaptiveLevelCompressor {

    fn compress_level(&self, planes: &mut [Vec<u8>], sizes: &mut [u32]) -> Result<u8> {
        for (index, (plane, size)) in planes.iter_mut().zip(sizes.iter_mut()).enumerate() {
            let compressed = compress_to_vec_zlib(plane, COMPRESSION_LEVEL);

            if compressed.len() >= plane.len() {
                return Ok(index as u8);
            }

            *plane = compressed;
            *size = usize_to_u32(plane.len(), "compressed plane size")?;
        }

        Ok(planes.len() as u8)
    }

    fn decompress_level(&self, planes: &mut [Vec<u8>], stopping_index: u8) -> UnitResult {
        inflate_planes(planes, stopping_index)
    }
}
