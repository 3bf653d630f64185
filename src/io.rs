
//! Specialized binary input and output.
//! Uses the error handling for this crate and supports
//! reading and writing of exactly-sized little-endian vectors.

pub use ::std::io::{Read, Write};

use lebe::prelude::*;
use crate::error::{Error, Result, UnitResult, usize_to_u32};


/// Extension trait for primitive types like numbers and arrays.
/// Defines the byte-exact little-endian layout used by the metadata codec.
pub trait Data: Sized + Default + Clone {

    /// Number of bytes this would consume in a serialized stream.
    const BYTE_SIZE: usize = ::std::mem::size_of::<Self>();

    /// Read a value of type `Self`.
    fn read(read: &mut impl Read) -> Result<Self>;

    /// Read as many values of type `Self` as fit into the specified slice.
    /// If the slice cannot be filled completely, returns an `Invalid` error.
    fn read_slice(read: &mut impl Read, slice: &mut [Self]) -> UnitResult;

    /// Read as many values of type `Self` as specified with `data_size`.
    fn read_vec(read: &mut impl Read, data_size: usize) -> Result<Vec<Self>> {
        let mut vec = vec![Self::default(); data_size];
        Self::read_slice(read, &mut vec)?;
        Ok(vec)
    }

    /// Write this value to the stream.
    fn write(self, write: &mut impl Write) -> UnitResult;

    /// Write all values of that slice to the stream.
    fn write_slice(write: &mut impl Write, slice: &[Self]) -> UnitResult;

    /// Write the length of the slice as a little-endian `u32`, then the values.
    fn write_u32_sized_slice<W: Write>(write: &mut W, slice: &[Self]) -> UnitResult {
        usize_to_u32(slice.len(), "vector length")?.write(write)?;
        Self::write_slice(write, slice)
    }

    /// Read a `u32`, then read that many values of type `Self`.
    fn read_u32_sized_vec(read: &mut impl Read, soft_max: usize) -> Result<Vec<Self>> {
        let size = u32::read(read)? as usize;

        // refuse to allocate a fantastic amount of memory for a corrupted length prefix
        if size > soft_max {
            return Err(Error::invalid("vector length"));
        }

        Self::read_vec(read, size)
    }
}


macro_rules! implement_data_for_primitive {
    ($kind: ident) => {
        impl Data for $kind {
            fn read(read: &mut impl Read) -> Result<Self> {
                Ok(read.read_from_little_endian()?)
            }

            fn write(self, write: &mut impl Write) -> UnitResult {
                write.write_as_little_endian(&self)?;
                Ok(())
            }

            fn read_slice(read: &mut impl Read, slice: &mut [Self]) -> UnitResult {
                read.read_from_little_endian_into(slice)?;
                Ok(())
            }

            fn write_slice(write: &mut impl Write, slice: &[Self]) -> UnitResult {
                write.write_as_little_endian(slice)?;
                Ok(())
            }
        }
    };
}

implement_data_for_primitive!(u8);
implement_data_for_primitive!(u16);
implement_data_for_primitive!(u32);
implement_data_for_primitive!(u64);
implement_data_for_primitive!(f32);
implement_data_for_primitive!(f64);
