
//! Progressive, error-bounded refactoring of scientific floating-point arrays.
//!
//! An n-dimensional array is decomposed into a hierarchy of resolution
//! levels, every level is sliced into bit planes, the planes are losslessly
//! compressed, and all resulting chunks are reordered globally by error
//! reduction per byte. The packed stream that falls out of this has one
//! property worth the trouble: for any error tolerance, the cheapest
//! sufficient subset of the data is a single prefix of the stream.
//!
//! A self-describing header carries everything a reader needs to pick its
//! prefix, fetch exactly those bytes and invert the pipeline.
//!
//! ```
//! use mdr::prelude::*;
//!
//! let data = vec![0.5_f32; 16 * 16];
//!
//! let refactor = Refactor::new(
//!     HierarchicalDecomposer, DirectInterleaver,
//!     NegaBinaryEncoder, AdaptiveLevelCompressor, MaxErrorEstimator,
//! );
//!
//! let (metadata, stream) = refactor.refactor(&data, &[16, 16], 2, 12)?;
//!
//! let reconstruct = Reconstructor::new(
//!     HierarchicalDecomposer, DirectInterleaver,
//!     NegaBinaryEncoder, AdaptiveLevelCompressor,
//! );
//!
//! let approximation = reconstruct.reconstruct(&metadata, &stream, 1e-3)?;
//! assert_eq!(approximation.len(), data.len());
//! # Ok::<(), mdr::error::Error>(())
//! ```

#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused_extern_crates,
    unused,

    missing_copy_implementations,
    missing_debug_implementations,

    clippy::all,
    clippy::pedantic,
)]

#![deny(
    unused_must_use,
    trivial_numeric_casts,
)]

#![forbid(unsafe_code)]
#![warn(missing_docs)]


pub mod io; // public to allow for custom byte parsing of the header

pub mod math;
pub mod error;
pub mod element;
pub mod meta;
pub mod transform;
pub mod encode;
pub mod compress;
pub mod estimate;
pub mod order;
pub mod refactor;
pub mod reconstruct;
pub mod backend;


/// Re-exports of everything commonly required
/// for refactoring and reconstructing an array.
pub mod prelude {

    // main exports
    pub use crate::refactor::Refactor;
    pub use crate::reconstruct::{Reconstructor, ProgressiveReader};
    pub use crate::meta::Metadata;

    // collaborators
    pub use crate::transform::{Decomposer, HierarchicalDecomposer};
    pub use crate::transform::interleave::{Interleaver, DirectInterleaver};
    pub use crate::encode::{BitPlaneEncoder, SignMagnitudeEncoder, NegaBinaryEncoder};
    pub use crate::compress::{
        LevelCompressor, NullLevelCompressor, DeflateLevelCompressor, AdaptiveLevelCompressor,
    };
    pub use crate::estimate::{
        ErrorEstimator, ErrorMetric, MaxErrorEstimator, SquaredErrorEstimator, MaxErrorCollector,
    };

    // back-ends
    pub use crate::backend::{
        Writer, Retriever, FileWriter, FileRetriever, MemoryWriter, MemoryRetriever,
    };

    // secondary data types
    pub use crate::element::Element;
    pub use crate::error::{Error, Result};
}
