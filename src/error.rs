
//! Error type definitions.

use std::borrow::Cow;
use std::convert::TryFrom;
use std::fmt;

/// A result that may contain an error from this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A result that, if ok, contains nothing, and otherwise contains an error from this crate.
pub type UnitResult = Result<()>;

/// An io error.
pub use std::io::Error as IoError;

/// An io result.
pub use std::io::Result as IoResult;


/// An error that may happen while refactoring or reconstructing an array.
/// Distinguishes invalid arguments, exhausted resources,
/// back-end io failures, and violated internal invariants.
#[derive(Debug)]
pub enum Error {

    /// The caller supplied an argument the pipeline cannot work with,
    /// for example empty dimensions, a too deep target level,
    /// a plane count exceeding the element precision, or malformed metadata bytes.
    Invalid(Cow<'static, str>),

    /// An allocation or size limit was exceeded,
    /// for example a packed stream larger than the 32 bit byte limit
    /// or an output buffer smaller than the refactored data.
    Resource(Cow<'static, str>),

    /// A back-end writer or retriever failed.
    /// The underlying io error is surfaced verbatim.
    Io(IoError),

    /// An algorithm invariant did not hold, for example a priority key
    /// that is not a number. This indicates a bug in this crate, not a user error.
    Inconsistent(Cow<'static, str>),
}


impl Error {

    /// Create an error of the variant `Invalid`.
    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Invalid(message.into())
    }

    /// Create an error of the variant `Resource`.
    pub(crate) fn resource(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Resource(message.into())
    }

    /// Create an error of the variant `Inconsistent`.
    pub(crate) fn inconsistent(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Inconsistent(message.into())
    }
}


/// Enable using the `?` operator on `io::Result`.
impl From<IoError> for Error {
    fn from(error: IoError) -> Self {
        Error::Io(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(error) => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Invalid(message) => write!(formatter, "invalid: {}", message),
            Error::Resource(message) => write!(formatter, "resources exhausted: {}", message),
            Error::Io(error) => write!(formatter, "io error: {}", error),
            Error::Inconsistent(message) => write!(formatter, "internal invariant violated: {}", message),
        }
    }
}


/// Convert a `usize` to `u32`, returning a resource error on overflow.
pub(crate) fn usize_to_u32(value: usize, name: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::resource(name))
}

/// Convert a `u64` to `u32`, returning a resource error on overflow.
pub(crate) fn u64_to_u32(value: u64, name: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::resource(name))
}
