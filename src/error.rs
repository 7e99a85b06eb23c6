use std::fmt;
use std::convert::TryFrom;

pub type Result<T> = std::result::Result<T, Error>;
pub type PassiveResult = Result<()>;
pub type UnitResult = Result<()>;

pub use std::io::Error as IoError;
pub use std::io::Result as IoResult;


#[derive(Debug)]
pub enum Error {
    NotSupported(String),
    Invalid(String),

    /// This error can also occur when reading invalid files,
    /// where the number of bytes to read does not match the input stream length.
    Io(IoError),
}


impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::Invalid(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::NotSupported(message.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotSupported(message) => write!(formatter, "not supported: {}", message),
            Error::Invalid(message) => write!(formatter, "invalid: {}", message),
            Error::Io(io_error) => write!(formatter, "io error: {}", io_error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(io_error) => Some(io_error),
            _ => None,
        }
    }
}


/// Enable using the `?` operator on io::Result
impl From<IoError> for Error {
    fn from(error: IoError) -> Self {
        Error::Io(error)
    }
}

/// Losslessly convert a `usize` offset or length to `i32`, as required by the file format.
/// Panics if the value does not fit, which should never happen for any image this crate can load.
pub fn usize_to_i32(value: usize) -> i32 {
    i32::try_from(value).expect("u32 exceeds i32 range, this should be checked before")
}

/// Fallibly narrow a `usize` count down to `u16`, as required by some attribute tables.
pub fn usize_to_u16(value: usize) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::invalid("u16 overflow"))
}

/// Fallibly convert a signed `i32` read from a file into a `usize`, rejecting negative values.
pub fn i32_to_usize(value: i32, context: impl Into<String>) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::invalid(context.into()))
}

/// Convert a `u64` offset read from a file into a `usize`.
/// Panics on 32-bit platforms if the offset does not fit, which should never
/// happen for any file this crate can address in memory.
pub fn u64_to_usize(value: u64) -> usize {
    usize::try_from(value).expect("u64 exceeds usize range on this platform")
}
