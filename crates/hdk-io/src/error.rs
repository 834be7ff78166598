//! Error types for plugin operations.
//!
//! Every fallible reader call returns [`IoResult`]; the variant says which
//! part of the contract failed.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Reader operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Path exists but is a directory or special file.
    #[error("could not open file \"{}\": not a regular file", .0.display())]
    NotRegularFile(PathBuf),

    /// The image library refused the file.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Native plane data type with no generic counterpart.
    #[error("unsupported pixel type: {0}")]
    UnsupportedPixelType(String),

    /// Subimage, mip level or row index outside the valid range.
    #[error("{what} {index} out of range (0..{limit})")]
    OutOfRange {
        /// Which index was rejected.
        what: &'static str,
        /// Requested index.
        index: usize,
        /// Exclusive upper bound.
        limit: usize,
    },

    /// No file is open.
    #[error("no file is open")]
    NotOpen,

    /// A read was attempted before any subimage was selected.
    #[error("no subimage selected")]
    NoSubimage,

    /// Caller buffer cannot hold the requested data.
    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall {
        /// Required size.
        needed: usize,
        /// Provided size.
        actual: usize,
    },

    /// Decoding error reported by the image library.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Unsupported operation.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

/// Result type for reader operations.
pub type IoResult<T> = Result<T, IoError>;
