use std::io;

use thiserror::Error;

/// Errors surfaced by the session and codec.
///
/// Protocol irregularities are never errors; they are logged and skipped.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport refused the payload because it is not open.
    #[error("transport is not open, payload was not sent")]
    NotSent,
    /// I/O failure underneath the codec.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
