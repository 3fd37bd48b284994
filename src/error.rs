//! Unified error type.

use std::fmt;

/// Boxed error produced by an arbitrary `http_body::Body` implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by tollgate's fallible operations.
///
/// Rejections (401, 403, 500 from a failed check, etc.) are expressed as
/// HTTP [`Response`](crate::Response) values, not as `Error`s. This type
/// surfaces infrastructure failures only: today, an inbound body that could
/// not be read to completion.
#[derive(Debug)]
pub enum Error {
    Body(BoxError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body(e) => write!(f, "body: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Body(e) => Some(e.as_ref()),
        }
    }
}

impl From<BoxError> for Error {
    fn from(e: BoxError) -> Self {
        Self::Body(e)
    }
}
