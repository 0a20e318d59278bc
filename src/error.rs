// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

//! Crate-wide error type and `Result` alias

use std::error;
use std::fmt;

/// Alias of [std::result::Result] with the error type fixed to [Error]
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of engine failures, used by callers to pick a
/// retry-vs-abort policy
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A cryptographic backend was unavailable or failed outright
    Provider,
    /// Key material or an encoded key object was truncated or inconsistent
    MalformedKey,
    /// A generated or supplied key failed an internal consistency check
    Consistency,
    /// Any other error, see the nested origin
    Nested,
}

/// The error type returned by all fallible operations in this crate
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    origin: Option<Box<dyn error::Error + Send + Sync>>,
    errmsg: Option<String>,
}

impl Error {
    /// A provider failure with a static description
    pub fn provider(errmsg: &str) -> Error {
        Error {
            kind: ErrorKind::Provider,
            origin: None,
            errmsg: Some(errmsg.to_string()),
        }
    }

    /// A provider failure wrapping the backend error
    pub fn provider_from_error<E>(error: E) -> Error
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Error {
            kind: ErrorKind::Provider,
            origin: Some(error.into()),
            errmsg: None,
        }
    }

    /// Malformed or truncated key material
    pub fn malformed(errmsg: &str) -> Error {
        Error {
            kind: ErrorKind::MalformedKey,
            origin: None,
            errmsg: Some(errmsg.to_string()),
        }
    }

    /// A failed internal consistency check
    pub fn consistency(errmsg: &str) -> Error {
        Error {
            kind: ErrorKind::Consistency,
            origin: None,
            errmsg: Some(errmsg.to_string()),
        }
    }

    /// Wraps an arbitrary error from a lower layer
    pub fn other_error<E>(error: E) -> Error
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Error {
            kind: ErrorKind::Nested,
            origin: Some(error.into()),
            errmsg: None,
        }
    }

    /// Returns the error classification
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self.kind {
            ErrorKind::Provider => "provider error",
            ErrorKind::MalformedKey => "malformed key material",
            ErrorKind::Consistency => "consistency check failed",
            ErrorKind::Nested => "error",
        };
        if let Some(ref e) = self.errmsg {
            write!(f, "{}: {}", label, e)
        } else if let Some(ref e) = self.origin {
            write!(f, "{}: {}", label, e)
        } else {
            write!(f, "{}", label)
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.origin {
            Some(ref e) => Some(e.as_ref()),
            None => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::other_error(error)
    }
}
