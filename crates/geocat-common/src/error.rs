//! Error types for Geocat
//!
//! This module defines the common error types used throughout the store.

use crate::types::Kind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Common result type for Geocat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by a record codec
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{format} encode failed: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    #[error("{format} decode failed: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },
}

/// Common error type for Geocat
#[derive(Debug, Error)]
pub enum Error {
    // Persistence errors
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    // Key errors
    #[error("duplicate key in {kind}: {key}")]
    DuplicateKey { kind: Kind, key: String },

    #[error("unique index '{index}' of {kind} already holds {key}")]
    UniqueViolation {
        kind: Kind,
        index: &'static str,
        key: String,
    },

    #[error("invalid key for {kind}: {key:?}")]
    InvalidKey { kind: Kind, key: String },

    #[error("id space of {kind} is exhausted")]
    IdExhausted { kind: Kind },

    // Internal errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if this error comes from the filesystem
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Check if this error is a key or index collision
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. } | Self::UniqueViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conflict() {
        let dup = Error::DuplicateKey {
            kind: Kind::Tasks,
            key: "t-1".into(),
        };
        assert!(dup.is_conflict());
        assert!(!dup.is_io());

        let unique = Error::UniqueViolation {
            kind: Kind::Users,
            index: "login",
            key: "admin".into(),
        };
        assert!(unique.is_conflict());

        let exhausted = Error::IdExhausted { kind: Kind::Data };
        assert!(!exhausted.is_conflict());
        assert_eq!(exhausted.to_string(), "id space of datas is exhausted");
    }

    #[test]
    fn test_error_io_display() {
        let err = Error::io(
            "/tmp/sensors/1.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_io());
        assert!(err.to_string().contains("/tmp/sensors/1.json"));
    }

    #[test]
    fn test_codec_error_from() {
        let err: Error = CodecError::Decode {
            format: "json",
            message: "eof".into(),
        }
        .into();
        assert_eq!(err.to_string(), "codec error: json decode failed: eof");
    }
}
