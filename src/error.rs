//! The error type shared by every manager in this crate.
use std::io::{Error as IoError, ErrorKind};

/// A boxed error from a decoder or host, so that the managers don't need to be generic over every collaborator's
/// error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = ResourceError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The byte source has nothing at this path.
    #[error("resource not found: {path}")]
    NotFound { path: String },

    #[error("i/o error while reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: IoError,
    },

    /// No decoder is registered for this extension.
    #[error("unsupported format: {path}")]
    UnsupportedFormat { path: String },

    /// The bytes were present, but the decoder rejected them.
    #[error("failed to decode {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: BoxError,
    },

    /// A logical audio name was used before it was mapped to a path.
    #[error("audio {0:?} was never registered")]
    NotRegistered(String),

    #[error("font not found: {0}")]
    FontNotFound(String),

    #[error("invalid face size: {0}")]
    InvalidFaceSize(f64),

    #[error("invalid loop: {0}")]
    InvalidLoop(String),

    /// The host runtime refused to build a player.
    #[error("host player error: {0}")]
    Host(#[source] BoxError),
}

impl ResourceError {
    /// Classify an error from a byte source, keeping "not found" distinct from every other kind of failure.
    pub(crate) fn from_io(path: &str, error: IoError) -> ResourceError {
        if error.kind() == ErrorKind::NotFound {
            ResourceError::NotFound {
                path: path.to_string(),
            }
        } else {
            ResourceError::Io {
                path: path.to_string(),
                source: error,
            }
        }
    }

    pub(crate) fn decode(key: &str, source: impl Into<BoxError>) -> ResourceError {
        ResourceError::Decode {
            key: key.to_string(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_is_classified() {
        let e = ResourceError::from_io("a/b.png", IoError::new(ErrorKind::NotFound, "gone"));
        assert!(matches!(e, ResourceError::NotFound { ref path } if path == "a/b.png"));

        let e = ResourceError::from_io("a/b.png", IoError::new(ErrorKind::PermissionDenied, "no"));
        assert!(matches!(e, ResourceError::Io { .. }));
    }
}
