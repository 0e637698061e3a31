//! Error handling for the EEG preparation pipeline
//!
//! Every failure class maps to the smallest unit it can be isolated to
//! (file, chunk, or window); no variant is meant to abort a multi-subject
//! run.

use std::fmt;
use std::io;

/// Result type alias for pipeline operations
pub type EegResult<T> = Result<T, EegError>;

/// Error type covering every stage of the preparation pipeline
#[derive(Debug)]
#[non_exhaustive]
pub enum EegError {
    /// A source file could not be opened or parsed
    UnreadableSource {
        /// Path or identifier of the offending source
        path: String,
        /// Description of what went wrong
        reason: String,
    },

    /// Recording has fewer channels than the canonical count
    ChannelCountBelowCanonical {
        /// Channels found in the recording
        found: usize,
        /// Canonical channel count required of every window
        canonical: usize,
    },

    /// An array does not have the shape its consumer expects
    ShapeMismatch {
        /// Description of the expected vs. actual shape
        reason: String,
    },

    /// Invalid pipeline configuration
    InvalidConfig {
        /// Description of the configuration error
        message: String,
    },

    /// Signal data inconsistent with its declared metadata
    InvalidSignalData {
        /// Description of the inconsistency
        reason: String,
    },

    /// Underlying I/O failure
    Io(io::Error),
}

impl fmt::Display for EegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EegError::UnreadableSource { path, reason } => {
                write!(f, "Unreadable source '{}': {}", path, reason)
            }
            EegError::ChannelCountBelowCanonical { found, canonical } => {
                write!(
                    f,
                    "Channel count {} below canonical {}",
                    found, canonical
                )
            }
            EegError::ShapeMismatch { reason } => {
                write!(f, "Shape mismatch: {}", reason)
            }
            EegError::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
            EegError::InvalidSignalData { reason } => {
                write!(f, "Invalid signal data: {}", reason)
            }
            EegError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for EegError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EegError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EegError {
    fn from(e: io::Error) -> Self {
        EegError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = EegError::ChannelCountBelowCanonical {
            found: 18,
            canonical: 23,
        };
        let display = format!("{}", error);
        assert!(display.contains("18"));
        assert!(display.contains("23"));
    }

    #[test]
    fn test_shape_mismatch_display() {
        let error = EegError::ShapeMismatch {
            reason: "expected 230 values, got 229".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("229"));
        assert!(display.contains("230"));
    }

    #[test]
    fn test_io_source() {
        use std::error::Error;
        let error = EegError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(error.source().is_some());
    }
}
