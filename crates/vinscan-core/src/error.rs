// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for vinscan.

use std::time::Duration;

use thiserror::Error;

use crate::types::ErrorClass;

/// Top-level error type for all vinscan operations.
#[derive(Debug, Error)]
pub enum VinScanError {
    // -- Session-fatal errors --
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("engine initialization failed: {0}")]
    EngineInitializationFailed(String),

    #[error("recognition engine failure: {0}")]
    RecognitionEngineFailure(String),

    // -- Recoverable, absorbed inside the scan loop --
    #[error("recognition timed out after {}ms", .0.as_millis())]
    RecognitionTimeout(Duration),

    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error("registry lookup failed: {0}")]
    Registry(String),

    // -- Input / processing --
    #[error("not a valid VIN: {0:?}")]
    InvalidVin(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Lifecycle --
    #[error("scan session cancelled")]
    Cancelled,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl VinScanError {
    /// How the scan loop should treat this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::RecognitionTimeout(_) | Self::Recognition(_) | Self::Registry(_) => {
                ErrorClass::Recoverable
            }
            Self::CameraUnavailable(_) | Self::InvalidVin(_) => ErrorClass::UserAction,
            Self::Cancelled => ErrorClass::Cancelled,
            Self::EngineInitializationFailed(_)
            | Self::RecognitionEngineFailure(_)
            | Self::ImageError(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::PlatformUnavailable => ErrorClass::Fatal,
        }
    }

    /// Whether the scan loop absorbs this error and keeps going.
    pub fn is_recoverable(&self) -> bool {
        self.class() == ErrorClass::Recoverable
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VinScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_errors_are_recoverable() {
        assert!(VinScanError::RecognitionTimeout(Duration::from_secs(3)).is_recoverable());
        assert!(VinScanError::Recognition("blur".into()).is_recoverable());
        assert!(VinScanError::Registry("503".into()).is_recoverable());
    }

    #[test]
    fn session_errors_are_not_recoverable() {
        assert!(!VinScanError::CameraUnavailable("denied".into()).is_recoverable());
        assert!(!VinScanError::RecognitionEngineFailure("x".into()).is_recoverable());
        assert_eq!(VinScanError::Cancelled.class(), ErrorClass::Cancelled);
        assert_eq!(
            VinScanError::EngineInitializationFailed("model".into()).class(),
            ErrorClass::Fatal
        );
    }

    #[test]
    fn timeout_message_is_in_millis() {
        let err = VinScanError::RecognitionTimeout(Duration::from_millis(3000));
        assert_eq!(err.to_string(), "recognition timed out after 3000ms");
    }
}
