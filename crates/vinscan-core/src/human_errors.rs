// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the people holding the phone at the
// windshield.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the UI presents it.

use crate::error::VinScanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Scanning keeps going; nothing to show.
    Transient,
    /// User must do something (grant camera access, retype the VIN).
    ActionRequired,
    /// Cannot be fixed by retrying or user action.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether starting a new scan is likely to help.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `VinScanError` into a `HumanError`.
pub fn humanize_error(err: &VinScanError) -> HumanError {
    match err {
        VinScanError::CameraUnavailable(detail) => humanize_camera_error(detail),

        VinScanError::EngineInitializationFailed(_) => HumanError {
            message: "The scanner couldn't start.".into(),
            suggestion: "Close the scanner and open it again. If it keeps failing, type the VIN in by hand.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        VinScanError::RecognitionEngineFailure(_) => HumanError {
            message: "The scanner stopped working.".into(),
            suggestion: "Start a new scan, or switch between text and barcode mode.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        VinScanError::RecognitionTimeout(_) | VinScanError::Recognition(_) => HumanError {
            message: "Still looking for the VIN...".into(),
            suggestion: "Hold the camera steady and make sure the VIN is inside the box.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        VinScanError::Registry(_) => HumanError {
            message: "We couldn't look up the vehicle details.".into(),
            suggestion: "The VIN is still valid. You can fill in make, model and year yourself.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        VinScanError::InvalidVin(input) => HumanError {
            message: "That doesn't look like a VIN.".into(),
            suggestion: format!(
                "A VIN has 17 letters and numbers and never uses I, O or Q. Check what you typed. ({input})"
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        VinScanError::ImageError(_) => HumanError {
            message: "The camera picture couldn't be read.".into(),
            suggestion: "Try again with better lighting.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        VinScanError::Cancelled => HumanError {
            message: "Scanning was stopped.".into(),
            suggestion: "Start a new scan whenever you're ready.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        VinScanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "A file couldn't be found.".into(),
                    suggestion: "Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to read that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        VinScanError::Serialization(_) => HumanError {
            message: "The scanner settings file is damaged.".into(),
            suggestion: "Delete the settings file to go back to the defaults.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        VinScanError::PlatformUnavailable => HumanError {
            message: "Scanning isn't available on this device.".into(),
            suggestion: "Type the VIN in by hand instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// Parse camera error details into human-readable messages.
fn humanize_camera_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("permission") || lower.contains("denied") || lower.contains("notallowed") {
        HumanError {
            message: "Camera unavailable — check permissions.".into(),
            suggestion: "Allow camera access for this app in your device settings, then start the scan again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("not found") || lower.contains("no camera") || lower.contains("no device") {
        HumanError {
            message: "No camera was found.".into(),
            suggestion: "Connect a camera or use a device that has one, or type the VIN in by hand.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("in use") || lower.contains("busy") || lower.contains("readable") {
        HumanError {
            message: "The camera is being used by another app.".into(),
            suggestion: "Close other apps that use the camera, then try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "Camera unavailable — check permissions.".into(),
            suggestion: format!("Make sure the camera is allowed and not in use, then try again. (Detail: {detail})"),
            retriable: true,
            severity: Severity::ActionRequired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_mentions_permissions() {
        let err = VinScanError::CameraUnavailable("NotAllowedError: permission denied".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.message.contains("check permissions"));
    }

    #[test]
    fn missing_camera_is_not_retriable() {
        let human = humanize_error(&VinScanError::CameraUnavailable("no camera found".into()));
        assert!(!human.retriable);
    }

    #[test]
    fn timeouts_are_transient() {
        let err = VinScanError::RecognitionTimeout(std::time::Duration::from_secs(3));
        assert_eq!(humanize_error(&err).severity, Severity::Transient);
    }

    #[test]
    fn invalid_vin_echoes_input() {
        let human = humanize_error(&VinScanError::InvalidVin("ABC".into()));
        assert!(human.suggestion.contains("ABC"));
        assert!(!human.retriable);
    }

    #[test]
    fn platform_unavailable_is_permanent() {
        let human = humanize_error(&VinScanError::PlatformUnavailable);
        assert_eq!(human.severity, Severity::Permanent);
    }
}
