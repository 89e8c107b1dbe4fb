// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture session

use crate::backends::camera::BackendError;
use crate::backends::permissions::PermissionKind;
use std::fmt;

/// Result type alias for session lifecycle operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type alias for single device-configuration changes
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Session-level errors, surfaced through the snapshot's error field
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Camera or microphone access denied or restricted
    PermissionDenied { kind: PermissionKind },
    /// A required device is missing
    DeviceUnavailable(String),
    /// The session rejected an input
    InputAttachFailed(String),
    /// The session rejected an output
    OutputAttachFailed(String),
    /// The capture session failed to start
    SessionStartFailed(String),
    /// Photo or recording failure
    Capture(CaptureError),
}

/// Errors of a single device-configuration change
///
/// These never interrupt the running session; the snapshot keeps its prior value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Requested frame rate lies outside `[15, device max]`
    InvalidFrameRate { requested: u32, max: u32 },
    /// Configuration lock could not be acquired
    DeviceBusy(String),
    /// No active device (session not set up)
    NotRunning,
    /// A camera or output swap is in flight
    TransitionInProgress,
    /// The device rejected the change
    Backend(BackendError),
}

/// Photo capture and recording errors
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// Hardware capture failed
    Failed(String),
    /// Recording could not be started
    RecordingStartFailed(String),
    /// Recording finished with an error
    RecordingFailed(String),
}

/// Errors reading or writing the preferences file
#[derive(Debug)]
pub enum ConfigFileError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// No configuration directory on this platform
    NoConfigDir,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::PermissionDenied { kind } => write!(f, "Permission denied: {}", kind),
            SessionError::DeviceUnavailable(msg) => write!(f, "Device unavailable: {}", msg),
            SessionError::InputAttachFailed(msg) => write!(f, "Cannot attach input: {}", msg),
            SessionError::OutputAttachFailed(msg) => write!(f, "Cannot attach output: {}", msg),
            SessionError::SessionStartFailed(msg) => write!(f, "Session failed to start: {}", msg),
            SessionError::Capture(e) => write!(f, "Capture error: {}", e),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::InvalidFrameRate { requested, max } => {
                write!(f, "Invalid frame rate {} (supported: 15-{})", requested, max)
            }
            ConfigurationError::DeviceBusy(msg) => write!(f, "Device busy: {}", msg),
            ConfigurationError::NotRunning => write!(f, "Session is not running"),
            ConfigurationError::TransitionInProgress => write!(f, "Reconfiguration in progress"),
            ConfigurationError::Backend(e) => write!(f, "Device error: {}", e),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Failed(msg) => write!(f, "Capture failed: {}", msg),
            CaptureError::RecordingStartFailed(msg) => {
                write!(f, "Failed to start recording: {}", msg)
            }
            CaptureError::RecordingFailed(msg) => write!(f, "Recording failed: {}", msg),
        }
    }
}

impl fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFileError::Io(e) => write!(f, "Config I/O error: {}", e),
            ConfigFileError::Parse(e) => write!(f, "Config parse error: {}", e),
            ConfigFileError::NoConfigDir => write!(f, "No configuration directory available"),
        }
    }
}

impl std::error::Error for SessionError {}
impl std::error::Error for ConfigurationError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for ConfigFileError {}

impl From<CaptureError> for SessionError {
    fn from(err: CaptureError) -> Self {
        SessionError::Capture(err)
    }
}

impl From<BackendError> for ConfigurationError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::DeviceBusy(msg) => ConfigurationError::DeviceBusy(msg),
            other => ConfigurationError::Backend(other),
        }
    }
}

impl From<std::io::Error> for ConfigFileError {
    fn from(err: std::io::Error) -> Self {
        ConfigFileError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigFileError {
    fn from(err: serde_json::Error) -> Self {
        ConfigFileError::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_backend_error_maps_to_device_busy() {
        let err: ConfigurationError = BackendError::DeviceBusy("locked".into()).into();
        assert_eq!(err, ConfigurationError::DeviceBusy("locked".into()));

        let err: ConfigurationError = BackendError::Other("boom".into()).into();
        assert!(matches!(err, ConfigurationError::Backend(_)));
    }

    #[test]
    fn test_display_mentions_permission_kind() {
        let err = SessionError::PermissionDenied {
            kind: PermissionKind::Microphone,
        };
        assert_eq!(err.to_string(), "Permission denied: microphone");
    }
}
