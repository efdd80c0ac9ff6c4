use std::fmt;

/// Failures raised by platform backends and the configuration layer.
#[derive(Debug)]
pub enum CameraError {
    InitializationError(String),
    PermissionDenied(String),
    CaptureError(String),
    StreamError(String),
    ConfigError(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CameraError::InitializationError(msg) => write!(f, "Camera initialization error: {}", msg),
            CameraError::PermissionDenied(msg) => write!(f, "Permission denied error: {}", msg),
            CameraError::CaptureError(msg) => write!(f, "Capture error: {}", msg),
            CameraError::StreamError(msg) => write!(f, "Stream error: {}", msg),
            CameraError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CameraError {}

/// The user-facing failure taxonomy of the capture lifecycle.
///
/// Every variant is recoverable by user action (granting access, plugging in
/// a camera, closing the app holding it). The controller is the only place
/// that turns one of these into the visible message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum CaptureError {
    #[error("Camera permission is required to show the preview.")]
    PermissionDenied,
    #[error("Camera access is restricted by the system.")]
    PermissionRestricted,
    #[error("No available camera was found.")]
    NoDeviceFound,
    #[error("Camera initialization failed: {0}")]
    CannotAttachInput(String),
}

impl CaptureError {
    /// Stable identifier for the presentation layer.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied => "permission_denied",
            CaptureError::PermissionRestricted => "permission_restricted",
            CaptureError::NoDeviceFound => "no_device_found",
            CaptureError::CannotAttachInput(_) => "cannot_attach_input",
        }
    }
}
