#[cfg(test)]
mod error_tests {
    use pingcamera::errors::{CameraError, CaptureError};
    use std::error::Error;

    #[test]
    fn test_camera_error_initialization() {
        let error = CameraError::InitializationError("Test init error".to_string());
        assert!(error.to_string().contains("Camera initialization error"));
        assert!(error.to_string().contains("Test init error"));
    }

    #[test]
    fn test_camera_error_stream() {
        let error = CameraError::StreamError("Stream failed".to_string());
        assert_eq!(error.to_string(), "Stream error: Stream failed");
    }

    #[test]
    fn test_camera_error_debug_format() {
        let error = CameraError::InitializationError("Debug test".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("InitializationError"));
        assert!(debug_str.contains("Debug test"));
    }

    #[test]
    fn test_camera_error_implements_error_trait() {
        let error = CameraError::PermissionDenied("Error trait test".to_string());
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
    }

    #[test]
    fn test_capture_error_messages() {
        assert_eq!(
            CaptureError::PermissionDenied.to_string(),
            "Camera permission is required to show the preview."
        );
        assert_eq!(
            CaptureError::PermissionRestricted.to_string(),
            "Camera access is restricted by the system."
        );
        assert_eq!(
            CaptureError::NoDeviceFound.to_string(),
            "No available camera was found."
        );
    }

    #[test]
    fn test_capture_error_serializes() {
        let error = CaptureError::CannotAttachInput("device busy".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("CannotAttachInput"));
        let back: CaptureError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, error);
    }

    #[test]
    fn test_capture_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CaptureError>();
        assert_send_sync::<CameraError>();
    }
}
