use crate::errors::CameraError;
use crate::session::{CaptureBackend, DeviceDescriptor, SessionPreset};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
        Resolution,
    },
    CallbackCamera,
};
use std::sync::Mutex;

/// Device input produced by [`NokhwaBackend::make_input`]
pub struct NokhwaInput {
    device_id: String,
    camera: CallbackCamera,
}

#[derive(Debug, Default)]
struct SessionFlags {
    preset: SessionPreset,
    configuring: bool,
    running: bool,
    attached: Option<String>,
}

/// Capture session backed by nokhwa's native input backend
/// (AVFoundation, Media Foundation or V4L2).
///
/// Flags and the device live behind separate locks: the flag lock is never
/// held across a device call.
pub struct NokhwaBackend {
    flags: Mutex<SessionFlags>,
    camera: Mutex<Option<CallbackCamera>>,
}

impl NokhwaBackend {
    pub fn new() -> Self {
        Self {
            flags: Mutex::new(SessionFlags::default()),
            camera: Mutex::new(None),
        }
    }

    /// Id of the attached device, if any
    pub fn attached_device(&self) -> Option<String> {
        self.flags.lock().ok().and_then(|f| f.attached.clone())
    }

    fn requested_format(preset: SessionPreset) -> RequestedFormat<'static> {
        let format_type = match preset {
            SessionPreset::High => RequestedFormatType::AbsoluteHighestResolution,
            SessionPreset::Medium => RequestedFormatType::Closest(CameraFormat::new(
                Resolution::new(1280, 720),
                FrameFormat::MJPEG,
                30,
            )),
            SessionPreset::Low => RequestedFormatType::Closest(CameraFormat::new(
                Resolution::new(640, 480),
                FrameFormat::MJPEG,
                30,
            )),
        };
        RequestedFormat::new::<RgbFormat>(format_type)
    }

    fn camera_index(device_id: &str) -> CameraIndex {
        match device_id.parse::<u32>() {
            Ok(index) => CameraIndex::Index(index),
            Err(_) => CameraIndex::String(device_id.to_string()),
        }
    }
}

impl Default for NokhwaBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for NokhwaBackend {
    type Input = NokhwaInput;

    fn default_video_device(&self) -> Option<DeviceDescriptor> {
        let cameras = match query(ApiBackend::Auto) {
            Ok(cameras) => cameras,
            Err(e) => {
                log::warn!("Failed to query cameras: {}", e);
                return None;
            }
        };

        cameras.into_iter().next().map(|info| {
            DeviceDescriptor::new(info.index().to_string(), info.human_name())
                .with_description(info.description().to_string())
        })
    }

    fn make_input(&self, device: &DeviceDescriptor) -> Result<NokhwaInput, CameraError> {
        let preset = self
            .flags
            .lock()
            .map_err(|_| CameraError::InitializationError("Failed to lock session".to_string()))?
            .preset;

        let camera = CallbackCamera::new(
            Self::camera_index(&device.id),
            Self::requested_format(preset),
            |_| {},
        )
        .map_err(|e| CameraError::InitializationError(format!("Failed to open camera: {}", e)))?;

        Ok(NokhwaInput {
            device_id: device.id.clone(),
            camera,
        })
    }

    fn begin_configuration(&self) {
        if let Ok(mut flags) = self.flags.lock() {
            flags.configuring = true;
        }
    }

    fn set_preset(&self, preset: SessionPreset) {
        if let Ok(mut flags) = self.flags.lock() {
            flags.preset = preset;
        }
    }

    fn can_add_input(&self, _input: &NokhwaInput) -> bool {
        self.flags
            .lock()
            .map(|f| f.configuring && f.attached.is_none())
            .unwrap_or(false)
    }

    fn add_input(&self, input: NokhwaInput) {
        if let Ok(mut camera) = self.camera.lock() {
            *camera = Some(input.camera);
        }
        if let Ok(mut flags) = self.flags.lock() {
            flags.attached = Some(input.device_id);
        }
    }

    fn commit_configuration(&self) {
        if let Ok(mut flags) = self.flags.lock() {
            flags.configuring = false;
        }
    }

    fn start_running(&self) -> Result<(), CameraError> {
        {
            let mut camera = self
                .camera
                .lock()
                .map_err(|_| CameraError::StreamError("Failed to lock camera".to_string()))?;

            // An input-less session runs inert, as the platform session does
            if let Some(camera) = camera.as_mut() {
                camera.open_stream().map_err(|e| {
                    CameraError::StreamError(format!("Failed to start stream: {}", e))
                })?;
            }
        }

        if let Ok(mut flags) = self.flags.lock() {
            flags.running = true;
        }
        Ok(())
    }

    fn stop_running(&self) -> Result<(), CameraError> {
        if let Ok(mut flags) = self.flags.lock() {
            flags.running = false;
        }

        let mut camera = self
            .camera
            .lock()
            .map_err(|_| CameraError::StreamError("Failed to lock camera".to_string()))?;

        if let Some(camera) = camera.as_mut() {
            camera
                .stop_stream()
                .map_err(|e| CameraError::StreamError(format!("Failed to stop stream: {}", e)))?;
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.flags.lock().map(|f| f.running).unwrap_or(false)
    }
}

// Ensure the stream is closed when the last preview handle goes away
impl Drop for NokhwaBackend {
    fn drop(&mut self) {
        if let Ok(mut camera) = self.camera.lock() {
            if let Some(camera) = camera.as_mut() {
                let _ = camera.stop_stream();
            }
        }
    }
}

// The camera is only touched behind its mutex.
unsafe impl Send for NokhwaBackend {}
unsafe impl Sync for NokhwaBackend {}
unsafe impl Send for NokhwaInput {}
