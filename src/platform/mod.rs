//! Platform implementations of the capture and window ports

pub mod nokhwa_backend;
pub mod window;

pub use nokhwa_backend::{NokhwaBackend, NokhwaInput};
pub use window::TauriWindowChrome;

use crate::controller::CaptureController;
use crate::errors::CameraError;
use crate::permissions::SystemPermissions;
use crate::session::SessionPreset;
use std::sync::Arc;

/// Controller wired to the operating system's permission and capture APIs
pub type SystemController = CaptureController<NokhwaBackend>;

/// Build a controller over the system ports; the returned loop must be spawned.
pub fn system_controller(
    preset: SessionPreset,
) -> Result<(SystemController, crate::controller::ControllerLoop<NokhwaBackend>), CameraError> {
    CaptureController::new(
        Arc::new(SystemPermissions::new()),
        Arc::new(NokhwaBackend::new()),
        preset,
    )
}
