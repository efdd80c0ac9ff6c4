use crate::chrome::{WindowChrome, WindowSetup};
use crate::errors::CameraError;
use tauri::{LogicalSize, Runtime, Window};

/// Applies chrome changes to a Tauri window
pub struct TauriWindowChrome<R: Runtime> {
    window: Window<R>,
}

impl<R: Runtime> TauriWindowChrome<R> {
    pub fn new(window: Window<R>) -> Self {
        Self { window }
    }
}

fn window_error(action: &str, e: tauri::Error) -> CameraError {
    CameraError::InitializationError(format!("Failed to {}: {}", action, e))
}

impl<R: Runtime> WindowChrome for TauriWindowChrome<R> {
    fn configure(&self, setup: &WindowSetup) -> Result<(), CameraError> {
        self.window
            .set_title(&setup.title)
            .map_err(|e| window_error("set window title", e))?;
        self.window
            .set_min_size(Some(LogicalSize::new(setup.min_width, setup.min_height)))
            .map_err(|e| window_error("set minimum window size", e))
    }

    fn apply_pinned(&self, pinned: bool) -> Result<(), CameraError> {
        self.window
            .set_always_on_top(pinned)
            .map_err(|e| window_error("change window level", e))
    }

    fn apply_title_bar(&self, visible: bool) -> Result<(), CameraError> {
        self.window
            .set_decorations(visible)
            .map_err(|e| window_error("toggle title bar", e))
    }
}
