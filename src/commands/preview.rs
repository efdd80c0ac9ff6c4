use crate::controller::{CaptureController, ControllerState};
use crate::permissions::{status_guidance, AuthorizationState};
use crate::platform::SystemController;
use crate::session::CaptureBackend;
use std::sync::RwLock;
use std::time::Duration;
use tauri::command;

lazy_static::lazy_static! {
    static ref CONTROLLER: RwLock<Option<SystemController>> = RwLock::new(None);
}

/// What the preview view renders: the live preview, the permission prompt,
/// or a progress indicator, plus the optional error overlay.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PreviewStatus {
    pub authorization_state: AuthorizationState,
    pub show_preview: bool,
    pub guidance: String,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub configured: bool,
}

impl From<ControllerState> for PreviewStatus {
    fn from(state: ControllerState) -> Self {
        Self {
            authorization_state: state.authorization_state,
            show_preview: state.authorization_state == AuthorizationState::Authorized,
            guidance: status_guidance(state.authorization_state).to_string(),
            error_kind: state.error.as_ref().map(|e| e.kind().to_string()),
            error_message: state.error_message(),
            configured: state.configured,
        }
    }
}

/// Register the controller driving the preview commands.
pub fn install_controller(controller: SystemController) {
    match CONTROLLER.write() {
        Ok(mut slot) => *slot = Some(controller),
        Err(poisoned) => *poisoned.into_inner() = Some(controller),
    }
}

/// Longest the app waits on exit for the final stop
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Remove the registered controller and tear it down, waiting for the stop.
///
/// Must not be called from inside an async task.
pub fn shutdown_controller() {
    let controller = match CONTROLLER.write() {
        Ok(mut slot) => slot.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    if let Some(controller) = controller {
        if !teardown_blocking(&controller, SHUTDOWN_TIMEOUT) {
            log::warn!("Capture session did not confirm stop before exit");
        }
    }
}

/// Tear down on the Tauri runtime and block until the session has stopped.
///
/// Returns whether the stop was confirmed within `timeout`.
pub(crate) fn teardown_blocking<B: CaptureBackend>(
    controller: &CaptureController<B>,
    timeout: Duration,
) -> bool {
    let stopped = tauri::async_runtime::block_on(async {
        tokio::time::timeout(timeout, controller.teardown_and_wait()).await
    });
    matches!(stopped, Ok(false))
}

fn controller() -> Result<SystemController, String> {
    CONTROLLER
        .read()
        .map_err(|e| e.to_string())?
        .clone()
        .ok_or_else(|| "Camera controller not initialized".to_string())
}

/// Ask for camera access if needed; configures the session once granted
#[command]
pub async fn request_camera_access() -> Result<PreviewStatus, String> {
    let controller = controller()?;
    controller.request_access_if_needed();
    Ok(controller.state().into())
}

/// Re-read the permission after the user changed it in system settings
#[command]
pub async fn refresh_camera_authorization() -> Result<PreviewStatus, String> {
    let controller = controller()?;
    controller.refresh_authorization_status();
    Ok(controller.state().into())
}

/// Current preview state
#[command]
pub async fn get_preview_state() -> Result<PreviewStatus, String> {
    Ok(controller()?.state().into())
}
