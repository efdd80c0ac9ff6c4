//! PingCamera: a floating camera preview for Tauri applications
//!
//! The crate owns the capture-session lifecycle behind a small always-on-top
//! preview window: camera authorization, device acquisition, session
//! configuration, and start/stop orchestration between the UI-facing
//! controller loop and a background session worker.
//!
//! # Features
//! - Single-prompt camera authorization with out-of-band refresh
//! - Default-device attach inside a configuration transaction
//! - Serialized, idempotent session start/stop off the UI thread
//! - One observable state (authorization + last error) for the UI
//! - Pin-on-top, mirroring and title-bar toggles with persisted preferences
//!
//! # Usage
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(pingcamera::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! Without Tauri, drive a [`CaptureController`] directly:
//! ```rust,ignore
//! let controller = CaptureController::spawn(
//!     Arc::new(SystemPermissions::new()),
//!     Arc::new(NokhwaBackend::new()),
//!     SessionPreset::High,
//! )?;
//! controller.request_access_if_needed();
//! ```
pub mod chrome;
pub mod commands;
pub mod config;
pub mod controller;
pub mod errors;
pub mod permissions;
pub mod platform;
pub mod session;

// Testing utilities - deterministic fakes for the OS ports
pub mod testing;

// Re-exports for convenience
pub use chrome::{ChromeSettings, WindowChrome, WindowPreferences};
pub use config::PingCameraConfig;
pub use controller::{CaptureController, ControllerLoop, ControllerState};
pub use errors::{CameraError, CaptureError};
pub use permissions::{AuthorizationGate, AuthorizationState, PermissionPort, SystemPermissions};
pub use platform::{NokhwaBackend, SystemController};
pub use session::{CaptureBackend, DeviceSession, PreviewHandle, SessionPreset};

use tauri::{
    plugin::{Builder, TauriPlugin},
    RunEvent, Runtime,
};

/// Label of the window the preview lives in
pub const PREVIEW_WINDOW_LABEL: &str = "main";

/// Initialize the PingCamera plugin with all commands
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("pingcamera")
        .invoke_handler(tauri::generate_handler![
            // Preview lifecycle commands
            commands::preview::request_camera_access,
            commands::preview::refresh_camera_authorization,
            commands::preview::get_preview_state,
            // Permission commands
            commands::permissions::check_camera_permission_status,
            commands::permissions::get_permission_status_string,
            commands::permissions::get_privacy_settings_url,
            // Window commands
            commands::window::set_pinned_on_top,
            commands::window::set_mirrored,
            commands::window::set_title_bar_visible,
            commands::window::get_window_preferences,
            // Configuration commands
            commands::config::get_config,
            commands::config::update_config,
            commands::config::reset_config,
        ])
        .setup(|_app, _api| {
            let config = commands::config::current_config();
            let (controller, run_loop) = platform::system_controller(config.session.preset)?;
            tauri::async_runtime::spawn(run_loop.run());
            controller.request_access_if_needed();
            commands::preview::install_controller(controller);
            log::info!("PingCamera plugin initialized");
            Ok(())
        })
        .on_window_ready(|window| {
            if window.label() != PREVIEW_WINDOW_LABEL {
                return;
            }
            if let Err(e) = commands::window::attach_window(window) {
                log::warn!("Failed to configure preview window: {}", e);
            }
        })
        .on_event(|_app, event| {
            if let RunEvent::Exit = event {
                commands::preview::shutdown_controller();
            }
        })
        .build()
}

/// Initialize logging for the preview core
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "pingcamera=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        platform: std::env::consts::OS.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub platform: String,
}
