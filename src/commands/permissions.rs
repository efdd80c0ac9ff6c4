use crate::permissions::{check_permission_detailed, privacy_settings_url, PermissionInfo};
use tauri::command;

/// Check camera permission status
#[command]
pub async fn check_camera_permission_status() -> Result<PermissionInfo, String> {
    log::debug!("Checking camera permission status");
    Ok(check_permission_detailed())
}

/// Get human-readable permission status string
#[command]
pub fn get_permission_status_string() -> String {
    check_permission_detailed().status.to_string()
}

/// Deep link for the permission prompt's "open settings" button
#[command]
pub fn get_privacy_settings_url() -> Option<String> {
    privacy_settings_url().map(str::to_string)
}
