use crate::commands::window::sync_window_preferences;
use crate::config::PingCameraConfig;
use std::sync::{Arc, RwLock};
use tauri::command;

lazy_static::lazy_static! {
    pub(crate) static ref GLOBAL_CONFIG: Arc<RwLock<PingCameraConfig>> = Arc::new(RwLock::new(PingCameraConfig::load_or_default()));
}

/// Snapshot of the current configuration
pub fn current_config() -> PingCameraConfig {
    match GLOBAL_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Apply `update` to the global configuration and persist the result.
pub(crate) fn persist_config<F>(update: F) -> Result<PingCameraConfig, String>
where
    F: FnOnce(&mut PingCameraConfig),
{
    let updated = {
        let mut config = GLOBAL_CONFIG
            .write()
            .map_err(|e| format!("Failed to write config: {}", e))?;
        update(&mut config);
        config.clone()
    };

    updated
        .save_to_file(PingCameraConfig::default_path())
        .map_err(|e| e.to_string())?;

    Ok(updated)
}

/// Get the current configuration
#[command]
pub async fn get_config() -> Result<PingCameraConfig, String> {
    let config = GLOBAL_CONFIG.read().map_err(|e| e.to_string())?;
    Ok(config.clone())
}

/// Update configuration
///
/// A changed session preset takes effect on the next launch.
#[command]
pub async fn update_config(new_config: PingCameraConfig) -> Result<(), String> {
    new_config.validate()?;
    let result = persist_config(|config| *config = new_config);
    sync_window_preferences(current_config().window.preferences());
    result.map(|_| ())
}

/// Reset configuration to defaults
#[command]
pub async fn reset_config() -> Result<PingCameraConfig, String> {
    let result = persist_config(|config| *config = PingCameraConfig::default());
    sync_window_preferences(current_config().window.preferences());
    result
}
