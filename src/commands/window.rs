use crate::chrome::{ChromeSettings, WindowPreferences};
use crate::commands::config::{current_config, persist_config};
use crate::platform::TauriWindowChrome;
use std::sync::RwLock;
use tauri::{command, Runtime, Window};

lazy_static::lazy_static! {
    static ref CHROME: RwLock<ChromeSettings> = RwLock::new(ChromeSettings::new(current_config().window.preferences()));
}

/// Apply the stored preferences to a freshly created preview window.
pub fn attach_window<R: Runtime>(window: Window<R>) -> Result<(), String> {
    let setup = current_config().window.setup();
    let chrome = TauriWindowChrome::new(window);
    CHROME
        .read()
        .map_err(|e| e.to_string())?
        .attach(&chrome, &setup)
        .map_err(|e| e.to_string())
}

/// Adopt preferences written by the config commands.
pub(crate) fn sync_window_preferences(prefs: WindowPreferences) {
    let mut settings = match CHROME.write() {
        Ok(settings) => settings,
        Err(poisoned) => poisoned.into_inner(),
    };
    *settings = ChromeSettings::new(prefs);
}

fn store(prefs: WindowPreferences) {
    if let Err(e) = persist_config(|config| config.window.store_preferences(prefs)) {
        log::warn!("Failed to persist window preferences: {}", e);
    }
}

/// Keep the preview floating above other windows
#[command]
pub fn set_pinned_on_top<R: Runtime>(
    window: Window<R>,
    pinned: bool,
) -> Result<WindowPreferences, String> {
    let chrome = TauriWindowChrome::new(window);
    let mut settings = CHROME.write().map_err(|e| e.to_string())?;
    if settings.set_pinned(pinned, &chrome).map_err(|e| e.to_string())? {
        store(settings.preferences());
    }
    Ok(settings.preferences())
}

/// Show or hide the native title bar
#[command]
pub fn set_title_bar_visible<R: Runtime>(
    window: Window<R>,
    visible: bool,
) -> Result<WindowPreferences, String> {
    let chrome = TauriWindowChrome::new(window);
    let mut settings = CHROME.write().map_err(|e| e.to_string())?;
    if settings
        .set_title_bar_visible(visible, &chrome)
        .map_err(|e| e.to_string())?
    {
        store(settings.preferences());
    }
    Ok(settings.preferences())
}

/// Flip the preview horizontally
#[command]
pub fn set_mirrored(mirrored: bool) -> Result<WindowPreferences, String> {
    let mut settings = CHROME.write().map_err(|e| e.to_string())?;
    if settings.set_mirrored(mirrored) {
        store(settings.preferences());
    }
    Ok(settings.preferences())
}

/// Current window preferences
#[command]
pub fn get_window_preferences() -> Result<WindowPreferences, String> {
    Ok(CHROME.read().map_err(|e| e.to_string())?.preferences())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synced_preferences_are_reported() {
        let prefs = WindowPreferences {
            pinned_on_top: false,
            mirrored: true,
            show_title_bar: true,
        };
        sync_window_preferences(prefs);
        assert_eq!(get_window_preferences().unwrap(), prefs);

        sync_window_preferences(WindowPreferences::default());
        assert_eq!(get_window_preferences().unwrap(), WindowPreferences::default());
    }
}
