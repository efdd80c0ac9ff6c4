//! Window chrome preferences: pinning, mirroring and title-bar visibility.
//!
//! The capture lifecycle never depends on these; they only drive the
//! window the preview lives in.

use crate::errors::CameraError;

/// Runtime toggles exposed by the preview's control bar and menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WindowPreferences {
    pub pinned_on_top: bool,
    /// Applied by the preview surface, not the window
    pub mirrored: bool,
    pub show_title_bar: bool,
}

impl Default for WindowPreferences {
    fn default() -> Self {
        Self {
            pinned_on_top: true,
            mirrored: false,
            show_title_bar: false,
        }
    }
}

/// One-time window setup applied when a window is attached
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSetup {
    pub title: String,
    pub min_width: f64,
    pub min_height: f64,
}

/// OS-window collaborator receiving chrome changes.
pub trait WindowChrome {
    fn configure(&self, setup: &WindowSetup) -> Result<(), CameraError>;
    fn apply_pinned(&self, pinned: bool) -> Result<(), CameraError>;
    fn apply_title_bar(&self, visible: bool) -> Result<(), CameraError>;
}

/// Owner of the chrome preferences. Notifies the window only on real changes.
#[derive(Debug, Clone, Default)]
pub struct ChromeSettings {
    prefs: WindowPreferences,
}

impl ChromeSettings {
    pub fn new(prefs: WindowPreferences) -> Self {
        Self { prefs }
    }

    pub fn preferences(&self) -> WindowPreferences {
        self.prefs
    }

    /// Initial setup for a newly available window, then the current toggles.
    pub fn attach(&self, chrome: &dyn WindowChrome, setup: &WindowSetup) -> Result<(), CameraError> {
        chrome.configure(setup)?;
        chrome.apply_pinned(self.prefs.pinned_on_top)?;
        chrome.apply_title_bar(self.prefs.show_title_bar)
    }

    /// Returns whether the value changed.
    pub fn set_pinned(&mut self, pinned: bool, chrome: &dyn WindowChrome) -> Result<bool, CameraError> {
        if self.prefs.pinned_on_top == pinned {
            return Ok(false);
        }
        chrome.apply_pinned(pinned)?;
        self.prefs.pinned_on_top = pinned;
        log::info!("Preview window pinned on top: {}", pinned);
        Ok(true)
    }

    /// Returns whether the value changed.
    pub fn set_title_bar_visible(
        &mut self,
        visible: bool,
        chrome: &dyn WindowChrome,
    ) -> Result<bool, CameraError> {
        if self.prefs.show_title_bar == visible {
            return Ok(false);
        }
        chrome.apply_title_bar(visible)?;
        self.prefs.show_title_bar = visible;
        log::info!("Preview window title bar visible: {}", visible);
        Ok(true)
    }

    /// Returns whether the value changed.
    pub fn set_mirrored(&mut self, mirrored: bool) -> bool {
        let changed = self.prefs.mirrored != mirrored;
        self.prefs.mirrored = mirrored;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingChrome {
        calls: RefCell<Vec<String>>,
        fail: bool,
    }

    impl WindowChrome for RecordingChrome {
        fn configure(&self, setup: &WindowSetup) -> Result<(), CameraError> {
            self.calls.borrow_mut().push(format!("configure:{}", setup.title));
            Ok(())
        }

        fn apply_pinned(&self, pinned: bool) -> Result<(), CameraError> {
            if self.fail {
                return Err(CameraError::InitializationError("window gone".to_string()));
            }
            self.calls.borrow_mut().push(format!("pinned:{}", pinned));
            Ok(())
        }

        fn apply_title_bar(&self, visible: bool) -> Result<(), CameraError> {
            self.calls.borrow_mut().push(format!("title_bar:{}", visible));
            Ok(())
        }
    }

    fn setup() -> WindowSetup {
        WindowSetup {
            title: "PingCamera".to_string(),
            min_width: 80.0,
            min_height: 60.0,
        }
    }

    #[test]
    fn test_attach_applies_current_preferences() {
        let chrome = RecordingChrome::default();
        let settings = ChromeSettings::default();

        settings.attach(&chrome, &setup()).unwrap();

        assert_eq!(
            *chrome.calls.borrow(),
            vec!["configure:PingCamera", "pinned:true", "title_bar:false"]
        );
    }

    #[test]
    fn test_unchanged_values_do_not_notify() {
        let chrome = RecordingChrome::default();
        let mut settings = ChromeSettings::default();

        assert!(!settings.set_pinned(true, &chrome).unwrap());
        assert!(!settings.set_title_bar_visible(false, &chrome).unwrap());
        assert!(chrome.calls.borrow().is_empty());

        assert!(settings.set_pinned(false, &chrome).unwrap());
        assert!(settings.set_title_bar_visible(true, &chrome).unwrap());
        assert_eq!(*chrome.calls.borrow(), vec!["pinned:false", "title_bar:true"]);
    }

    #[test]
    fn test_failed_apply_keeps_previous_value() {
        let chrome = RecordingChrome {
            fail: true,
            ..Default::default()
        };
        let mut settings = ChromeSettings::default();

        assert!(settings.set_pinned(false, &chrome).is_err());
        assert!(settings.preferences().pinned_on_top);
    }

    #[test]
    fn test_mirroring_is_window_independent() {
        let mut settings = ChromeSettings::default();
        assert!(settings.set_mirrored(true));
        assert!(!settings.set_mirrored(true));
        assert!(settings.preferences().mirrored);
    }
}
