//! Camera authorization: the OS permission port and the single-flight gate
//! that guards the permission prompt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// OS-mediated permission level for camera access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AuthorizationState {
    /// The user has not been asked yet
    Undetermined,
    /// Access granted
    Authorized,
    /// Access denied by the user
    Denied,
    /// Access blocked by system policy (parental controls, MDM, ...)
    Restricted,
}

impl AuthorizationState {
    /// Whether the user (or the system) has already made a decision.
    pub fn is_decided(self) -> bool {
        self != AuthorizationState::Undetermined
    }
}

impl std::fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorizationState::Undetermined => write!(f, "undetermined"),
            AuthorizationState::Authorized => write!(f, "authorized"),
            AuthorizationState::Denied => write!(f, "denied"),
            AuthorizationState::Restricted => write!(f, "restricted"),
        }
    }
}

/// Detailed permission information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: AuthorizationState,
    pub message: String,
    pub can_request: bool,
}

/// Completion handler for a permission prompt. Receives `true` when granted.
pub type DecisionHandler = Box<dyn FnOnce(bool) + Send + 'static>;

/// Platform permission API: one synchronous query and one asynchronous
/// request-and-callback operation.
///
/// `request_access` may invoke the handler on any thread, before or after it
/// returns.
pub trait PermissionPort: Send + Sync {
    fn status(&self) -> AuthorizationState;
    fn request_access(&self, on_complete: DecisionHandler);
}

/// Result of [`AuthorizationGate::request_if_undetermined`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRequest {
    /// A prompt was issued; the decision callback will fire exactly once.
    Prompted,
    /// A prompt is already outstanding; nothing was issued.
    InFlight,
    /// Nothing to ask. The callback is dropped without being called.
    Decided(AuthorizationState),
}

/// Issues at most one permission prompt per undetermined state.
#[derive(Clone)]
pub struct AuthorizationGate {
    port: Arc<dyn PermissionPort>,
    in_flight: Arc<AtomicBool>,
}

impl AuthorizationGate {
    pub fn new(port: Arc<dyn PermissionPort>) -> Self {
        Self {
            port,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Synchronous query of the OS-level permission.
    pub fn current_status(&self) -> AuthorizationState {
        self.port.status()
    }

    /// Whether a prompt is currently awaiting the user's decision.
    pub fn is_prompt_outstanding(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Prompt the user if the permission is still undetermined.
    ///
    /// `on_decision` receives `Authorized` or `Denied` and fires exactly once
    /// when the result is `Prompted`. Callers that need foreground affinity
    /// must re-post from inside `on_decision`.
    pub fn request_if_undetermined<F>(&self, on_decision: F) -> GateRequest
    where
        F: FnOnce(AuthorizationState) + Send + 'static,
    {
        let status = self.port.status();
        if status.is_decided() {
            return GateRequest::Decided(status);
        }

        if self.in_flight.swap(true, Ordering::AcqRel) {
            log::debug!("Camera permission prompt already outstanding");
            return GateRequest::InFlight;
        }

        log::info!("Requesting camera permission");
        let in_flight = self.in_flight.clone();
        self.port.request_access(Box::new(move |granted| {
            in_flight.store(false, Ordering::Release);
            let decision = if granted {
                AuthorizationState::Authorized
            } else {
                AuthorizationState::Denied
            };
            log::info!("Camera permission decision: {}", decision);
            on_decision(decision);
        }));
        GateRequest::Prompted
    }
}

/// Permission port backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPermissions;

impl SystemPermissions {
    pub fn new() -> Self {
        Self
    }
}

impl PermissionPort for SystemPermissions {
    fn status(&self) -> AuthorizationState {
        check_permission()
    }

    fn request_access(&self, on_complete: DecisionHandler) {
        #[cfg(target_os = "macos")]
        {
            request_permission_macos(on_complete)
        }

        // No programmatic prompt elsewhere: the answer is whatever the
        // system currently allows.
        #[cfg(not(target_os = "macos"))]
        {
            on_complete(check_permission() == AuthorizationState::Authorized)
        }
    }
}

/// Check camera permission status for the current platform
pub fn check_permission() -> AuthorizationState {
    check_permission_detailed().status
}

/// Check camera permission status with detailed information
pub fn check_permission_detailed() -> PermissionInfo {
    #[cfg(target_os = "windows")]
    {
        check_permission_windows()
    }

    #[cfg(target_os = "macos")]
    {
        check_permission_macos()
    }

    #[cfg(target_os = "linux")]
    {
        check_permission_linux()
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        PermissionInfo {
            status: AuthorizationState::Restricted,
            message: "Camera access is not supported on this platform".to_string(),
            can_request: false,
        }
    }
}

/// Deep link to the system's camera privacy settings, when the platform has one.
pub fn privacy_settings_url() -> Option<&'static str> {
    if cfg!(target_os = "macos") {
        Some("x-apple.systempreferences:com.apple.preference.security?Privacy_Camera")
    } else if cfg!(target_os = "windows") {
        Some("ms-settings:privacy-webcam")
    } else {
        None
    }
}

/// Text for the permission prompt view shown while there is no preview.
pub fn status_guidance(status: AuthorizationState) -> &'static str {
    match status {
        AuthorizationState::Undetermined => "Requesting camera permission...",
        AuthorizationState::Authorized => "Camera access authorized",
        AuthorizationState::Denied | AuthorizationState::Restricted => {
            "Allow camera access in the system privacy settings, then refresh."
        }
    }
}

#[cfg(target_os = "windows")]
fn check_permission_windows() -> PermissionInfo {
    // Windows has no query API reachable here; enumerating devices is the
    // closest proxy for the Privacy > Camera switch.
    use nokhwa::query;

    match query(nokhwa::utils::ApiBackend::Auto) {
        Ok(_) => PermissionInfo {
            status: AuthorizationState::Authorized,
            message: "Camera access granted via Windows Privacy settings".to_string(),
            can_request: false,
        },
        Err(e) => PermissionInfo {
            status: AuthorizationState::Denied,
            message: format!("Camera access denied: {}", e),
            can_request: false,
        },
    }
}

#[cfg(target_os = "macos")]
unsafe fn video_media_type() -> *mut objc::runtime::Object {
    use objc::runtime::Object;
    use objc::{class, msg_send, sel, sel_impl};

    // AVMediaTypeVideo
    let raw = b"vide\0".as_ptr() as *const std::os::raw::c_char;
    let media_type: *mut Object = msg_send![class!(NSString), stringWithUTF8String: raw];
    media_type
}

#[cfg(target_os = "macos")]
fn check_permission_macos() -> PermissionInfo {
    use objc::runtime::Class;
    use objc::{msg_send, sel, sel_impl};

    let Some(av_capture_device_class) = Class::get("AVCaptureDevice") else {
        return PermissionInfo {
            status: AuthorizationState::Restricted,
            message: "AVFoundation not available".to_string(),
            can_request: false,
        };
    };

    // AVAuthorizationStatus: 0 NotDetermined, 1 Restricted, 2 Denied, 3 Authorized
    let auth_status: i64 = unsafe {
        let media_type = video_media_type();
        msg_send![av_capture_device_class, authorizationStatusForMediaType: media_type]
    };

    match auth_status {
        3 => PermissionInfo {
            status: AuthorizationState::Authorized,
            message: "Camera access authorized".to_string(),
            can_request: false,
        },
        2 => PermissionInfo {
            status: AuthorizationState::Denied,
            message: "Camera access denied - enable in System Settings > Privacy & Security > Camera".to_string(),
            can_request: false,
        },
        1 => PermissionInfo {
            status: AuthorizationState::Restricted,
            message: "Camera access restricted by system policy".to_string(),
            can_request: false,
        },
        _ => PermissionInfo {
            status: AuthorizationState::Undetermined,
            message: "Camera permission not yet requested".to_string(),
            can_request: true,
        },
    }
}

#[cfg(target_os = "macos")]
fn request_permission_macos(on_complete: DecisionHandler) {
    use block::ConcreteBlock;
    use objc::runtime::Class;
    use objc::{msg_send, sel, sel_impl};
    use std::sync::Mutex;

    let Some(av_capture_device_class) = Class::get("AVCaptureDevice") else {
        log::warn!("AVFoundation not available, treating camera permission as denied");
        on_complete(false);
        return;
    };

    // Blocks are `Fn`; the slot makes the handler fire at most once.
    let slot = Mutex::new(Some(on_complete));
    let handler = ConcreteBlock::new(move |granted: bool| {
        let handler = slot.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handler) = handler {
            handler(granted);
        }
    });
    // Copy to the heap so the block outlives this frame
    let handler = handler.copy();

    unsafe {
        let media_type = video_media_type();
        let _: () = msg_send![av_capture_device_class, requestAccessForMediaType:media_type completionHandler:&*handler];
    }
}

#[cfg(target_os = "linux")]
fn check_permission_linux() -> PermissionInfo {
    use std::fs::OpenOptions;
    use std::io::ErrorKind;
    use std::path::Path;

    let video_devices: Vec<_> = (0..10)
        .map(|i| format!("/dev/video{}", i))
        .filter(|path| Path::new(path).exists())
        .collect();

    // Nothing to deny; device lookup will report the missing camera.
    let Some(first_device) = video_devices.first() else {
        return PermissionInfo {
            status: AuthorizationState::Authorized,
            message: "No video devices found at /dev/video*".to_string(),
            can_request: false,
        };
    };

    match OpenOptions::new().read(true).open(first_device) {
        Ok(_) => PermissionInfo {
            status: AuthorizationState::Authorized,
            message: format!("Camera access granted ({} is readable)", first_device),
            can_request: false,
        },
        Err(e) if e.kind() == ErrorKind::PermissionDenied => PermissionInfo {
            status: AuthorizationState::Denied,
            message: format!(
                "Camera device {} is not readable - run: sudo usermod -a -G video $USER",
                first_device
            ),
            can_request: false,
        },
        // Busy or vanished devices are not a permission problem
        Err(e) => PermissionInfo {
            status: AuthorizationState::Authorized,
            message: format!("Camera device {} present but not opened: {}", first_device, e),
            can_request: false,
        },
    }
}
