//! The capture session: device attach inside a configuration transaction,
//! and start/stop serialized on one background worker thread.

use crate::errors::{CameraError, CaptureError};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Capture quality requested from the backend during configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPreset {
    #[default]
    High,
    Medium,
    Low,
}

/// A capture device as reported by the backend's default-device lookup
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeviceDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Platform capture API: default device lookup, input construction, and a
/// session object with begin/commit configuration and start/stop.
///
/// The backend instance *is* the session. Configuration calls come from the
/// controller loop; `start_running`, `stop_running` and `is_running` are only
/// ever called from the session worker.
pub trait CaptureBackend: Send + Sync + 'static {
    type Input: Send;

    fn default_video_device(&self) -> Option<DeviceDescriptor>;
    fn make_input(&self, device: &DeviceDescriptor) -> Result<Self::Input, CameraError>;

    fn begin_configuration(&self);
    fn set_preset(&self, preset: SessionPreset);
    fn can_add_input(&self, input: &Self::Input) -> bool;
    fn add_input(&self, input: Self::Input);
    fn commit_configuration(&self);

    fn start_running(&self) -> Result<(), CameraError>;
    fn stop_running(&self) -> Result<(), CameraError>;
    fn is_running(&self) -> bool;
}

/// Outcome of a successful [`DeviceSession::configure_if_needed`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigureOutcome {
    /// The device was attached and a start has been scheduled
    Configured(DeviceDescriptor),
    /// Nothing to do
    AlreadyConfigured,
}

/// A start or stop the worker could not carry out
#[derive(Debug)]
pub enum SessionFailure {
    Start(CameraError),
    Stop(CameraError),
}

/// Receives start/stop failures from the worker thread.
pub type FailureSink = Box<dyn Fn(SessionFailure) + Send + 'static>;

enum SessionOp {
    Start,
    Stop,
    Query(oneshot::Sender<bool>),
}

/// Read-only handle a preview surface binds to for frame display.
///
/// Valid for as long as any clone exists; any number of surfaces may hold one.
pub struct PreviewHandle<B: CaptureBackend> {
    backend: Arc<B>,
}

impl<B: CaptureBackend> PreviewHandle<B> {
    pub fn session(&self) -> &B {
        &self.backend
    }
}

impl<B: CaptureBackend> Clone for PreviewHandle<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
        }
    }
}

/// Owns the capture session and its serial worker.
pub struct DeviceSession<B: CaptureBackend> {
    backend: Arc<B>,
    preset: SessionPreset,
    configured: bool,
    ops: Sender<SessionOp>,
}

impl<B: CaptureBackend> DeviceSession<B> {
    /// Create the session and spawn its worker thread.
    ///
    /// The worker exits once the session is dropped and every queued
    /// operation has run.
    pub fn new<F>(backend: Arc<B>, preset: SessionPreset, on_failure: F) -> Result<Self, CameraError>
    where
        F: Fn(SessionFailure) + Send + 'static,
    {
        let (ops, rx) = crossbeam_channel::unbounded();
        let worker_backend = backend.clone();
        let on_failure: FailureSink = Box::new(on_failure);

        std::thread::Builder::new()
            .name("pingcamera-session".to_string())
            .spawn(move || session_worker(worker_backend, rx, on_failure))
            .map_err(|e| {
                CameraError::InitializationError(format!("Failed to spawn session worker: {}", e))
            })?;

        Ok(Self {
            backend,
            preset,
            configured: false,
            ops,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn preview_handle(&self) -> PreviewHandle<B> {
        PreviewHandle {
            backend: self.backend.clone(),
        }
    }

    /// Attach the default video device and schedule the session start.
    ///
    /// A no-op once configured. On failure the flag is reset so a later
    /// explicit call retries; nothing here retries on its own.
    pub fn configure_if_needed(&mut self) -> Result<ConfigureOutcome, CaptureError> {
        if self.configured {
            log::debug!("Capture session already configured");
            return Ok(ConfigureOutcome::AlreadyConfigured);
        }
        self.configured = true;

        self.backend.begin_configuration();
        self.backend.set_preset(self.preset);
        let attached = self.attach_default_device();
        self.backend.commit_configuration();

        match attached {
            Ok(device) => {
                log::info!("Attached camera '{}' ({})", device.name, device.id);
                self.start();
                Ok(ConfigureOutcome::Configured(device))
            }
            Err(e) => {
                log::warn!("Capture session configuration failed: {}", e);
                self.configured = false;
                Err(e)
            }
        }
    }

    fn attach_default_device(&self) -> Result<DeviceDescriptor, CaptureError> {
        let device = self
            .backend
            .default_video_device()
            .ok_or(CaptureError::NoDeviceFound)?;

        let input = self
            .backend
            .make_input(&device)
            .map_err(|e| CaptureError::CannotAttachInput(e.to_string()))?;

        if !self.backend.can_add_input(&input) {
            return Err(CaptureError::CannotAttachInput(format!(
                "session rejected input for '{}'",
                device.name
            )));
        }
        self.backend.add_input(input);
        Ok(device)
    }

    /// Schedule a start on the worker. Ignored there if already running.
    pub fn start(&self) {
        self.submit(SessionOp::Start);
    }

    /// Schedule a stop on the worker. Ignored there if not running.
    pub fn stop(&self) {
        self.submit(SessionOp::Stop);
    }

    /// Running flag as seen by the worker after every earlier operation.
    pub async fn is_running(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        self.query_running(tx);
        rx.await.unwrap_or(false)
    }

    /// Queue a running-flag query; the worker answers `reply` directly.
    pub fn query_running(&self, reply: oneshot::Sender<bool>) {
        self.submit(SessionOp::Query(reply));
    }

    fn submit(&self, op: SessionOp) {
        if self.ops.send(op).is_err() {
            log::warn!("Session worker is gone, dropping session operation");
        }
    }
}

fn session_worker<B: CaptureBackend>(backend: Arc<B>, rx: Receiver<SessionOp>, on_failure: FailureSink) {
    for op in rx.iter() {
        match op {
            SessionOp::Start => {
                if backend.is_running() {
                    continue;
                }
                log::info!("Starting capture session");
                if let Err(e) = backend.start_running() {
                    log::error!("Failed to start capture session: {}", e);
                    on_failure(SessionFailure::Start(e));
                }
            }
            SessionOp::Stop => {
                if !backend.is_running() {
                    continue;
                }
                log::info!("Stopping capture session");
                if let Err(e) = backend.stop_running() {
                    log::error!("Failed to stop capture session: {}", e);
                    on_failure(SessionFailure::Stop(e));
                }
            }
            SessionOp::Query(reply) => {
                let _ = reply.send(backend.is_running());
            }
        }
    }
    log::debug!("Session worker exiting");
}
