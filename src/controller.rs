//! Capture lifecycle controller.
//!
//! All observable state lives in [`ControllerLoop`], a single task consuming
//! a command channel. [`CaptureController`] handles only send commands and
//! read the published [`ControllerState`]. Permission callbacks and worker
//! failures come back through a weak sender tagged with a generation number,
//! so nothing reaches a controller that has been torn down.

use crate::errors::{CameraError, CaptureError};
use crate::permissions::{AuthorizationGate, AuthorizationState, GateRequest, PermissionPort};
use crate::session::{
    CaptureBackend, ConfigureOutcome, DeviceSession, PreviewHandle, SessionFailure, SessionPreset,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Snapshot published to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ControllerState {
    pub authorization_state: AuthorizationState,
    pub error: Option<CaptureError>,
    pub configured: bool,
    pub torn_down: bool,
}

impl ControllerState {
    fn initial(authorization_state: AuthorizationState) -> Self {
        Self {
            authorization_state,
            error: None,
            configured: false,
            torn_down: false,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}

enum Command {
    RequestAccess,
    Refresh,
    PermissionDecided {
        generation: u64,
        state: AuthorizationState,
    },
    StartFailed {
        generation: u64,
        message: String,
    },
    QueryRunning(oneshot::Sender<bool>),
    Teardown(Option<oneshot::Sender<bool>>),
}

/// Handle used by the presentation layer. Cheap to clone.
///
/// When the last handle is dropped the loop tears the session down.
pub struct CaptureController<B: CaptureBackend> {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ControllerState>,
    preview: PreviewHandle<B>,
}

impl<B: CaptureBackend> Clone for CaptureController<B> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            state: self.state.clone(),
            preview: self.preview.clone(),
        }
    }
}

impl<B: CaptureBackend> CaptureController<B> {
    /// Build a controller and the loop that must be driven for it to act.
    pub fn new(
        permissions: Arc<dyn PermissionPort>,
        backend: Arc<B>,
        preset: SessionPreset,
    ) -> Result<(Self, ControllerLoop<B>), CameraError> {
        let (commands, rx) = mpsc::unbounded_channel();
        let weak = commands.downgrade();
        let generation = 0;

        let failure_tx = weak.clone();
        let session = DeviceSession::new(backend, preset, move |failure| match failure {
            SessionFailure::Start(error) => {
                if let Some(tx) = failure_tx.upgrade() {
                    let _ = tx.send(Command::StartFailed {
                        generation,
                        message: error.to_string(),
                    });
                }
            }
            // Logged by the worker
            SessionFailure::Stop(_) => {}
        })?;

        let gate = AuthorizationGate::new(permissions);
        let (state_tx, state) = watch::channel(ControllerState::initial(gate.current_status()));
        let preview = session.preview_handle();

        let controller = Self {
            commands,
            state,
            preview,
        };
        let run_loop = ControllerLoop {
            commands: rx,
            weak,
            gate,
            session,
            state: state_tx,
            generation,
            start_failed: false,
        };
        Ok((controller, run_loop))
    }

    /// [`CaptureController::new`] with the loop spawned on the current tokio runtime.
    pub fn spawn(
        permissions: Arc<dyn PermissionPort>,
        backend: Arc<B>,
        preset: SessionPreset,
    ) -> Result<Self, CameraError> {
        let (controller, run_loop) = Self::new(permissions, backend, preset)?;
        tokio::spawn(run_loop.run());
        Ok(controller)
    }

    /// Ask for camera access if needed and configure the session once granted.
    pub fn request_access_if_needed(&self) {
        self.send(Command::RequestAccess);
    }

    /// Re-read the OS permission, picking up grants made in system settings.
    pub fn refresh_authorization_status(&self) {
        self.send(Command::Refresh);
    }

    /// Stop the session. Terminal; later commands are ignored.
    pub fn teardown(&self) {
        self.send(Command::Teardown(None));
    }

    /// Tear down and wait until the final stop has run on the session worker.
    ///
    /// Returns the running flag observed after the stop.
    pub async fn teardown_and_wait(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Teardown(Some(tx)));
        rx.await.unwrap_or(false)
    }

    /// Running flag, answered after every command sent before this call.
    pub async fn session_running(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        self.send(Command::QueryRunning(tx));
        rx.await.unwrap_or(false)
    }

    pub fn state(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    pub fn authorization_state(&self) -> AuthorizationState {
        self.state.borrow().authorization_state
    }

    pub fn error_message(&self) -> Option<String> {
        self.state.borrow().error_message()
    }

    /// Receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state.clone()
    }

    pub fn preview_handle(&self) -> PreviewHandle<B> {
        self.preview.clone()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::debug!("Capture controller loop has exited, command dropped");
        }
    }
}

/// The single consumer that owns and mutates controller state.
pub struct ControllerLoop<B: CaptureBackend> {
    commands: mpsc::UnboundedReceiver<Command>,
    weak: mpsc::WeakUnboundedSender<Command>,
    gate: AuthorizationGate,
    session: DeviceSession<B>,
    state: watch::Sender<ControllerState>,
    generation: u64,
    /// The last scheduled start failed on the worker
    start_failed: bool,
}

impl<B: CaptureBackend> ControllerLoop<B> {
    /// Process commands until teardown or until every handle is dropped.
    pub async fn run(mut self) {
        let authorized = self.state.borrow().authorization_state == AuthorizationState::Authorized;
        if authorized {
            self.configure_session();
        }

        while let Some(command) = self.commands.recv().await {
            match command {
                Command::RequestAccess => self.request_access_if_needed(),
                Command::Refresh => self.refresh_authorization_status(),
                Command::PermissionDecided { generation, state } => {
                    self.apply_decision(generation, state)
                }
                Command::StartFailed { generation, message } => {
                    if generation == self.generation {
                        self.start_failed = true;
                        self.set_error(CaptureError::CannotAttachInput(message));
                    }
                }
                Command::QueryRunning(reply) => self.session.query_running(reply),
                Command::Teardown(reply) => {
                    self.teardown(reply);
                    return;
                }
            }
        }

        log::debug!("All capture controller handles dropped");
        self.teardown(None);
    }

    fn request_access_if_needed(&mut self) {
        let status = self.gate.current_status();
        self.set_authorization(status);

        match status {
            AuthorizationState::Undetermined => {
                let tx = self.weak.clone();
                let generation = self.generation;
                let request = self.gate.request_if_undetermined(move |state| {
                    if let Some(tx) = tx.upgrade() {
                        let _ = tx.send(Command::PermissionDecided { generation, state });
                    }
                });
                // The status may have been decided between the two reads
                if let GateRequest::Decided(state) = request {
                    self.apply_decided_status(state);
                }
            }
            decided => self.apply_decided_status(decided),
        }
    }

    fn apply_decided_status(&mut self, status: AuthorizationState) {
        self.set_authorization(status);
        match status {
            AuthorizationState::Authorized => self.configure_session(),
            AuthorizationState::Denied => self.set_error(CaptureError::PermissionDenied),
            AuthorizationState::Restricted => self.set_error(CaptureError::PermissionRestricted),
            AuthorizationState::Undetermined => {}
        }
    }

    fn apply_decision(&mut self, generation: u64, state: AuthorizationState) {
        if generation != self.generation {
            log::debug!("Ignoring permission decision from a stale controller");
            return;
        }
        self.apply_decided_status(state);
    }

    fn refresh_authorization_status(&mut self) {
        let status = self.gate.current_status();
        self.set_authorization(status);
        if status == AuthorizationState::Authorized {
            self.configure_session();
        }
    }

    fn configure_session(&mut self) {
        match self.session.configure_if_needed() {
            Ok(ConfigureOutcome::Configured(_)) => self.mark_configured(),
            Ok(ConfigureOutcome::AlreadyConfigured) => {
                // The device stays attached; only the start is repeated
                if self.start_failed {
                    log::info!("Retrying capture session start");
                    self.start_failed = false;
                    self.session.start();
                    self.mark_configured();
                }
            }
            Err(e) => self.set_error(e),
        }
    }

    fn mark_configured(&self) {
        self.state.send_if_modified(|s| {
            let changed = !s.configured || s.error.is_some();
            s.configured = true;
            s.error = None;
            changed
        });
    }

    fn teardown(&mut self, reply: Option<oneshot::Sender<bool>>) {
        log::info!("Tearing down capture controller");
        self.generation += 1;
        self.session.stop();
        if let Some(reply) = reply {
            self.session.query_running(reply);
        }
        self.state.send_modify(|s| s.torn_down = true);
    }

    fn set_authorization(&self, status: AuthorizationState) {
        self.state.send_if_modified(|s| {
            if s.authorization_state == status {
                return false;
            }
            s.authorization_state = status;
            true
        });
    }

    fn set_error(&self, error: CaptureError) {
        log::warn!("Capture error: {}", error);
        self.state.send_if_modified(|s| {
            if s.error.as_ref() == Some(&error) {
                return false;
            }
            s.error = Some(error);
            true
        });
    }
}
