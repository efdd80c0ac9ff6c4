use crate::errors::CameraError;
use crate::session::{CaptureBackend, DeviceDescriptor, SessionPreset};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Input handed out by [`FakeBackend::make_input`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeInput {
    pub device_id: String,
}

#[derive(Default)]
struct Transaction {
    open: bool,
    preset: Option<SessionPreset>,
    inputs: Vec<FakeInput>,
    begin_calls: usize,
    commit_calls: usize,
    make_input_calls: usize,
}

/// In-memory capture backend.
///
/// Start can be slowed down to widen race windows; the transaction lock is
/// never held while sleeping.
pub struct FakeBackend {
    device: Mutex<Option<DeviceDescriptor>>,
    reject_inputs: bool,
    input_failure: Option<String>,
    start_failure: Mutex<Option<String>>,
    stop_failure: Option<String>,
    start_delay: Duration,
    transaction: Mutex<Transaction>,
    running: AtomicBool,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

impl FakeBackend {
    fn build(device: Option<DeviceDescriptor>) -> Self {
        Self {
            device: Mutex::new(device),
            reject_inputs: false,
            input_failure: None,
            start_failure: Mutex::new(None),
            stop_failure: None,
            start_delay: Duration::ZERO,
            transaction: Mutex::new(Transaction::default()),
            running: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_device(id: &str, name: &str) -> Self {
        Self::build(Some(DeviceDescriptor::new(id, name)))
    }

    pub fn without_device() -> Self {
        Self::build(None)
    }

    /// Session refuses every input (`can_add_input` is false).
    pub fn rejecting_inputs(mut self) -> Self {
        self.reject_inputs = true;
        self
    }

    /// Input construction fails with `reason`.
    pub fn failing_input(mut self, reason: &str) -> Self {
        self.input_failure = Some(reason.to_string());
        self
    }

    /// `start_running` fails with `reason`.
    pub fn failing_start(mut self, reason: &str) -> Self {
        *self.start_failure.get_mut().expect("lock poisoned") = Some(reason.to_string());
        self
    }

    /// Let later starts succeed, as when another app releases the camera.
    pub fn clear_start_failure(&self) {
        *self.start_failure.lock().expect("lock poisoned") = None;
    }

    /// `stop_running` fails with `reason`; the session still ends up stopped.
    pub fn failing_stop(mut self, reason: &str) -> Self {
        self.stop_failure = Some(reason.to_string());
        self
    }

    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Plug or unplug the default device.
    pub fn set_device(&self, device: Option<DeviceDescriptor>) {
        *self.device.lock().expect("lock poisoned") = device;
    }

    pub fn attached_inputs(&self) -> usize {
        self.transaction.lock().expect("lock poisoned").inputs.len()
    }

    pub fn make_input_calls(&self) -> usize {
        self.transaction.lock().expect("lock poisoned").make_input_calls
    }

    pub fn begin_calls(&self) -> usize {
        self.transaction.lock().expect("lock poisoned").begin_calls
    }

    pub fn commit_calls(&self) -> usize {
        self.transaction.lock().expect("lock poisoned").commit_calls
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.lock().expect("lock poisoned").open
    }

    pub fn preset(&self) -> Option<SessionPreset> {
        self.transaction.lock().expect("lock poisoned").preset
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl CaptureBackend for FakeBackend {
    type Input = FakeInput;

    fn default_video_device(&self) -> Option<DeviceDescriptor> {
        self.device.lock().expect("lock poisoned").clone()
    }

    fn make_input(&self, device: &DeviceDescriptor) -> Result<FakeInput, CameraError> {
        self.transaction.lock().expect("lock poisoned").make_input_calls += 1;
        match &self.input_failure {
            Some(reason) => Err(CameraError::InitializationError(reason.clone())),
            None => Ok(FakeInput {
                device_id: device.id.clone(),
            }),
        }
    }

    fn begin_configuration(&self) {
        let mut tx = self.transaction.lock().expect("lock poisoned");
        tx.open = true;
        tx.begin_calls += 1;
    }

    fn set_preset(&self, preset: SessionPreset) {
        self.transaction.lock().expect("lock poisoned").preset = Some(preset);
    }

    fn can_add_input(&self, input: &FakeInput) -> bool {
        let tx = self.transaction.lock().expect("lock poisoned");
        !self.reject_inputs && tx.open && !tx.inputs.contains(input)
    }

    fn add_input(&self, input: FakeInput) {
        self.transaction.lock().expect("lock poisoned").inputs.push(input);
    }

    fn commit_configuration(&self) {
        let mut tx = self.transaction.lock().expect("lock poisoned");
        tx.open = false;
        tx.commit_calls += 1;
    }

    fn start_running(&self) -> Result<(), CameraError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if !self.start_delay.is_zero() {
            std::thread::sleep(self.start_delay);
        }
        if let Some(reason) = self.start_failure.lock().expect("lock poisoned").clone() {
            return Err(CameraError::StreamError(reason));
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_running(&self) -> Result<(), CameraError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        match &self.stop_failure {
            Some(reason) => Err(CameraError::StreamError(reason.clone())),
            None => Ok(()),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
