use crate::permissions::{AuthorizationState, DecisionHandler, PermissionPort};
use std::sync::Mutex;

struct Inner {
    status: AuthorizationState,
    prompts: usize,
    pending: Vec<DecisionHandler>,
}

/// Permission port whose prompts stay pending until the test answers them.
pub struct FakePermissions {
    inner: Mutex<Inner>,
}

impl FakePermissions {
    pub fn new(status: AuthorizationState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                status,
                prompts: 0,
                pending: Vec::new(),
            }),
        }
    }

    /// Change the permission out-of-band, as the system settings app would.
    pub fn set_status(&self, status: AuthorizationState) {
        self.inner.lock().expect("lock poisoned").status = status;
    }

    /// Number of prompts shown to the "user" so far.
    pub fn prompt_count(&self) -> usize {
        self.inner.lock().expect("lock poisoned").prompts
    }

    pub fn pending_prompts(&self) -> usize {
        self.inner.lock().expect("lock poisoned").pending.len()
    }

    /// Answer every outstanding prompt from the calling thread.
    pub fn resolve(&self, granted: bool) {
        let pending = {
            let mut inner = self.inner.lock().expect("lock poisoned");
            inner.status = if granted {
                AuthorizationState::Authorized
            } else {
                AuthorizationState::Denied
            };
            std::mem::take(&mut inner.pending)
        };
        for handler in pending {
            handler(granted);
        }
    }
}

impl PermissionPort for FakePermissions {
    fn status(&self) -> AuthorizationState {
        self.inner.lock().expect("lock poisoned").status
    }

    fn request_access(&self, on_complete: DecisionHandler) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.prompts += 1;
        inner.pending.push(on_complete);
    }
}
