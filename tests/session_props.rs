//! Property-Based Tests for the capture session lifecycle
//!
//! These tests verify the ordering and single-prompt contracts using
//! proptest for input generation and shrinking.
//!
//! Run with: cargo test --test session_props

use pingcamera::permissions::{AuthorizationGate, AuthorizationState, GateRequest};
use pingcamera::session::{DeviceSession, SessionPreset};
use pingcamera::testing::{FakeBackend, FakePermissions};
use pingcamera::CaptureController;
use proptest::prelude::*;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Runtime creation should succeed")
}

// ═══════════════════════════════════════════════════════════════════════════
// SESSION WORKER INVARIANTS
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// INVARIANT: The running flag always matches the last scheduled operation
    #[test]
    fn running_flag_follows_last_operation(
        ops in prop::collection::vec(any::<bool>(), 1..40),
    ) {
        let backend = Arc::new(FakeBackend::with_device("0", "Camera"));
        let session = DeviceSession::new(backend.clone(), SessionPreset::High, |_| {})
            .expect("Session creation should succeed");

        for &start in &ops {
            if start {
                session.start();
            } else {
                session.stop();
            }
        }

        let running = runtime().block_on(session.is_running());
        prop_assert_eq!(running, *ops.last().unwrap());
    }

    /// INVARIANT: Start and stop only reach the backend on a state change
    #[test]
    fn backend_sees_only_transitions(
        ops in prop::collection::vec(any::<bool>(), 1..40),
    ) {
        let backend = Arc::new(FakeBackend::with_device("0", "Camera"));
        let session = DeviceSession::new(backend.clone(), SessionPreset::High, |_| {})
            .expect("Session creation should succeed");

        let mut running = false;
        let mut starts = 0;
        let mut stops = 0;
        for &start in &ops {
            if start {
                session.start();
                if !running {
                    starts += 1;
                }
            } else {
                session.stop();
                if running {
                    stops += 1;
                }
            }
            running = start;
        }

        runtime().block_on(session.is_running());
        prop_assert_eq!(backend.start_calls(), starts);
        prop_assert_eq!(backend.stop_calls(), stops);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// AUTHORIZATION GATE INVARIANTS
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// INVARIANT: Any number of requests while undetermined shows one prompt
    #[test]
    fn gate_prompts_at_most_once(requests in 1usize..50) {
        let permissions = Arc::new(FakePermissions::new(AuthorizationState::Undetermined));
        let gate = AuthorizationGate::new(permissions.clone());

        let mut prompted = 0;
        for _ in 0..requests {
            if gate.request_if_undetermined(|_| {}) == GateRequest::Prompted {
                prompted += 1;
            }
        }

        prop_assert_eq!(prompted, 1);
        prop_assert_eq!(permissions.prompt_count(), 1);
        prop_assert!(gate.is_prompt_outstanding());
    }

    /// INVARIANT: Controller requests never prompt more than once, and a
    /// decided permission is never prompted at all
    #[test]
    fn controller_requests_prompt_at_most_once(
        requests in 1usize..30,
        initial in prop_oneof![
            Just(AuthorizationState::Undetermined),
            Just(AuthorizationState::Authorized),
            Just(AuthorizationState::Denied),
            Just(AuthorizationState::Restricted),
        ],
    ) {
        let permissions = Arc::new(FakePermissions::new(initial));
        let backend = Arc::new(FakeBackend::with_device("0", "Camera"));

        let prompts = runtime().block_on(async {
            let controller = CaptureController::spawn(
                permissions.clone(),
                backend.clone(),
                SessionPreset::High,
            )
            .expect("Controller creation should succeed");
            for _ in 0..requests {
                controller.request_access_if_needed();
            }
            controller.session_running().await;
            permissions.prompt_count()
        });

        let expected = if initial == AuthorizationState::Undetermined { 1 } else { 0 };
        prop_assert_eq!(prompts, expected);
        prop_assert!(backend.attached_inputs() <= 1);
    }
}
