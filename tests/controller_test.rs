//! Lifecycle scenarios for the capture controller, driven through the
//! in-memory permission and capture fakes.

#[cfg(test)]
mod controller_tests {
    use pingcamera::errors::CaptureError;
    use pingcamera::permissions::AuthorizationState;
    use pingcamera::session::{CaptureBackend, DeviceDescriptor, SessionPreset};
    use pingcamera::testing::{FakeBackend, FakePermissions};
    use pingcamera::CaptureController;
    use std::sync::Arc;
    use std::time::Duration;

    struct Harness {
        controller: CaptureController<FakeBackend>,
        permissions: Arc<FakePermissions>,
        backend: Arc<FakeBackend>,
    }

    fn harness(status: AuthorizationState, backend: FakeBackend) -> Harness {
        let permissions = Arc::new(FakePermissions::new(status));
        let backend = Arc::new(backend);
        let controller =
            CaptureController::spawn(permissions.clone(), backend.clone(), SessionPreset::High)
                .expect("controller should start");
        Harness {
            controller,
            permissions,
            backend,
        }
    }

    #[tokio::test]
    async fn test_grant_after_prompt_starts_preview() {
        let h = harness(
            AuthorizationState::Undetermined,
            FakeBackend::with_device("0", "FaceTime HD Camera"),
        );

        h.controller.request_access_if_needed();
        assert!(!h.controller.session_running().await);
        assert_eq!(h.permissions.prompt_count(), 1);
        assert_eq!(h.backend.begin_calls(), 0);

        h.permissions.resolve(true);
        assert!(h.controller.session_running().await);

        let state = h.controller.state();
        assert_eq!(state.authorization_state, AuthorizationState::Authorized);
        assert!(state.error.is_none());
        assert!(state.configured);
        assert_eq!(h.backend.attached_inputs(), 1);
        assert_eq!(h.backend.preset(), Some(SessionPreset::High));
    }

    #[tokio::test]
    async fn test_denial_at_prompt_reports_permission_error() {
        let h = harness(
            AuthorizationState::Undetermined,
            FakeBackend::with_device("0", "Camera"),
        );

        h.controller.request_access_if_needed();
        h.controller.session_running().await;
        h.permissions.resolve(false);

        assert!(!h.controller.session_running().await);
        assert_eq!(h.controller.authorization_state(), AuthorizationState::Denied);
        assert_eq!(
            h.controller.error_message().as_deref(),
            Some("Camera permission is required to show the preview.")
        );
        assert_eq!(h.backend.begin_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_device_reports_error_without_running() {
        let h = harness(AuthorizationState::Authorized, FakeBackend::without_device());

        h.controller.request_access_if_needed();
        assert!(!h.controller.session_running().await);

        let state = h.controller.state();
        assert_eq!(state.authorization_state, AuthorizationState::Authorized);
        assert_eq!(state.error, Some(CaptureError::NoDeviceFound));
        assert!(!state.configured);
        assert_eq!(h.backend.attached_inputs(), 0);
        assert!(!h.backend.in_transaction());
        assert_eq!(h.backend.begin_calls(), h.backend.commit_calls());
    }

    #[tokio::test]
    async fn test_denied_never_prompts_or_configures() {
        let h = harness(AuthorizationState::Denied, FakeBackend::with_device("0", "Camera"));

        for _ in 0..3 {
            h.controller.request_access_if_needed();
        }
        assert!(!h.controller.session_running().await);

        assert_eq!(h.permissions.prompt_count(), 0);
        assert_eq!(h.backend.begin_calls(), 0);
        assert_eq!(h.controller.state().error, Some(CaptureError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_restricted_reports_restriction() {
        let h = harness(AuthorizationState::Restricted, FakeBackend::with_device("0", "Camera"));

        h.controller.request_access_if_needed();
        assert!(!h.controller.session_running().await);

        assert_eq!(h.permissions.prompt_count(), 0);
        assert_eq!(
            h.controller.state().error,
            Some(CaptureError::PermissionRestricted)
        );
    }

    #[tokio::test]
    async fn test_repeated_requests_prompt_once() {
        let h = harness(
            AuthorizationState::Undetermined,
            FakeBackend::with_device("0", "Camera"),
        );

        for _ in 0..10 {
            h.controller.request_access_if_needed();
        }
        h.controller.session_running().await;
        assert_eq!(h.permissions.prompt_count(), 1);

        h.permissions.resolve(true);
        h.controller.request_access_if_needed();
        assert!(h.controller.session_running().await);
        assert_eq!(h.permissions.prompt_count(), 1);
        assert_eq!(h.backend.attached_inputs(), 1);
        assert_eq!(h.backend.start_calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_picks_up_grant_from_settings() {
        let h = harness(AuthorizationState::Denied, FakeBackend::with_device("0", "Camera"));

        h.controller.request_access_if_needed();
        h.controller.session_running().await;
        assert!(h.controller.error_message().is_some());

        h.permissions.set_status(AuthorizationState::Authorized);
        h.controller.refresh_authorization_status();
        assert!(h.controller.session_running().await);

        let state = h.controller.state();
        assert_eq!(state.authorization_state, AuthorizationState::Authorized);
        assert!(state.error.is_none());
        assert!(state.configured);
    }

    #[tokio::test]
    async fn test_refresh_while_undetermined_does_not_prompt() {
        let h = harness(
            AuthorizationState::Undetermined,
            FakeBackend::with_device("0", "Camera"),
        );

        h.controller.refresh_authorization_status();
        assert!(!h.controller.session_running().await);
        assert_eq!(h.permissions.prompt_count(), 0);
        assert_eq!(h.backend.begin_calls(), 0);
    }

    #[tokio::test]
    async fn test_plugging_in_camera_then_retrying_recovers() {
        let h = harness(AuthorizationState::Authorized, FakeBackend::without_device());

        h.controller.request_access_if_needed();
        h.controller.session_running().await;
        assert_eq!(h.controller.state().error, Some(CaptureError::NoDeviceFound));

        h.backend.set_device(Some(DeviceDescriptor::new("1", "USB Camera")));
        h.controller.refresh_authorization_status();
        assert!(h.controller.session_running().await);
        assert!(h.controller.state().error.is_none());
        assert_eq!(h.backend.attached_inputs(), 1);
    }

    #[tokio::test]
    async fn test_input_failure_is_shown_with_reason() {
        let h = harness(
            AuthorizationState::Authorized,
            FakeBackend::with_device("0", "Camera").failing_input("device busy"),
        );

        h.controller.request_access_if_needed();
        h.controller.session_running().await;

        let message = h.controller.error_message().expect("error expected");
        assert!(message.starts_with("Camera initialization failed"));
        assert!(message.contains("device busy"));
    }

    #[tokio::test]
    async fn test_refresh_restarts_after_camera_is_released() {
        let h = harness(
            AuthorizationState::Authorized,
            FakeBackend::with_device("0", "Camera").failing_start("in use"),
        );

        assert!(!h.controller.session_running().await);
        // The failure report is queued behind the query
        h.controller.session_running().await;
        let message = h.controller.error_message().expect("error expected");
        assert!(message.contains("in use"));

        h.backend.clear_start_failure();
        h.controller.refresh_authorization_status();
        assert!(h.controller.session_running().await);

        let state = h.controller.state();
        assert!(state.error.is_none());
        assert!(state.configured);
        assert_eq!(h.backend.start_calls(), 2);
        assert_eq!(h.backend.attached_inputs(), 1);
    }

    #[tokio::test]
    async fn test_repeated_refresh_does_not_restart_running_session() {
        let h = harness(AuthorizationState::Authorized, FakeBackend::with_device("0", "Camera"));

        for _ in 0..3 {
            h.controller.refresh_authorization_status();
        }
        assert!(h.controller.session_running().await);
        assert_eq!(h.backend.start_calls(), 1);
    }

    #[tokio::test]
    async fn test_stop_failure_is_not_shown_as_attach_error() {
        let h = harness(
            AuthorizationState::Authorized,
            FakeBackend::with_device("0", "Camera").failing_stop("stream gone"),
        );
        let state = h.controller.subscribe();

        assert!(h.controller.session_running().await);
        assert!(!h.controller.teardown_and_wait().await);
        assert_eq!(h.backend.stop_calls(), 1);
        assert!(state.borrow().error.is_none());
    }

    #[tokio::test]
    async fn test_teardown_when_never_configured() {
        let h = harness(
            AuthorizationState::Undetermined,
            FakeBackend::with_device("0", "Camera"),
        );

        assert!(!h.controller.teardown_and_wait().await);
        assert!(h.controller.state().torn_down);
        assert_eq!(h.backend.start_calls(), 0);
        assert_eq!(h.backend.stop_calls(), 0);
    }

    #[tokio::test]
    async fn test_teardown_stops_slow_starting_session() {
        let h = harness(
            AuthorizationState::Authorized,
            FakeBackend::with_device("0", "Camera").with_start_delay(Duration::from_millis(50)),
        );

        h.controller.request_access_if_needed();
        assert!(!h.controller.teardown_and_wait().await);
        assert_eq!(h.backend.start_calls(), 1);
        assert_eq!(h.backend.stop_calls(), 1);
    }

    #[tokio::test]
    async fn test_commands_after_teardown_are_ignored() {
        let h = harness(
            AuthorizationState::Undetermined,
            FakeBackend::with_device("0", "Camera"),
        );

        h.controller.teardown_and_wait().await;
        h.controller.request_access_if_needed();
        h.controller.refresh_authorization_status();
        // Loop has exited, the query is dropped unanswered
        assert!(!h.controller.session_running().await);
        assert_eq!(h.permissions.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_see_authorization_change() {
        let h = harness(
            AuthorizationState::Undetermined,
            FakeBackend::with_device("0", "Camera"),
        );
        let mut state = h.controller.subscribe();

        h.controller.request_access_if_needed();
        h.controller.session_running().await;
        h.permissions.resolve(true);

        let seen = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if state.borrow_and_update().authorization_state == AuthorizationState::Authorized {
                    return true;
                }
                if state.changed().await.is_err() {
                    return false;
                }
            }
        })
        .await
        .unwrap_or(false);
        assert!(seen);
    }

    #[tokio::test]
    async fn test_preview_handle_shares_session() {
        let h = harness(AuthorizationState::Authorized, FakeBackend::with_device("0", "Camera"));

        assert!(h.controller.session_running().await);
        let preview = h.controller.preview_handle();
        assert!(preview.session().is_running());
    }
}
