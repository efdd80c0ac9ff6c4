//! Testing utilities for PingCamera
//!
//! Deterministic stand-ins for the OS permission and capture APIs, with
//! counters for every call the lifecycle makes into them.

pub mod fake_backend;
pub mod fake_permissions;

pub use fake_backend::{FakeBackend, FakeInput};
pub use fake_permissions::FakePermissions;
