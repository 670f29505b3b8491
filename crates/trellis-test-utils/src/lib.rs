//! Testing utilities for the Trellis engine.
//!
//! This crate provides mocks of the engine's collaborator contracts, recording
//! fakes for behavioral tests, EventType fixtures and report assertions.

pub mod assertions;
pub mod fakes;
pub mod fixtures;
pub mod mocks;

/// Re-export commonly used types for convenience
pub use mockall;

pub use assertions::{assert_statuses, step_status};
pub use fakes::{CallLog, RecordingApiClient, RecordingHandle, RecordingHandler, RecordingNotifier};
