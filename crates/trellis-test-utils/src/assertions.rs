//! Assertion utilities for trigger reports.

use trellis_core::{ActionOutcome, ActionReport, TriggerReport};

/// Short status name of a step: `completed`, `skipped` or `failed`
pub fn step_status(step: &ActionReport) -> &'static str {
    match step.outcome {
        ActionOutcome::Completed { .. } => "completed",
        ActionOutcome::Skipped { .. } => "skipped",
        ActionOutcome::Failed { .. } => "failed",
    }
}

/// Assert the status of every step in order.
///
/// # Panics
///
/// Panics with the full step list when the statuses differ.
pub fn assert_statuses(report: &TriggerReport, expected: &[&str]) {
    let actual: Vec<&str> = report.steps.iter().map(step_status).collect();
    assert_eq!(
        actual, expected,
        "unexpected step statuses for {}.{}: {:#?}",
        report.event_type, report.trigger, report.steps
    );
}
