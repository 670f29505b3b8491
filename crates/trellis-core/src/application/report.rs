//! Outcome of a trigger run

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::EngineError;

/// What happened to one action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ActionOutcome {
    /// The action ran; `result` is absent when it produced nothing
    Completed {
        /// Value returned by the action
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
    },
    /// No handler matched; logged and ignored
    Skipped {
        /// Why it was skipped
        reason: String,
    },
    /// The action raised an error; later actions still ran
    Failed {
        /// The error
        #[serde(serialize_with = "serialize_error")]
        error: EngineError,
    },
}

fn serialize_error<S: Serializer>(error: &EngineError, serializer: S) -> Result<S::Ok, S::Error> {
    json!({ "code": error.error_code(), "message": error.to_string() }).serialize(serializer)
}

/// Record of one executed action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    /// Trigger the action belongs to (callbacks report their own name)
    pub trigger: String,
    /// Position within that trigger's action list
    pub index: usize,
    /// Handler name or expression
    pub action: String,
    /// Outcome
    #[serde(flatten)]
    pub outcome: ActionOutcome,
}

impl ActionReport {
    /// Whether the action failed
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ActionOutcome::Failed { .. })
    }
}

/// Result envelope returned by `execute_trigger`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TriggerReport {
    /// EventType the trigger was fired on
    pub event_type: String,
    /// Trigger name
    pub trigger: String,
    /// Last non-absent result of the trigger's own actions
    pub last_result: Option<Value>,
    /// One entry per executed action, callbacks included
    pub steps: Vec<ActionReport>,
}

impl TriggerReport {
    pub(crate) fn new(event_type: impl Into<String>, trigger: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            trigger: trigger.into(),
            ..Default::default()
        }
    }

    /// The last result, if any
    pub fn result(&self) -> Option<&Value> {
        self.last_result.as_ref()
    }

    /// Consume the report and return the last result
    pub fn into_result(self) -> Option<Value> {
        self.last_result
    }

    /// True when no action ran at all
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps that failed
    pub fn failures(&self) -> impl Iterator<Item = &ActionReport> {
        self.steps.iter().filter(|step| step.is_failed())
    }

    /// Whether any step failed
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_outcomes() {
        let mut report = TriggerReport::new("appList", "onLoad");
        report.last_result = Some(json!({"rows": []}));
        report.steps.push(ActionReport {
            trigger: "onLoad".into(),
            index: 0,
            action: "execApps".into(),
            outcome: ActionOutcome::Completed { result: Some(json!({"rows": []})) },
        });
        report.steps.push(ActionReport {
            trigger: "onLoad".into(),
            index: 1,
            action: "nope".into(),
            outcome: ActionOutcome::Skipped { reason: "Unknown action: nope".into() },
        });
        report.steps.push(ActionReport {
            trigger: "onLoad".into(),
            index: 2,
            action: "execEvent".into(),
            outcome: ActionOutcome::Failed { error: EngineError::Timeout(10) },
        });

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["steps"][0]["status"], "completed");
        assert_eq!(value["steps"][1]["status"], "skipped");
        assert_eq!(value["steps"][2]["status"], "failed");
        assert_eq!(value["steps"][2]["error"]["code"], "ERR_ENGINE_TIMEOUT");
        assert_eq!(report.failures().count(), 1);
        assert!(report.has_failures());
    }
}
