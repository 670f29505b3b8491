//! EventType definitions
//!
//! An EventType names a UI component, binds trigger names to action lists and
//! may nest further EventTypes under `components`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::action::Action;

/// Well-known trigger names
pub mod triggers {
    /// Fired when a component mounts
    pub const ON_LOAD: &str = "onLoad";
    /// Fired when a target asks the component to reload
    pub const ON_REFRESH: &str = "onRefresh";
    /// Fired when a row is clicked
    pub const ON_SELECT: &str = "onSelect";
    /// Fired when a selector value changes
    pub const ON_SELECTION_CHANGE: &str = "onSelectionChange";
    /// Fired when an input value changes
    pub const ON_CHANGE: &str = "onChange";
    /// Fired when a form creates a record
    pub const ON_CREATE: &str = "onCreate";
    /// Fired when a form updates a record
    pub const ON_UPDATE: &str = "onUpdate";
    /// Fired when a record is deleted
    pub const ON_DELETE: &str = "onDelete";
    /// Runs after a trigger whose actions all succeeded
    pub const ON_SUCCESS: &str = "onSuccess";
    /// Runs after a trigger where at least one action failed
    pub const ON_ERROR: &str = "onError";
}

/// The value bound to a trigger name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerBinding {
    /// An ordered action list
    Actions(Vec<Action>),
    /// Any non-array value; executing it is a no-op
    Invalid(Value),
}

/// A declarative UI unit (page, grid, form, selector) and its trigger bindings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventType {
    /// Primary identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// Fallback identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Component id inside a page tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Rendering category, e.g. `grid` or `form`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Query used by bare string actions such as `"execEvent"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qry: Option<String>,

    /// Trigger name to action list
    #[serde(default)]
    pub workflow_triggers: BTreeMap<String, TriggerBinding>,

    /// Child components
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<EventType>,

    /// Everything else the rendering layer attached
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventType {
    /// Create an EventType with the given identity
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: Some(event_type.into()),
            ..Default::default()
        }
    }

    /// Set the query
    pub fn with_qry(mut self, qry: impl Into<String>) -> Self {
        self.qry = Some(qry.into());
        self
    }

    /// Set the component id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Bind an action list to a trigger
    pub fn with_trigger(mut self, trigger: impl Into<String>, actions: Vec<Action>) -> Self {
        self.workflow_triggers
            .insert(trigger.into(), TriggerBinding::Actions(actions));
        self
    }

    /// Add a child component
    pub fn with_component(mut self, component: EventType) -> Self {
        self.components.push(component);
        self
    }

    /// Registry key: `eventType`, falling back to `name`
    pub fn key(&self) -> Option<&str> {
        self.event_type.as_deref().or(self.name.as_deref())
    }

    /// The actions bound to `trigger`; `None` when absent or not an array
    pub fn trigger_actions(&self, trigger: &str) -> Option<&[Action]> {
        match self.workflow_triggers.get(trigger) {
            Some(TriggerBinding::Actions(actions)) => Some(actions),
            _ => None,
        }
    }

    /// Whether an action list is bound to `trigger`
    pub fn has_trigger(&self, trigger: &str) -> bool {
        self.trigger_actions(trigger).is_some()
    }

    /// Depth-first search of the component tree (self included) by `id`
    pub fn find_component(&self, id: &str) -> Option<&EventType> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.components
            .iter()
            .find_map(|child| child.find_component(id))
    }

    /// Label used in logs
    pub fn display_name(&self) -> &str {
        self.key().or(self.id.as_deref()).unwrap_or("<anonymous>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_falls_back_to_name() {
        let mut et = EventType::default();
        assert_eq!(et.key(), None);
        et.name = Some("appList".into());
        assert_eq!(et.key(), Some("appList"));
        et.event_type = Some("appGrid".into());
        assert_eq!(et.key(), Some("appGrid"));
    }

    #[test]
    fn test_deserialize_with_non_array_trigger() {
        let et: EventType = serde_json::from_value(json!({
            "eventType": "pageList",
            "category": "grid",
            "qry": "pageList",
            "workflowTriggers": {
                "onLoad": ["execEvent"],
                "onRefresh": "execEvent"
            },
            "title": "Pages"
        }))
        .unwrap();

        assert_eq!(et.trigger_actions("onLoad").map(|a| a.len()), Some(1));
        assert!(et.trigger_actions("onRefresh").is_none());
        assert!(et.trigger_actions("onDelete").is_none());
        assert_eq!(et.extra.get("title"), Some(&json!("Pages")));
    }

    #[test]
    fn test_find_component_depth_first() {
        let page = EventType::new("page")
            .with_component(
                EventType::default()
                    .with_id("col1")
                    .with_component(EventType::default().with_id("comp2")),
            )
            .with_component(EventType::default().with_id("comp3"));

        assert_eq!(
            page.find_component("comp2").and_then(|c| c.id.as_deref()),
            Some("comp2")
        );
        assert!(page.find_component("comp3").is_some());
        assert!(page.find_component("missing").is_none());
    }
}
