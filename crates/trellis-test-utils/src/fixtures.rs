//! EventType fixtures shaped like a small studio application.

use serde_json::{json, Value};
use trellis_core::EventType;

/// Build an EventType from its JSON form.
///
/// # Panics
///
/// Panics if `value` is not a valid EventType.
pub fn event_type(value: Value) -> EventType {
    serde_json::from_value(value).expect("fixture is a valid EventType")
}

/// An app selector that stores the chosen app and refreshes the page list.
pub fn app_selector() -> EventType {
    event_type(json!({
        "eventType": "selectApp",
        "category": "selector",
        "qry": "appList",
        "workflowTriggers": {
            "onLoad": ["execApps"],
            "onSelectionChange": [
                { "action": "setVal('appID', {{this.selected.value}})" },
                { "action": "refresh(['pageList'])" }
            ]
        }
    }))
}

/// A grid listing the pages of the selected app.
pub fn page_list() -> EventType {
    event_type(json!({
        "eventType": "pageList",
        "category": "grid",
        "qry": "pageList",
        "workflowTriggers": {
            "onRefresh": [
                { "action": "execEvent", "qry": "pageList", "params": ["getVal('appID')"] }
            ],
            "onSelect": [
                { "action": "setVal('pageID', {{this.id}})" }
            ]
        }
    }))
}

/// A page whose layout nests a grid `comp2` two levels deep.
pub fn nested_page() -> EventType {
    event_type(json!({
        "eventType": "studioPage",
        "category": "page",
        "components": [
            {
                "id": "column1",
                "components": [
                    {
                        "id": "comp2",
                        "category": "grid",
                        "workflowTriggers": {
                            "onRefresh": [
                                { "action": "execEvent", "qry": "eventTypeList", "params": ["getVal('pageID')"] }
                            ]
                        }
                    }
                ]
            }
        ]
    }))
}

/// The three fixtures above.
pub fn studio_event_types() -> Vec<EventType> {
    vec![app_selector(), page_list(), nested_page()]
}

/// A YAML document declaring `studio_event_types`.
pub fn studio_document_yaml() -> String {
    r#"
dsl_version: "1.0"
event_types:
  - eventType: selectApp
    category: selector
    qry: appList
    workflowTriggers:
      onLoad: [execApps]
      onSelectionChange:
        - action: "setVal('appID', {{this.selected.value}})"
        - action: "refresh(['pageList'])"
  - eventType: pageList
    category: grid
    qry: pageList
    workflowTriggers:
      onRefresh:
        - action: execEvent
          qry: pageList
          params: ["getVal('appID')"]
"#
    .to_string()
}
