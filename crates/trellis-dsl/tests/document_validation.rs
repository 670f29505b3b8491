use pretty_assertions::assert_eq;
use trellis_dsl::validation::error_codes;
use trellis_dsl::{parse_and_validate_document, parse_and_validate_json_document, DslError};

fn codes(err: &DslError) -> Vec<(&'static str, String)> {
    err.validation_errors()
        .into_iter()
        .map(|e| (e.code, e.path.clone().unwrap_or_default()))
        .collect()
}

#[test]
fn test_valid_studio_document() {
    let yaml = r#"
    dsl_version: "1.0"
    event_types:
      - eventType: selectApp
        workflowTriggers:
          onSelectionChange:
            - action: "setVal('appID', {{this.selected.value}})"
            - action: "refresh(['pageList'])"
      - eventType: pageList
        qry: pageList
        workflowTriggers:
          onRefresh:
            - action: execEvent
              qry: pageList
              params: ["getVal('appID')"]
          onSelect:
            - action: "setVal('pageID', {{this.id}})"
            - action: refresh
              target: comp2
      - eventType: studioPage
        components:
          - id: column1
            components:
              - id: comp2
                eventType: eventTypeList
                workflowTriggers:
                  onRefresh:
                    - execEvent
    "#;

    let document = parse_and_validate_document(yaml).unwrap();
    assert_eq!(document.keys(), vec!["selectApp", "pageList", "studioPage"]);
    assert!(document.event_types[2].find_component("comp2").is_some());
}

#[test]
fn test_all_problems_are_reported_together() {
    let yaml = r#"
    dsl_version: "1.0"
    event_types:
      - eventType: grid
        workflowTriggers:
          onLoad: execEvent
          onSelect:
            - 42
            - action: "setVal('a', 1"
            - action: "refresh(['missing'])"
      - eventType: grid
      - qry: orphan
    "#;

    let err = parse_and_validate_document(yaml).unwrap_err();
    assert_eq!(err.error_code(), "ERR_DSL_VALIDATION_MULTIPLE");
    assert_eq!(
        codes(&err),
        vec![
            (error_codes::DUPLICATE_ID, "event_types[1]".to_string()),
            (error_codes::MISSING_REQUIRED_FIELD, "event_types[2]".to_string()),
            (error_codes::INVALID_TRIGGER, "event_types[0].workflowTriggers.onLoad".to_string()),
            (error_codes::INVALID_ACTION, "event_types[0].workflowTriggers.onSelect[0]".to_string()),
            (error_codes::INVALID_EXPRESSION, "event_types[0].workflowTriggers.onSelect[1]".to_string()),
            (error_codes::INVALID_REFERENCE, "event_types[0].workflowTriggers.onSelect[2]".to_string()),
        ]
    );
}

#[test]
fn test_single_problem_keeps_its_code() {
    let yaml = r#"
    dsl_version: "1.0"
    event_types:
      - eventType: form
        workflowTriggers:
          onCreate:
            - action: refresh
              targets: [nowhere]
    "#;

    let err = parse_and_validate_document(yaml).unwrap_err();
    assert_eq!(err.error_code(), error_codes::INVALID_REFERENCE);
    assert!(err.to_string().contains("'nowhere'"));
}

#[test]
fn test_nested_component_triggers_are_checked() {
    let yaml = r#"
    dsl_version: "1.0"
    event_types:
      - eventType: page
        components:
          - id: inner
            workflowTriggers:
              onRefresh:
                - action: "execEvent(,)"
    "#;

    let err = parse_and_validate_document(yaml).unwrap_err();
    assert_eq!(
        codes(&err),
        vec![(
            error_codes::INVALID_EXPRESSION,
            "event_types[0].components[0].workflowTriggers.onRefresh[0]".to_string()
        )]
    );
}

#[test]
fn test_json_documents() {
    let json = r#"{
        "dsl_version": "1.0",
        "event_types": [
            {"name": "appSelector", "workflowTriggers": {"onLoad": ["execApps"]}}
        ]
    }"#;

    let document = parse_and_validate_json_document(json).unwrap();
    assert_eq!(document.keys(), vec!["appSelector"]);

    let err = parse_and_validate_json_document("{\"dsl_version\": \"0.9\"}").unwrap_err();
    assert_eq!(err.error_code(), "ERR_DSL_UNSUPPORTED_VERSION");
}
