mod common;

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use common::{init_tracing, Harness};
use trellis_core::{ActionOutcome, ContextStore, EngineConfig, EngineError, HandlerCall, WorkflowEngine};
use trellis_test_utils::fixtures::{self, event_type};
use trellis_test_utils::mocks::{create_mock_context_store, MockApiClient};
use trellis_test_utils::{assert_statuses, CallLog, RecordingHandler};

#[tokio::test]
async fn test_actions_run_in_declaration_order() {
    init_tracing();
    let log = CallLog::new();
    let harness = Harness::with(|builder| {
        builder
            .with_handler("first", RecordingHandler::returning("first", None).with_log(log.clone()).shared())
            .with_handler("second", RecordingHandler::returning("second", None).with_log(log.clone()).shared())
            .with_handler("third", RecordingHandler::returning("third", None).with_log(log.clone()).shared())
    })
    .await;

    let grid = event_type(json!({
        "eventType": "grid",
        "workflowTriggers": {
            "onLoad": ["first", { "action": "second" }, { "action": "third('x')" }]
        }
    }));

    let report = harness.engine.execute_trigger(&grid, "onLoad", json!({})).await;
    assert_statuses(&report, &["completed", "completed", "completed"]);
    assert_eq!(log.entries(), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_failure_does_not_stop_the_trigger() {
    let ok = RecordingHandler::returning("ok", Some(json!(1))).shared();
    let after = RecordingHandler::returning("after", None).shared();
    let harness = Harness::with(|builder| {
        builder
            .with_handler("ok", ok.clone())
            .with_handler("boom", RecordingHandler::failing("boom", EngineError::ExternalDependencyError("503".into())).shared())
            .with_handler("after", after.clone())
    })
    .await;

    let grid = event_type(json!({
        "eventType": "grid",
        "workflowTriggers": { "onLoad": ["ok", "boom", "after"] }
    }));

    let report = harness.engine.execute_trigger(&grid, "onLoad", json!({})).await;
    assert_statuses(&report, &["completed", "failed", "completed"]);
    assert_eq!(after.calls().len(), 1);
    assert_eq!(report.result(), Some(&json!(1)));

    match &report.steps[1].outcome {
        ActionOutcome::Failed { error } => assert_eq!(error.error_code(), "ERR_ENGINE_DOWNSTREAM"),
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_last_defined_result_wins() {
    let harness = Harness::with(|builder| {
        builder
            .with_handler("a", RecordingHandler::returning("a", Some(json!("from a"))).shared())
            .with_handler("b", RecordingHandler::returning("b", Some(json!("from b"))).shared())
            .with_handler("none", RecordingHandler::returning("none", None).shared())
    })
    .await;

    let grid = event_type(json!({
        "eventType": "grid",
        "workflowTriggers": { "onLoad": ["a", "b", "none"] }
    }));

    let report = harness.engine.execute_trigger(&grid, "onLoad", json!({})).await;
    assert_eq!(report.into_result(), Some(json!("from b")));
}

#[tokio::test]
async fn test_unknown_actions_are_skipped() {
    let tail = RecordingHandler::returning("tail", Some(json!("done"))).shared();
    let harness = Harness::with(|builder| builder.with_handler("tail", tail.clone())).await;

    let grid = event_type(json!({
        "eventType": "grid",
        "workflowTriggers": {
            "onLoad": ["noSuchHandler", { "action": "alsoMissing" }, 42, { "noAction": true }, "tail"]
        }
    }));

    let report = harness.engine.execute_trigger(&grid, "onLoad", json!({})).await;
    assert_statuses(&report, &["skipped", "skipped", "skipped", "skipped", "completed"]);
    assert!(!report.has_failures());
    assert_eq!(report.result(), Some(&json!("done")));
}

#[tokio::test]
async fn test_unknown_method_in_call_expression_fails() {
    let harness = Harness::new().await;
    let grid = event_type(json!({
        "eventType": "grid",
        "workflowTriggers": { "onLoad": [{ "action": "noSuchMethod('a')" }, { "action": "setVal('ran', true)" }] }
    }));

    let report = harness.engine.execute_trigger(&grid, "onLoad", json!({})).await;
    assert_statuses(&report, &["failed", "completed"]);
    assert_eq!(harness.context("ran").await, Some(json!(true)));
}

#[tokio::test]
async fn test_non_array_binding_is_a_noop() {
    let harness = Harness::new().await;
    let grid = event_type(json!({
        "eventType": "grid",
        "workflowTriggers": { "onLoad": "execApps" }
    }));

    let report = harness.engine.execute_trigger(&grid, "onLoad", json!({})).await;
    assert!(report.is_empty());
    assert!(harness.api.calls().is_empty());
}

#[tokio::test]
async fn test_selection_stores_value_and_refreshes_page_list() {
    init_tracing();
    let harness = Harness::new().await;
    harness.engine.register_event_types(fixtures::studio_event_types());

    let report = harness
        .engine
        .fire("selectApp", "onSelectionChange", json!({ "selected": { "value": "studio", "label": "Studio" } }))
        .await
        .unwrap();

    assert_statuses(&report, &["completed", "completed"]);
    assert_eq!(harness.context("appID").await, Some(json!("studio")));
    assert_eq!(harness.api.calls_to("pageList"), vec![json!({ ":appID": "studio" })]);
}

#[tokio::test]
async fn test_numeric_template_values_stay_numbers() {
    let harness = Harness::new().await;
    harness.engine.register_event_types(fixtures::studio_event_types());

    harness.engine.fire("pageList", "onSelect", json!({ "id": 5 })).await.unwrap();
    assert_eq!(harness.context("pageID").await, Some(json!(5)));
}

#[tokio::test]
async fn test_template_values_round_trip_exactly() {
    let harness = Harness::new().await;
    harness.store.set_val("x", json!("kept")).await.unwrap();
    let grid = event_type(json!({
        "eventType": "grid",
        "workflowTriggers": {
            "onChange": [{ "action": "setVal('big', {{this.big}})" }, { "action": "setVal('x', {{this.v}})" }]
        }
    }));

    let report = harness
        .engine
        .execute_trigger(&grid, "onChange", json!({ "big": u64::MAX, "v": null }))
        .await;

    assert_statuses(&report, &["completed", "failed"]);
    assert_eq!(harness.context("big").await, Some(json!(u64::MAX)));
    assert_eq!(harness.context("x").await, Some(json!("kept")));
}

#[tokio::test]
async fn test_missing_context_value_contributes_no_param() {
    let harness = Harness::new().await;
    harness.engine.register_event_types(fixtures::studio_event_types());

    let report = harness.engine.fire("pageList", "onRefresh", json!({})).await.unwrap();
    assert_statuses(&report, &["completed"]);
    assert_eq!(harness.api.calls_to("pageList"), vec![json!({})]);
}

#[tokio::test]
async fn test_fire_requires_registration() {
    let harness = Harness::new().await;
    let err = harness.engine.fire("missing", "onLoad", json!({})).await.unwrap_err();
    assert_eq!(err.error_code(), "ERR_ENGINE_VALIDATION");
}

#[tokio::test]
async fn test_actions_fail_before_initialize() {
    let engine = WorkflowEngine::new();
    let selector = fixtures::app_selector();

    let report = engine
        .execute_trigger(&selector, "onSelectionChange", json!({ "selected": { "value": "studio" } }))
        .await;
    match &report.steps[0].outcome {
        ActionOutcome::Failed { error } => assert_eq!(error.error_code(), "ERR_ENGINE_NOT_INITIALIZED"),
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_action_times_out_and_trigger_continues() {
    let config = EngineConfig {
        action_timeout_ms: 50,
        ..EngineConfig::default()
    };
    let slow = RecordingHandler::returning("slow", Some(json!("late")))
        .with_delay(Duration::from_secs(5))
        .shared();
    let harness = Harness::with(|builder| builder.with_config(config).with_handler("slow", slow.clone())).await;

    let grid = event_type(json!({
        "eventType": "grid",
        "workflowTriggers": { "onLoad": ["slow", { "action": "setVal('after', 1)" }] }
    }));

    let report = harness.engine.execute_trigger(&grid, "onLoad", json!({})).await;
    assert_statuses(&report, &["failed", "completed"]);
    assert_eq!(
        report.steps[0].outcome,
        ActionOutcome::Failed { error: EngineError::Timeout(50) }
    );
    assert_eq!(report.result(), None);
    assert_eq!(harness.context("after").await, Some(json!(1)));
}

#[tokio::test]
async fn test_on_success_receives_the_response() {
    let harness = Harness::with(|builder| {
        builder.with_handler("save", RecordingHandler::returning("save", Some(json!({ "id": 9 }))).shared())
    })
    .await;

    let form = event_type(json!({
        "eventType": "form",
        "workflowTriggers": {
            "onCreate": ["save"],
            "onSuccess": [{ "action": "setVal('savedID', {{this.response.id}})" }],
            "onError": [{ "action": "setVal('failed', true)" }]
        }
    }));

    let report = harness.engine.handle_create(&form, json!({ "title": "new" })).await;
    assert_statuses(&report, &["completed", "completed"]);
    assert_eq!(report.steps[1].trigger, "onSuccess");
    assert_eq!(report.result(), Some(&json!({ "id": 9 })));
    assert_eq!(harness.context("savedID").await, Some(json!(9)));
    assert_eq!(harness.context("failed").await, None);
}

#[tokio::test]
async fn test_on_error_receives_the_message() {
    let error = EngineError::ExternalDependencyError("row 'x' is locked".into());
    let harness = Harness::with(|builder| {
        builder.with_handler("save", RecordingHandler::failing("save", error.clone()).shared())
    })
    .await;

    let form = event_type(json!({
        "eventType": "form",
        "workflowTriggers": {
            "onUpdate": ["save"],
            "onSuccess": [{ "action": "setVal('saved', true)" }],
            "onError": [{ "action": "setVal('lastError', {{this.error}})" }]
        }
    }));

    let report = harness.engine.handle_form_submit(&form, json!({ "id": 1 })).await;
    assert_statuses(&report, &["failed", "completed"]);
    assert_eq!(harness.context("lastError").await, Some(Value::String(error.to_string())));
    assert_eq!(harness.context("saved").await, None);
}

#[tokio::test]
async fn test_skipped_steps_still_count_as_success() {
    let harness = Harness::new().await;
    let form = event_type(json!({
        "eventType": "form",
        "workflowTriggers": {
            "onDelete": ["notRegistered"],
            "onSuccess": [{ "action": "setVal('deleted', {{this.id}})" }]
        }
    }));

    let report = harness.engine.handle_delete(&form, json!({ "id": 3 })).await;
    assert_statuses(&report, &["skipped", "completed"]);
    assert_eq!(harness.context("deleted").await, Some(json!(3)));
}

#[tokio::test]
async fn test_row_click_passes_the_row() {
    let on_select = RecordingHandler::returning("pick", None).shared();
    let harness = Harness::with(|builder| builder.with_handler("pick", on_select.clone())).await;
    let grid = event_type(json!({
        "eventType": "grid",
        "qry": "gridQuery",
        "workflowTriggers": { "onSelect": ["pick"] }
    }));

    harness.engine.handle_row_click(&grid, json!({ "id": 4 })).await;
    assert_eq!(
        on_select.calls(),
        vec![HandlerCall::Named { subject: "gridQuery".into(), data: json!({ "id": 4 }) }]
    );
}

#[tokio::test]
async fn test_params_resolve_against_a_mocked_store() {
    let store = create_mock_context_store(vec![("appID", json!("studio"))]);

    let mut api = MockApiClient::new();
    api.expect_exec_event()
        .withf(|event, params| event.to_string() == "pageList" && params == &json!({ ":appID": "studio" }))
        .times(1)
        .returning(|_, _| Ok(json!({ "rows": [{ "id": 1 }] })));

    let engine = WorkflowEngine::builder().with_builtins().with_api_client(Arc::new(api)).build();
    engine.initialize(Arc::new(store)).await;
    engine.register_event_types(vec![fixtures::page_list()]);

    let report = engine.fire("pageList", "onRefresh", json!({})).await.unwrap();
    assert_eq!(report.result(), Some(&json!({ "rows": [{ "id": 1 }] })));
    assert_eq!(
        engine.resolve_params(&json!(["getVal('appID')", "getVal('missing')"])).await.unwrap(),
        json!({ ":appID": "studio" })
    );
}
