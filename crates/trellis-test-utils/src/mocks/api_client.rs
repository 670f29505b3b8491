//! Mock implementations of the ApiClient and ComponentHandle traits.

use async_trait::async_trait;
use mockall::mock;
use serde_json::{json, Value};

use trellis_core::{ApiClient, ComponentHandle, EngineError};

mock! {
    pub ApiClient {}

    #[async_trait]
    impl ApiClient for ApiClient {
        async fn exec_event(&self, event: &str, params: Value) -> Result<Value, EngineError>;
        async fn exec_dml(&self, request: Value) -> Result<Value, EngineError>;
        async fn exec_apps(&self) -> Result<Value, EngineError>;
        async fn exec_pages(&self, app_id: &Value) -> Result<Value, EngineError>;
    }
}

mock! {
    pub ComponentHandle {}

    impl ComponentHandle for ComponentHandle {
        fn update_data(&self, data: Value);
    }
}

/// A mock client whose every call succeeds with an empty row set.
pub fn create_mock_api_client() -> MockApiClient {
    let mut mock = MockApiClient::new();

    mock.expect_exec_event()
        .returning(|event, _| Ok(json!({ "event": event, "rows": [] })));
    mock.expect_exec_dml()
        .returning(|_| Ok(json!({ "success": true })));
    mock.expect_exec_apps()
        .returning(|| Ok(json!({ "table": "studio_apps", "rows": [] })));
    mock.expect_exec_pages()
        .returning(|_| Ok(json!({ "table": "studio_pages", "rows": [] })));

    mock
}
