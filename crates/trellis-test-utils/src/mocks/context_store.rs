//! Mock implementation of the ContextStore trait.

use async_trait::async_trait;
use mockall::mock;
use serde_json::{Map, Value};

use trellis_core::{ContextStore, EngineError, Tuple};

mock! {
    pub ContextStore {}

    #[async_trait]
    impl ContextStore for ContextStore {
        async fn get_val(&self, name: &str) -> Result<Option<Tuple>, EngineError>;
        async fn set_val(&self, name: &str, value: Value) -> Result<(), EngineError>;
        async fn clear_vals(&self, names: &[String]) -> Result<(), EngineError>;
        async fn set_vals(&self, values: Map<String, Value>) -> Result<(), EngineError>;
    }
}

/// A mock store that answers every lookup with `(":<name>", value)` from
/// `values` and accepts every write.
pub fn create_mock_context_store(values: Vec<(&'static str, Value)>) -> MockContextStore {
    let mut mock = MockContextStore::new();

    mock.expect_get_val().returning(move |name| {
        Ok(values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(key, value)| (format!(":{}", key), value.clone())))
    });
    mock.expect_set_val().returning(|_, _| Ok(()));
    mock.expect_clear_vals().returning(|_| Ok(()));
    mock.expect_set_vals().returning(|_| Ok(()));

    mock
}
