//! In-memory implementation of the ContextStore interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use trellis_core::{ContextStore, EngineError, Tuple};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Storage key the backend query layer expects for a logical name
pub fn storage_key(name: &str) -> String {
    format!(":{}", name)
}

/// A change to one context entry; `value` is `None` when it was cleared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChange {
    /// Logical name
    pub name: String,
    /// New value
    pub value: Option<Value>,
}

/// In-memory ContextStore with change notifications
#[derive(Clone)]
pub struct InMemoryContextStore {
    values: Arc<RwLock<HashMap<String, Value>>>,
    changes: broadcast::Sender<ContextChange>,
}

impl InMemoryContextStore {
    /// Create an empty store
    pub fn new() -> Self {
        info!("Creating new InMemoryContextStore");
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            values: Arc::new(RwLock::new(HashMap::new())),
            changes,
        }
    }

    /// Create a store seeded with values; `null` values are skipped
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let values: HashMap<String, Value> = values
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .filter(|(_, v)| !v.is_null())
            .collect();
        info!("Creating InMemoryContextStore with {} values", values.len());
        Self {
            values: Arc::new(RwLock::new(values)),
            changes,
        }
    }

    /// Receive every subsequent change
    pub fn subscribe(&self) -> broadcast::Receiver<ContextChange> {
        self.changes.subscribe()
    }

    /// Copy of all current values keyed by logical name
    pub async fn snapshot(&self) -> HashMap<String, Value> {
        self.values.read().await.clone()
    }

    /// Number of entries
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }

    fn publish(&self, name: &str, value: Option<Value>) {
        // No subscribers is not an error
        let _ = self.changes.send(ContextChange {
            name: name.to_string(),
            value,
        });
    }
}

impl Default for InMemoryContextStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn get_val(&self, name: &str) -> Result<Option<Tuple>, EngineError> {
        let values = self.values.read().await;
        Ok(values.get(name).map(|value| (storage_key(name), value.clone())))
    }

    async fn set_val(&self, name: &str, value: Value) -> Result<(), EngineError> {
        {
            let mut values = self.values.write().await;
            if value.is_null() {
                values.remove(name);
            } else {
                values.insert(name.to_string(), value.clone());
            }
        }

        debug!("Set context value {}", name);
        self.publish(name, (!value.is_null()).then_some(value));
        Ok(())
    }

    async fn clear_vals(&self, names: &[String]) -> Result<(), EngineError> {
        let mut removed = Vec::new();
        {
            let mut values = self.values.write().await;
            for name in names {
                if values.remove(name).is_some() {
                    removed.push(name.as_str());
                }
            }
        }

        debug!("Cleared context values {:?}", removed);
        for name in removed {
            self.publish(name, None);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_returns_storage_key_tuple() {
        let store = InMemoryContextStore::with_values([("appID", json!("studio"))]);
        assert_eq!(
            store.get_val("appID").await.unwrap(),
            Some((":appID".to_string(), json!("studio")))
        );
        assert_eq!(store.get_val("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_null_clears() {
        let store = InMemoryContextStore::new();
        store.set_val("pageID", json!(3)).await.unwrap();
        assert_eq!(store.len().await, 1);

        store.set_val("pageID", Value::Null).await.unwrap();
        assert!(store.is_empty().await);
        assert_eq!(store.get_val("pageID").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_vals_ignores_missing_names() {
        let store = InMemoryContextStore::with_values([("a", json!(1)), ("b", json!(2)), ("c", json!(3))]);
        store
            .clear_vals(&["a".to_string(), "c".to_string(), "zzz".to_string()])
            .await
            .unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("b"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_change_notifications() {
        let store = InMemoryContextStore::new();
        let mut changes = store.subscribe();

        store.set_val("appID", json!("studio")).await.unwrap();
        store.clear_vals(&["appID".to_string(), "never-set".to_string()]).await.unwrap();

        assert_eq!(
            changes.recv().await.unwrap(),
            ContextChange { name: "appID".into(), value: Some(json!("studio")) }
        );
        assert_eq!(
            changes.recv().await.unwrap(),
            ContextChange { name: "appID".into(), value: None }
        );
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = InMemoryContextStore::new();
        let other = store.clone();
        other.set_val("x", json!(true)).await.unwrap();
        assert_eq!(store.get_val("x").await.unwrap().map(|(_, v)| v), Some(json!(true)));
    }
}
