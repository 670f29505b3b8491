//! Context store contract
//!
//! The shared key/value context that actions read from and write to. Every
//! entry is addressed by a logical parameter name and also carries the storage
//! key the backend query layer expects, which is why lookups return a tuple.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::EngineError;

/// `(storage_key, value)` as returned by a context lookup
pub type Tuple = (String, Value);

/// A key/value store shared between the engine and the rendering layer
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Look up a value by logical name
    async fn get_val(&self, name: &str) -> Result<Option<Tuple>, EngineError>;

    /// Store a value under a logical name
    async fn set_val(&self, name: &str, value: Value) -> Result<(), EngineError>;

    /// Remove the given names
    async fn clear_vals(&self, names: &[String]) -> Result<(), EngineError>;

    /// Store several values in map order
    async fn set_vals(&self, values: Map<String, Value>) -> Result<(), EngineError> {
        tracing::debug!("Using default set_vals implementation ({} values)", values.len());
        for (name, value) in values {
            self.set_val(&name, value).await?;
        }
        Ok(())
    }
}
