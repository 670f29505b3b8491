//! Document model

use serde::{Deserialize, Serialize};
use trellis_core::EventType;

/// The only document version this crate reads
pub const SUPPORTED_DSL_VERSION: &str = "1.0";

/// A versioned list of EventType definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTypeDocument {
    /// Document format version
    pub dsl_version: String,

    /// EventTypes in declaration order
    #[serde(default)]
    pub event_types: Vec<EventType>,
}

impl EventTypeDocument {
    /// Registry keys in declaration order; entries without identity are skipped
    pub fn keys(&self) -> Vec<&str> {
        self.event_types.iter().filter_map(EventType::key).collect()
    }

    /// Hand the EventTypes over for registration
    pub fn into_event_types(self) -> Vec<EventType> {
        self.event_types
    }
}
