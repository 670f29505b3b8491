//! In-memory context store for the Trellis engine
//!
//! This crate provides an in-memory implementation of the `ContextStore`
//! contract defined in trellis-core. It is meant for development, tests and
//! the runner; a real application binds its own store.

pub mod context_store;

pub use context_store::{storage_key, ContextChange, InMemoryContextStore};
