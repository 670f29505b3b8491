//! Mock implementations of the Trellis collaborator contracts.
//!
//! Generated with mockall so tests can set per-call expectations.

pub mod api_client;
pub mod context_store;

pub use api_client::*;
pub use context_store::*;
