//! Refresh target resolution
//!
//! A refresh target is either a registered EventType key or the `id` of a
//! component nested anywhere inside a registered EventType's component tree.
//!
//! Refreshes nest: a target's `onRefresh` may refresh further targets. The ids
//! on the current chain are tracked per task, and a target already on the
//! chain is skipped, so cyclic documents terminate.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::orchestrator::{extend_data, WorkflowEngine};
use crate::domain::event_type::{triggers, EventType};

tokio::task_local! {
    static REFRESH_CHAIN: Vec<String>;
}

/// Ids currently being refreshed on this task, outermost first
pub fn active_refreshes() -> Vec<String> {
    REFRESH_CHAIN.try_with(|chain| chain.clone()).unwrap_or_default()
}

/// Target ids from a string or an array of strings
pub fn target_ids(value: &Value) -> Vec<String> {
    match value {
        Value::String(id) => vec![id.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item.as_str() {
                Some(id) => Some(id.to_string()),
                None => {
                    warn!("Ignoring non-string refresh target: {}", item);
                    None
                }
            })
            .collect(),
        other => {
            warn!("Refresh targets must be a string or an array, got {}", other);
            Vec::new()
        }
    }
}

impl WorkflowEngine {
    /// Locate a refresh target: registry key first, then component `id`
    pub fn find_target(&self, id: &str) -> Option<EventType> {
        if let Some(event_type) = self.event_type(id) {
            return Some(event_type);
        }
        self.registry
            .iter()
            .find_map(|entry| entry.value().find_component(id).cloned())
    }

    /// Re-run `onRefresh` on each target and push the result into its handle
    ///
    /// Missing targets, targets without `onRefresh`, targets already being
    /// refreshed further up the chain and missing handles are logged and
    /// skipped; refresh never fails.
    pub fn refresh<'a>(&'a self, targets: &'a [String], context: &'a Value) -> BoxFuture<'a, ()> {
        async move {
            info!("Refreshing components: {:?}", targets);
            let chain = active_refreshes();
            for id in targets {
                if chain.contains(id) {
                    warn!("Refresh of '{}' is already in progress ({:?}); skipping", id, chain);
                    continue;
                }
                let Some(target) = self.find_target(id) else {
                    warn!("Refresh target '{}' not found", id);
                    continue;
                };
                if !target.has_trigger(triggers::ON_REFRESH) {
                    warn!("Refresh target '{}' has no onRefresh trigger", id);
                    continue;
                }

                let data = extend_data(context, "componentId", Value::String(id.clone()));
                let mut nested = chain.clone();
                nested.push(id.clone());
                let report = REFRESH_CHAIN
                    .scope(nested, self.execute_trigger(&target, triggers::ON_REFRESH, data))
                    .await;

                let Some(result) = report.into_result() else {
                    debug!("onRefresh for '{}' produced no data", id);
                    continue;
                };
                match self.component(id) {
                    Some(handle) => {
                        handle.update_data(result);
                        debug!("Refreshed {} with new data", id);
                    }
                    None => warn!("No component reference for '{}' to update", id),
                }
            }
        }
        .boxed()
    }
}
