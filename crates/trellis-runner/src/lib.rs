//! Fire a single trigger from an EventType document
//!
//! The runner wires the pieces together the way an embedding application
//! would: configuration, logging, a parsed and validated document, an
//! in-memory context store and an engine with the built-in handlers.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

use trellis_core::{EngineConfig, TriggerReport, WorkflowEngine};
use trellis_dsl::{parse_and_validate_document, parse_and_validate_json_document, EventTypeDocument};
use trellis_state_inmemory::InMemoryContextStore;

/// Path of the EventType document (`.json`, otherwise YAML)
pub const ENV_DOCUMENT: &str = "TRELLIS_DOCUMENT";
/// EventType to fire
pub const ENV_EVENT_TYPE: &str = "TRELLIS_EVENT_TYPE";
/// Trigger name, `onLoad` when unset
pub const ENV_TRIGGER: &str = "TRELLIS_TRIGGER";
/// Event data as JSON
pub const ENV_DATA: &str = "TRELLIS_DATA";
/// Initial context values as a JSON object
pub const ENV_SEED: &str = "TRELLIS_SEED";
/// Optional YAML engine configuration file
pub const ENV_CONFIG: &str = "TRELLIS_CONFIG";

/// What to fire
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    /// Document location
    pub document_path: PathBuf,
    /// EventType key
    pub event_type: String,
    /// Trigger name
    pub trigger: String,
    /// Event data
    pub data: Value,
    /// Initial context
    pub seed: Map<String, Value>,
}

impl RunRequest {
    /// Read the request from any name → value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let document_path = lookup(ENV_DOCUMENT)
            .map(PathBuf::from)
            .with_context(|| format!("{} must name an EventType document", ENV_DOCUMENT))?;
        let event_type = lookup(ENV_EVENT_TYPE).with_context(|| format!("{} is required", ENV_EVENT_TYPE))?;
        let trigger = lookup(ENV_TRIGGER).unwrap_or_else(|| trellis_core::triggers::ON_LOAD.to_string());

        let data = match lookup(ENV_DATA) {
            Some(raw) => serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", ENV_DATA))?,
            None => Value::Object(Map::new()),
        };

        let seed = match lookup(ENV_SEED) {
            Some(raw) => match serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", ENV_SEED))? {
                Value::Object(values) => values,
                other => bail!("{} must be a JSON object, got {}", ENV_SEED, other),
            },
            None => Map::new(),
        };

        Ok(Self {
            document_path,
            event_type,
            trigger,
            data,
            seed,
        })
    }
}

/// The report plus the context as it stood afterwards
#[derive(Debug, Serialize)]
pub struct RunOutput {
    /// Per-action outcomes
    pub report: TriggerReport,
    /// Context values by logical name
    pub context: HashMap<String, Value>,
}

/// Filter used while the configuration itself is being loaded
pub const BOOTSTRAP_LOG_FILTER: &str = "warn";

/// Load engine configuration: the YAML file named by `config_path` if any,
/// then environment overrides
pub fn load_config(config_path: Option<&Path>) -> Result<EngineConfig> {
    match config_path {
        Some(_) => load_config_from(config_path, |name| std::env::var(name).ok()),
        None => Ok(EngineConfig::load()),
    }
}

/// [`load_config`] with overrides read from `lookup`
pub fn load_config_from<F>(config_path: Option<&Path>, lookup: F) -> Result<EngineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match config_path {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
            EngineConfig::from_yaml(&yaml).with_context(|| format!("Invalid configuration file {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    Ok(config.with_overrides(lookup))
}

/// Subscriber for the messages logged before [`init_logging`] runs
///
/// Install it with `tracing::subscriber::with_default` around configuration
/// loading so rejected override values are still reported.
pub fn bootstrap_subscriber<W>(writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt()
        .with_env_filter(EnvFilter::new(BOOTSTRAP_LOG_FILTER))
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer)
        .finish()
}

/// Install the global subscriber with the configured filter
///
/// `RUST_LOG`, when set, takes precedence.
pub fn init_logging(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    fmt().with_env_filter(filter).with_target(true).init();
}

/// Read and validate a document from disk
pub fn load_document(path: &Path) -> Result<EventTypeDocument> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read EventType document {}", path.display()))?;

    let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
    let document = if is_json {
        parse_and_validate_json_document(&source)
    } else {
        parse_and_validate_document(&source)
    };
    document.with_context(|| format!("Invalid EventType document {}", path.display()))
}

/// Register `document`, seed the context and fire the requested trigger
pub async fn run(document: EventTypeDocument, request: &RunRequest, config: EngineConfig) -> Result<RunOutput> {
    let engine = WorkflowEngine::builder().with_builtins().with_config(config).build();

    let store = InMemoryContextStore::with_values(request.seed.clone());
    engine.initialize(Arc::new(store.clone())).await;

    let registered = engine.register_event_types(document.into_event_types());
    info!("Registered {} event types", registered);

    let report = engine
        .fire(&request.event_type, &request.trigger, request.data.clone())
        .await
        .with_context(|| format!("Failed to fire {}.{}", request.event_type, request.trigger))?;

    Ok(RunOutput {
        report,
        context: store.snapshot().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_request_defaults() {
        let request =
            RunRequest::from_lookup(lookup(&[(ENV_DOCUMENT, "app.yaml"), (ENV_EVENT_TYPE, "pageList")])).unwrap();
        assert_eq!(request.document_path, PathBuf::from("app.yaml"));
        assert_eq!(request.trigger, "onLoad");
        assert_eq!(request.data, json!({}));
        assert!(request.seed.is_empty());
    }

    #[test]
    fn test_request_rejects_bad_input() {
        assert!(RunRequest::from_lookup(lookup(&[(ENV_EVENT_TYPE, "x")])).is_err());
        assert!(RunRequest::from_lookup(lookup(&[(ENV_DOCUMENT, "a"), (ENV_EVENT_TYPE, "x"), (ENV_DATA, "{")])).is_err());
        assert!(RunRequest::from_lookup(lookup(&[(ENV_DOCUMENT, "a"), (ENV_EVENT_TYPE, "x"), (ENV_SEED, "[1]")])).is_err());
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_rejected_overrides_are_logged_during_bootstrap() {
        let captured = Captured::default();
        let writer = captured.clone();
        let overrides = lookup(&[(trellis_core::config::ENV_ACTION_TIMEOUT_MS, "soon")]);

        let config = tracing::subscriber::with_default(bootstrap_subscriber(move || writer.clone()), || {
            load_config_from(None, overrides)
        })
        .unwrap();

        assert_eq!(config, EngineConfig::default());
        let logged = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("Invalid TRELLIS_ACTION_TIMEOUT_MS value: soon"), "{}", logged);
        assert!(!logged.contains("Engine configuration"), "{}", logged);
    }

    #[tokio::test]
    async fn test_run_updates_context() {
        let document = parse_and_validate_document(
            r#"
            dsl_version: "1.0"
            event_types:
              - eventType: selectApp
                workflowTriggers:
                  onSelectionChange:
                    - action: "setVal('appID', {{this.selected.value}})"
                    - action: "clearVals('pageID')"
            "#,
        )
        .unwrap();

        let request = RunRequest {
            document_path: PathBuf::from("inline.yaml"),
            event_type: "selectApp".to_string(),
            trigger: "onSelectionChange".to_string(),
            data: json!({"selected": {"value": "studio"}}),
            seed: json!({"pageID": 7}).as_object().cloned().unwrap(),
        };

        let output = run(document, &request, EngineConfig::default()).await.unwrap();
        assert!(!output.report.has_failures());
        assert_eq!(output.context, HashMap::from([("appID".to_string(), json!("studio"))]));
    }

    #[tokio::test]
    async fn test_run_studio_document() {
        let document = parse_and_validate_document(&trellis_test_utils::fixtures::studio_document_yaml()).unwrap();
        let request = RunRequest {
            document_path: PathBuf::from("studio.yaml"),
            event_type: "selectApp".to_string(),
            trigger: "onSelectionChange".to_string(),
            data: json!({"selected": {"value": "crm"}}),
            seed: Map::new(),
        };

        // No API client is configured, so the refreshed query fails inside the
        // refresh pass while the trigger's own steps complete
        let output = run(document, &request, EngineConfig::default()).await.unwrap();
        assert_eq!(output.report.steps.len(), 2);
        assert!(!output.report.has_failures());
        assert_eq!(output.context.get("appID"), Some(&json!("crm")));
    }

    #[tokio::test]
    async fn test_run_unknown_event_type() {
        let document = parse_and_validate_document("dsl_version: \"1.0\"\nevent_types: []").unwrap();
        let request = RunRequest {
            document_path: PathBuf::from("inline.yaml"),
            event_type: "missing".to_string(),
            trigger: "onLoad".to_string(),
            data: json!({}),
            seed: Map::new(),
        };
        assert!(run(document, &request, EngineConfig::default()).await.is_err());
    }
}
