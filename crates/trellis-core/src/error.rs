use thiserror::Error;

/// Core error type for the Trellis engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No handler is registered under the requested name
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// A call expression could not be parsed or evaluated
    #[error("Expression evaluation error: {0}")]
    ExpressionError(String),

    /// Handler arguments did not have the expected shape
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The context store has not been bound with `initialize`
    #[error("Engine not initialized: {0}")]
    NotInitialized(String),

    /// The context store rejected an operation
    #[error("Context store error: {0}")]
    ContextStoreError(String),

    /// An external collaborator (API, database) failed
    #[error("External dependency error: {0}")]
    ExternalDependencyError(String),

    /// An action exceeded the configured time budget
    #[error("Action timed out after {0} ms")]
    Timeout(u64),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Stable code for reports and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::UnknownAction(_) => "ERR_ENGINE_UNKNOWN_ACTION",
            EngineError::ExpressionError(_) => "ERR_ENGINE_EXPRESSION",
            EngineError::ValidationError(_) => "ERR_ENGINE_VALIDATION",
            EngineError::NotInitialized(_) => "ERR_ENGINE_NOT_INITIALIZED",
            EngineError::ContextStoreError(_) => "ERR_ENGINE_CONTEXT_STORE",
            EngineError::ExternalDependencyError(_) => "ERR_ENGINE_DOWNSTREAM",
            EngineError::Timeout(_) => "ERR_ENGINE_TIMEOUT",
            EngineError::ConfigurationError(_) => "ERR_ENGINE_CONFIG",
            EngineError::SerializationError(_) => "ERR_ENGINE_SERIALIZATION",
            EngineError::Other(_) => "ERR_ENGINE_OTHER",
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for EngineError {
    fn from(err: serde_yaml::Error) -> Self {
        EngineError::ConfigurationError(err.to_string())
    }
}

impl From<String> for EngineError {
    fn from(err: String) -> Self {
        EngineError::Other(err)
    }
}

impl From<&str> for EngineError {
    fn from(err: &str) -> Self {
        EngineError::Other(err.to_string())
    }
}
