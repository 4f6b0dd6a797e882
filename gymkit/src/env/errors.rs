use crate::spaces::SpaceError;
use thiserror::Error;

/// Raised when an environment cannot be built from the given id and options.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("environment `{id}` doesn't exist{}", did_you_mean(.suggestion))]
    UnknownEnvironment {
        id: String,
        suggestion: Option<String>,
    },

    #[error("malformed environment id `{0}`, expected `[namespace/]name[-vN]`")]
    MalformedId(String),

    #[error("environment `{0}` is already registered")]
    DuplicateId(String),

    #[error("{env} does not accept option `{key}`")]
    UnknownOption { env: String, key: String },

    #[error("invalid value for option `{key}` of {env}: {reason}")]
    InvalidOption {
        env: String,
        key: String,
        reason: String,
    },

    #[error("invalid map: {0}")]
    InvalidMap(String),

    #[error("{env} does not support render mode `{mode}` (supported: {})", .supported.join(", "))]
    UnsupportedRenderMode {
        env: String,
        mode: String,
        supported: Vec<String>,
    },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(id) => format!(", did you mean `{id}`?"),
        None => String::new(),
    }
}

#[derive(Error, Debug)]
pub enum EnvError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("cannot reset environment: {0}")]
    Reset(String),

    #[error("cannot step environment: {0}")]
    Step(String),

    #[error("action {action} is not in action space {space}")]
    InvalidAction { action: String, space: String },

    #[error("space error: {0}")]
    Space(#[from] SpaceError),

    #[error("environment registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("environment is closed")]
    Closed,

    #[error("Environment error: {0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
