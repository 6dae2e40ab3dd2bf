use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdeastormError {
    #[error("Not in an ideastorm project. Run 'ideastorm init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .ideastorm/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Invalid entity type: {0}")]
    InvalidEntityType(String),

    #[error("Mode '{mode}' is not defined for {kind}")]
    InvalidMode { kind: String, mode: String },

    #[error("Permission denied: cannot {action} {target}")]
    Forbidden { action: String, target: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IdeastormError {
    pub(crate) fn forbidden(action: impl ToString, target: impl ToString) -> Self {
        IdeastormError::Forbidden {
            action: action.to_string(),
            target: target.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IdeastormError>;
