use thiserror::Error;

use crate::links::StoreError;

/// Errors surfaced to the user by the CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Link not found: {id}")]
    NotFound { id: String },

    #[error("Storage operation failed: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CliError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: format!("{err:#}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::Storage {
                message: "Permission denied".to_string(),
            },
            _ => Self::Storage {
                message: err.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON error: {err}"),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidUrl(message) => Self::validation("url", message),
            StoreError::NotFound(id) => Self::NotFound { id },
            StoreError::Io(err) => err.into(),
            StoreError::Serde(err) => err.into(),
        }
    }
}

impl From<inquire::InquireError> for CliError {
    fn from(err: inquire::InquireError) -> Self {
        match err {
            inquire::InquireError::OperationCanceled
            | inquire::InquireError::OperationInterrupted => Self::UserCancelled,
            err => Self::invalid_input(err.to_string()),
        }
    }
}
