use thiserror::Error;

use crate::domain::{EntryValidationError, InvalidDate};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

impl From<EntryValidationError> for AppError {
    fn from(e: EntryValidationError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<InvalidDate> for AppError {
    fn from(e: InvalidDate) -> Self {
        AppError::Validation(e.to_string())
    }
}
