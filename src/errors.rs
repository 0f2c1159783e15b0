use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Store(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the store rejected a write because of a `UNIQUE` index.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Store(message) if message.contains("UNIQUE constraint failed"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Store(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
