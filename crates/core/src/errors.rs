use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeetError {
    #[error("Invalid time range: end must be after start")]
    InvalidRange,

    #[error("Time window has already elapsed")]
    PastWindow,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Slot conflict: {0}")]
    SlotConflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type MeetResult<T> = Result<T, MeetError>;
