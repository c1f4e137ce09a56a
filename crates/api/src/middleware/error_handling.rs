//! # Error Handling Middleware
//!
//! This module provides a standardized way to handle errors in the
//! MentorMeet API. It maps domain-specific errors to appropriate HTTP status
//! codes and JSON error responses, ensuring a consistent error handling
//! experience across the entire API.
//!
//! The implementation is based on Axum's error handling mechanisms and
//! integrates with MentorMeet's custom error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mentormeet_core::errors::MeetError;
use serde_json::json;

/// Application error wrapper that provides HTTP status code mapping
///
/// `AppError` wraps domain-specific `MeetError` instances and implements
/// `IntoResponse` to convert them into HTTP responses with appropriate
/// status codes and JSON payloads.
#[derive(Debug)]
pub struct AppError(pub MeetError);

/// Converts application errors to HTTP responses
///
/// This implementation maps each error type to the appropriate HTTP status
/// code and formats the error message into a JSON response body.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map error types to HTTP status codes
        let status = match &self.0 {
            MeetError::InvalidRange => StatusCode::BAD_REQUEST,
            MeetError::PastWindow => StatusCode::BAD_REQUEST,
            MeetError::NotFound(_) => StatusCode::NOT_FOUND,
            MeetError::Forbidden(_) => StatusCode::FORBIDDEN,
            MeetError::InvalidState(_) => StatusCode::CONFLICT,
            MeetError::SlotConflict(_) => StatusCode::CONFLICT,
            MeetError::Validation(_) => StatusCode::BAD_REQUEST,
            MeetError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MeetError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Get the error message and format as JSON
        let message = self.0.to_string();
        let body = Json(json!({ "error": message }));

        // Combine status code and JSON body into a response
        (status, body).into_response()
    }
}

/// Automatic conversion from MeetError to AppError
///
/// This implementation allows using `?` operator with functions that return
/// `Result<T, MeetError>` in handler functions that return
/// `Result<T, AppError>`.
impl From<MeetError> for AppError {
    fn from(err: MeetError) -> Self {
        AppError(err)
    }
}

/// Automatic conversion from eyre::Report to AppError
///
/// This implementation allows using `?` operator with functions that return
/// `Result<T, eyre::Report>` in handler functions that return
/// `Result<T, AppError>`. It wraps the eyre error in a `MeetError::Database`
/// variant.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(MeetError::Database(err))
    }
}

/// Maps a MeetError to an HTTP response
///
/// Convenience for call sites that build a response directly instead of
/// returning `Result<_, AppError>`.
pub fn map_error(err: MeetError) -> Response {
    AppError(err).into_response()
}
