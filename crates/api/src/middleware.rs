/// Authenticated principal extraction
pub mod auth;
/// Error mapping to HTTP responses
pub mod error_handling;
