//! # Principal Extraction
//!
//! Identity and session management are owned by the portal's auth gateway,
//! which authenticates every request and forwards the caller's identity in
//! trusted headers. This module only parses what the gateway injected:
//! `X-User-Id` (UUID) and `X-User-Role` (`student` | `alumni` | `admin`).
//! The scheduler itself never performs credential checks.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use mentormeet_core::errors::MeetError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error_handling::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Portal role of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Alumni,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Role::Student),
            "alumni" => Some(Role::Alumni),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// An authenticated caller, as established by the upstream auth gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or_else(|| {
                AppError(MeetError::Forbidden(
                    "request carries no authenticated user id".into(),
                ))
            })?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(Role::parse)
            .ok_or_else(|| {
                AppError(MeetError::Forbidden(
                    "request carries no authenticated role".into(),
                ))
            })?;

        Ok(Principal { user_id, role })
    }
}
