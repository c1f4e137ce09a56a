use axum::extract::FromRequestParts;
use axum::http::{Request, StatusCode};
use mentormeet_api::middleware::auth::{Principal, Role, USER_ID_HEADER, USER_ROLE_HEADER};
use mentormeet_api::middleware::error_handling::map_error;
use mentormeet_core::errors::MeetError;
use pretty_assertions::assert_eq;
use uuid::Uuid;

#[tokio::test]
async fn test_error_handling_invalid_range() {
    let response = map_error(MeetError::InvalidRange);
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_error_handling_past_window() {
    let response = map_error(MeetError::PastWindow);
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_error_handling_not_found() {
    let response = map_error(MeetError::NotFound("Meeting not found".to_string()));
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_error_handling_forbidden() {
    let response = map_error(MeetError::Forbidden("not a participant".to_string()));
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_error_handling_invalid_state() {
    let response = map_error(MeetError::InvalidState("already cancelled".to_string()));
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_error_handling_slot_conflict() {
    let response = map_error(MeetError::SlotConflict("overlapping booking".to_string()));
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_error_handling_validation() {
    let response = map_error(MeetError::Validation("empty slot list".to_string()));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_error_handling_database() {
    let response = map_error(MeetError::Database(eyre::eyre!("connection refused")));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_principal_extracted_from_headers() {
    let user_id = Uuid::new_v4();
    let request = Request::builder()
        .header(USER_ID_HEADER, user_id.to_string())
        .header(USER_ROLE_HEADER, "alumni")
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let principal = Principal::from_request_parts(&mut parts, &())
        .await
        .expect("headers carry a full principal");

    assert_eq!(principal.user_id, user_id);
    assert_eq!(principal.role, Role::Alumni);
}

#[tokio::test]
async fn test_principal_missing_user_id_is_rejected() {
    let request = Request::builder()
        .header(USER_ROLE_HEADER, "student")
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let result = Principal::from_request_parts(&mut parts, &()).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_principal_unknown_role_is_rejected() {
    let request = Request::builder()
        .header(USER_ID_HEADER, Uuid::new_v4().to_string())
        .header(USER_ROLE_HEADER, "superuser")
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let result = Principal::from_request_parts(&mut parts, &()).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_role_parsing() {
    assert_eq!(Role::parse("student"), Some(Role::Student));
    assert_eq!(Role::parse("alumni"), Some(Role::Alumni));
    assert_eq!(Role::parse("admin"), Some(Role::Admin));
    assert_eq!(Role::parse("Staff"), None);
}
