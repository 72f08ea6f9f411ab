//! User resource handlers.
//!
//! Each handler performs validate → one repository call → map → respond, and
//! nothing else; request bodies are parsed here so every rejection shares the
//! same `{"message"}` envelope.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};

use crate::application::error::ErrorReport;
use crate::application::users::{CreateUserCommand, UserServiceError};
use crate::domain::entities::UserRecord;

use super::ApiState;
use super::error::ApiError;

fn service_error_to_api(err: UserServiceError) -> ApiError {
    match err {
        UserServiceError::Validation(_) => ApiError::bad_request(),
        UserServiceError::Repo(repo) => ApiError::internal(repo.to_string()),
    }
}

/// Path ids arrive as text; anything non-numeric is the caller's mistake,
/// not a server fault.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::bad_request())
}

fn parse_object(body: &Bytes) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ApiError::bad_request()),
    }
}

/// A field counts as present only when it is a non-empty string.
fn string_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

pub async fn list_users(State(state): State<ApiState>) -> Result<Json<Vec<UserRecord>>, ApiError> {
    let users = state.users.list().await.map_err(service_error_to_api)?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<UserRecord>, ApiError> {
    let id = parse_id(&id)?;

    let user = state.users.get(id).await.map_err(service_error_to_api)?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::not_found()),
    }
}

pub async fn create_user(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload = parse_object(&body)?;
    let name = string_field(&payload, "name").ok_or_else(ApiError::bad_request)?;
    let email = string_field(&payload, "email").ok_or_else(ApiError::bad_request)?;

    let command = CreateUserCommand {
        name: name.to_string(),
        email: email.to_string(),
    };

    let created = state
        .users
        .create(command)
        .await
        .map_err(service_error_to_api)?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_user(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id)?;
    let payload = parse_object(&body)?;
    let email = string_field(&payload, "email").ok_or_else(ApiError::bad_request)?;

    let updated = state
        .users
        .update_email(id, email)
        .await
        .map_err(service_error_to_api)?;

    let Some(record) = updated else {
        return Err(ApiError::not_found());
    };

    if state.update_returns_record {
        return Ok(Json(record).into_response());
    }

    // Compatibility mode: reflect the submitted body back, with the path id
    // spliced in as submitted. The persisted record is not re-read.
    let mut echoed = payload;
    echoed.insert("id".to_string(), Value::String(raw_id));
    Ok(Json(Value::Object(echoed)).into_response())
}

pub async fn delete_user(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    state.users.delete(id).await.map_err(service_error_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn db_health(State(state): State<ApiState>) -> Response {
    match state.db.ping().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

pub async fn unknown_route() -> ApiError {
    ApiError::not_found()
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}
