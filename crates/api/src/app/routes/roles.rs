use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::app::{AppState, errors};

/// GET /roles - every stored role with its endpoint grants.
pub async fn list_roles(Extension(state): Extension<AppState>) -> Response {
    match state.roles.list_roles().await {
        Ok(roles) => (StatusCode::OK, Json(json!({ "roles": roles }))).into_response(),
        Err(e) => errors::json_error(StatusCode::SERVICE_UNAVAILABLE, "unavailable", e.to_string()),
    }
}

/// GET /roles/:name
pub async fn get_role(Extension(state): Extension<AppState>, Path(name): Path<String>) -> Response {
    match state.roles.role_by_name(&name).await {
        Ok(Some(role)) => (StatusCode::OK, Json(role)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("role '{name}' not found")),
        Err(e) => errors::json_error(StatusCode::SERVICE_UNAVAILABLE, "unavailable", e.to_string()),
    }
}
