use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use inventra_core::ServerId;
use inventra_infra::ServerInput;

use crate::app::{AppState, errors};

pub async fn list_servers(Extension(state): Extension<AppState>) -> Response {
    match state.servers.list() {
        Ok(servers) => (StatusCode::OK, Json(json!({ "servers": servers }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_server(Extension(state): Extension<AppState>, Path(id): Path<ServerId>) -> Response {
    match state.servers.get(id) {
        Ok(server) => (StatusCode::OK, Json(server)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_server(Extension(state): Extension<AppState>, Json(input): Json<ServerInput>) -> Response {
    match state.servers.create(input) {
        Ok(server) => (StatusCode::CREATED, Json(server)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_server(
    Extension(state): Extension<AppState>,
    Path(id): Path<ServerId>,
    Json(input): Json<ServerInput>,
) -> Response {
    match state.servers.update(id, input) {
        Ok(server) => (StatusCode::OK, Json(server)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_server(Extension(state): Extension<AppState>, Path(id): Path<ServerId>) -> Response {
    match state.servers.delete(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
