use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /whoami - the principal the bearer token resolved to.
pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(json!({
        "account_id": principal.account_id().to_string(),
        "username": principal.principal().username(),
        "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "claims": principal.principal().claims().to_json(),
    }))
}
