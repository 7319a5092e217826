//! Credential exchange (ApiKey/Basic -> Bearer) and token verification.

use std::net::SocketAddr;

use axum::{
    Extension, Json,
    extract::ConnectInfo,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use inventra_auth::AuthenticateResult;

use crate::app::{AppState, errors};
use crate::middleware::credential_headers;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// POST /auth/token - authenticate with `ApiKey` or Basic and receive a JWT.
pub async fn issue_token(
    Extension(state): Extension<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let remote_ip = connect_info.map(|ConnectInfo(addr)| addr.ip());
    let result = state.dispatcher.authenticate(&credential_headers(&headers), remote_ip).await;

    let auth = match result {
        AuthenticateResult::Success(auth) => auth,
        other => return errors::AuthFailure::from_result(&other).into_response(),
    };

    let roles = auth.principal.roles();
    let Some(account) = auth.account.as_ref() else {
        return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "token_error", "no account resolved");
    };

    match state.tokens.issue(account, roles) {
        Ok(token) => {
            tracing::info!(account_id = %account.id, scheme = %auth.scheme, "token issued");
            (StatusCode::OK, Json(json!({ "token": token }))).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "token_error", "token could not be issued")
        }
    }
}

/// POST /auth/verify - validate a token and echo its claims.
pub async fn verify_token(Extension(state): Extension<AppState>, Json(req): Json<VerifyRequest>) -> Response {
    match state.tokens.validate(req.token.trim()) {
        Ok(principal) => (
            StatusCode::OK,
            Json(json!({ "valid": true, "claims": principal.claims().to_json() })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "valid": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}
