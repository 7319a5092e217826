//! Account provisioning: creates an account and hands back its API key plus
//! a ready-to-use token.

use axum::{
    Extension, Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use inventra_infra::NewAccount;

use crate::app::{AppState, errors};

/// POST /accounts
pub async fn create_account(Extension(state): Extension<AppState>, Json(new): Json<NewAccount>) -> Response {
    let created = match state.accounts.provision(new) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let token = match state.tokens.issue(&created.account, &created.account.roles) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed for new account");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "token_error", "token could not be issued");
        }
    };

    (
        StatusCode::CREATED,
        Json(json!({
            "account": created.account,
            "api_key": created.api_key,
            "token": token,
        })),
    )
        .into_response()
}
