//! Consistent error responses, including the authentication (401) and
//! authorization (403) failure bodies.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use inventra_auth::{AuthenticateResult, AuthzError, Scheme};
use inventra_core::DomainError;

pub const GENERIC_CREDENTIALS_MESSAGE: &str = "Please provide valid credentials.";
pub const GENERIC_FORBIDDEN_MESSAGE: &str = "Unauthorized request";

const REALM: &str = "inventra";

/// An authentication failure on its way to a 401 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    pub scheme: Scheme,
    /// Explicit rejection reason (bad token, IP not allowed, ...).
    pub context_error: Option<String>,
    /// The expected credential header was not sent.
    pub missing_header: Option<String>,
}

impl AuthFailure {
    pub fn from_result(result: &AuthenticateResult) -> Self {
        let mut failure = Self {
            scheme: result.scheme(),
            context_error: None,
            missing_header: None,
        };
        match result {
            AuthenticateResult::Fail { reason, .. } => failure.context_error = Some(reason.clone()),
            AuthenticateResult::Challenge { reason, .. } => failure.missing_header = Some(reason.clone()),
            AuthenticateResult::Success(_) => {}
        }
        failure
    }

    /// Most specific reason available.
    pub fn message(&self) -> &str {
        self.context_error
            .as_deref()
            .or(self.missing_header.as_deref())
            .unwrap_or(GENERIC_CREDENTIALS_MESSAGE)
    }

    fn challenge(&self) -> String {
        match self.scheme {
            Scheme::ApiKey => "ApiKey".to_string(),
            Scheme::Basic => format!("Basic realm=\"{REALM}\""),
            Scheme::Bearer => format!("Bearer realm=\"{REALM}\""),
            Scheme::Unsupported => format!("ApiKey, Basic realm=\"{REALM}\", Bearer realm=\"{REALM}\""),
        }
    }
}

#[derive(Debug, Serialize)]
struct UnauthorizedBody<'a> {
    scheme: &'a str,
    statuscode: u16,
    error: &'a str,
    message: &'a str,
    headers: serde_json::Map<String, serde_json::Value>,
}

impl IntoResponse for AuthFailure {
    fn into_response(self) -> Response {
        let challenge = self.challenge();
        let mut headers = serde_json::Map::new();
        headers.insert(header::WWW_AUTHENTICATE.as_str().to_string(), json!(challenge));

        let body = UnauthorizedBody {
            scheme: self.scheme.as_str(),
            statuscode: StatusCode::UNAUTHORIZED.as_u16(),
            error: "Unauthorized",
            message: self.message(),
            headers,
        };

        let mut response = (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response();
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

/// 403 with `{ "error": message }`.
pub fn forbidden(message: Option<String>) -> Response {
    let message = message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_FORBIDDEN_MESSAGE.to_string());
    (StatusCode::FORBIDDEN, axum::Json(json!({ "error": message }))).into_response()
}

pub fn authz_error_to_response(err: AuthzError) -> Response {
    match &err {
        AuthzError::Lookup { source, .. } => {
            tracing::warn!(error = %source, "role lookup failed during authorization");
        }
        AuthzError::Denied { .. } | AuthzError::UnsupportedVerb(_) => {}
    }
    forbidden(Some(err.to_string()))
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Unavailable(msg) => {
            tracing::error!(error = %msg, "store unavailable");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "unavailable", "store unavailable")
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
