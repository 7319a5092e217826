//! Request-time authentication and endpoint authorization.
//!
//! Installed with `route_layer`, so the matched route template is known.
//! Anonymous endpoints skip both steps; everything else needs a valid Bearer
//! token (401 otherwise) and a role grant for the endpoint (403 otherwise).
//! Routes missing from the endpoint table are refused with 403, but only
//! after the caller has authenticated.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use inventra_auth::{
    API_KEY_HEADER, AuthenticateResult, CredentialHeaders, EndpointDescriptor, EndpointTable, HttpVerb, RoleStore,
    TokenEngine, authenticate_bearer, authorize_endpoint,
};

use crate::app::errors::{self, AuthFailure};
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenEngine>,
    pub roles: Arc<dyn RoleStore>,
    pub endpoints: Arc<EndpointTable>,
}

/// Raw credential headers; non-UTF-8 values are treated as absent.
pub fn credential_headers(headers: &HeaderMap) -> CredentialHeaders<'_> {
    CredentialHeaders::new(
        headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()),
        headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
    )
}

pub async fn auth_middleware(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let verb = HttpVerb::parse(req.method().as_str());
    let endpoint = verb
        .as_ref()
        .ok()
        .and_then(|v| resolve_endpoint(&state.endpoints, *v, &route));

    if endpoint.as_ref().is_some_and(|e| state.endpoints.is_anonymous(e)) {
        return next.run(req).await;
    }

    // Identify the caller first: 401 takes priority over any 403 below.
    let principal = match authenticate_bearer(&state.tokens, &credential_headers(req.headers())) {
        AuthenticateResult::Success(auth) => auth.principal,
        other => return AuthFailure::from_result(&other).into_response(),
    };

    let verb = match verb {
        Ok(v) => v,
        Err(e) => return errors::authz_error_to_response(e.into()),
    };
    let Some(endpoint) = endpoint else {
        tracing::warn!(%verb, %route, "no endpoint descriptor registered for route");
        return errors::forbidden(None);
    };

    match authorize_endpoint(state.roles.as_ref(), principal.roles(), &endpoint, false, verb).await {
        Ok(grant) => {
            tracing::debug!(account_id = %principal.account_id(), ?grant, "request authorized");
        }
        Err(e) => return errors::authz_error_to_response(e),
    }

    req.extensions_mut().insert(PrincipalContext::new(principal));
    next.run(req).await
}

/// HEAD is served by the GET handler, so it shares the GET descriptor; the
/// resolver then rejects the verb itself.
fn resolve_endpoint(table: &EndpointTable, verb: HttpVerb, route: &str) -> Option<EndpointDescriptor> {
    table
        .lookup(verb, route)
        .or_else(|| match verb {
            HttpVerb::Head => table.lookup(HttpVerb::Get, route),
            _ => None,
        })
        .cloned()
}
