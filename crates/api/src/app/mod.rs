//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `state.rs`: shared collaborators (token engine, stores, dispatcher)
//! - `routes/`: HTTP routes + handlers, and the endpoint table that names them
//! - `errors.rs`: consistent error responses (401/403 bodies included)

use std::sync::Arc;

use axum::{Extension, Router};

use inventra_auth::{BootstrapRole, SchemeDispatcher, TokenEngine};
use inventra_infra::{InMemoryAccountDirectory, InMemoryRoleStore, InMemoryServerStore, NewAccount};

use crate::config::AppConfig;
use crate::middleware;

pub mod errors;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let state = build_state(config)?;
    Ok(router(state))
}

/// Wire the in-memory collaborators and seed bootstrap data.
pub fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let tokens = Arc::new(TokenEngine::new(&config.token)?);
    let roles = Arc::new(InMemoryRoleStore::seeded());
    let accounts = Arc::new(InMemoryAccountDirectory::new());

    if let Some(api_key) = &config.bootstrap_admin_api_key {
        let admin = accounts.provision(NewAccount {
            username: "admin".to_string(),
            email: "admin@localhost".to_string(),
            display_name: "Administrator".to_string(),
            password: None,
            api_key: Some(api_key.clone()),
            ip_restriction: None,
            expires_at: None,
            roles: vec![BootstrapRole::Admin.name().to_string()],
        })?;
        tracing::info!(account_id = %admin.account.id, "bootstrap admin account seeded");
    }

    Ok(AppState {
        dispatcher: SchemeDispatcher::new(accounts.clone()),
        tokens,
        roles,
        accounts,
        servers: Arc::new(InMemoryServerStore::new()),
        endpoints: Arc::new(routes::endpoint_table()),
    })
}

pub fn router(state: AppState) -> Router {
    let auth_state = middleware::AuthState {
        tokens: state.tokens.clone(),
        roles: state.roles.clone(),
        endpoints: state.endpoints.clone(),
    };

    routes::router()
        .route_layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ))
        .layer(Extension(state))
}
