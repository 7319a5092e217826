use std::sync::Arc;

use inventra_auth::{EndpointTable, RoleStore, SchemeDispatcher, TokenEngine};
use inventra_infra::{InMemoryAccountDirectory, InMemoryServerStore};

/// Collaborators shared by every handler. Cloned per request (all `Arc`s).
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenEngine>,
    pub dispatcher: SchemeDispatcher,
    pub roles: Arc<dyn RoleStore>,
    pub accounts: Arc<InMemoryAccountDirectory>,
    pub servers: Arc<InMemoryServerStore>,
    pub endpoints: Arc<EndpointTable>,
}
