use axum::{
    Router,
    routing::{get, post},
};

use inventra_auth::{EndpointDescriptor, EndpointTable, HttpVerb};

pub mod accounts;
pub mod auth;
pub mod roles;
pub mod servers;
pub mod system;

/// Router for every endpoint. Must stay in step with [`endpoint_table`]:
/// a route without a descriptor is refused by the auth middleware.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/whoami", get(system::whoami))
        .route("/auth/token", post(auth::issue_token))
        .route("/auth/verify", post(auth::verify_token))
        .route("/accounts", post(accounts::create_account))
        .route("/roles", get(roles::list_roles))
        .route("/roles/:name", get(roles::get_role))
        .route("/servers", get(servers::list_servers).post(servers::create_server))
        .route(
            "/servers/:id",
            get(servers::get_server)
                .put(servers::update_server)
                .delete(servers::delete_server),
        )
}

/// Endpoint identity of every route, keyed by verb and route template.
pub fn endpoint_table() -> EndpointTable {
    use HttpVerb::{Delete, Get, Post, Put};

    let e = EndpointDescriptor::new;

    EndpointTable::new()
        .anonymous_controller("Auth")
        .route(Get, "/health", e("System", "Health").allow_anonymous())
        .route(Get, "/whoami", e("Account", "WhoAmI"))
        .route(Post, "/auth/token", e("Auth", "Token"))
        .route(Post, "/auth/verify", e("Auth", "Verify"))
        .route(Post, "/accounts", e("Account", "Create"))
        .route(Get, "/roles", e("Role", "GetAll"))
        .route(Get, "/roles/:name", e("Role", "GetByName").with_route_param(":name"))
        .route(Get, "/servers", e("Server", "GetAll"))
        .route(Post, "/servers", e("Server", "Create"))
        .route(Get, "/servers/:id", e("Server", "GetById").with_route_param("Id"))
        .route(Put, "/servers/:id", e("Server", "Update").with_route_param("Id"))
        .route(Delete, "/servers/:id", e("Server", "Delete").with_route_param("Id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_by_id_uses_canonical_identifier() {
        let table = endpoint_table();
        let d = table.lookup(HttpVerb::Get, "/servers/:id").unwrap();
        assert_eq!(d.identifier(), "Server/GetById/Id");
        assert!(!table.is_anonymous(d));
    }

    #[test]
    fn auth_controller_and_health_are_anonymous() {
        let table = endpoint_table();
        for (verb, route) in [
            (HttpVerb::Post, "/auth/token"),
            (HttpVerb::Post, "/auth/verify"),
            (HttpVerb::Get, "/health"),
        ] {
            let d = table.lookup(verb, route).unwrap();
            assert!(table.is_anonymous(d), "{verb} {route} should be anonymous");
        }
    }

    #[test]
    fn unregistered_verb_has_no_descriptor() {
        let table = endpoint_table();
        assert!(table.lookup(HttpVerb::Patch, "/servers/:id").is_none());
        assert_eq!(table.len(), 12);
    }
}
