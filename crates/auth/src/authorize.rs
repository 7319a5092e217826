//! Endpoint permission resolver.
//!
//! Decides whether a principal's roles allow a verb on an endpoint, walking
//! each role's grants in claim order. Role data comes from a [`RoleStore`];
//! this module holds no state of its own.

use serde::Serialize;
use thiserror::Error;

use crate::{
    EndpointDescriptor, EndpointPermissionAction, HttpVerb, RoleLookupError, RoleName, RoleStore, VerbError,
};

/// Why the last checked role failed to authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NoRoles,
    NoGrants,
    MissingPermission,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("{}", denial_message(.kind, .role, .endpoint, .action))]
    Denied {
        kind: DenialKind,
        role: Option<String>,
        endpoint: String,
        action: EndpointPermissionAction,
    },

    #[error("Unsupported request: {0}")]
    UnsupportedVerb(#[from] VerbError),

    #[error("Role lookup failed for '{role}'")]
    Lookup {
        role: String,
        #[source]
        source: RoleLookupError,
    },
}

fn denial_message(
    kind: &DenialKind,
    role: &Option<String>,
    endpoint: &str,
    action: &EndpointPermissionAction,
) -> String {
    match (kind, role.as_deref()) {
        (DenialKind::NoRoles, _) | (_, None) => {
            format!("No roles were presented; {action} on endpoint '{endpoint}' is not permitted.")
        }
        (DenialKind::NoGrants, Some(role)) => {
            format!("Role '{role}' has no endpoint permissions; {action} on endpoint '{endpoint}' is not permitted.")
        }
        (DenialKind::MissingPermission, Some(role)) => {
            format!("Role '{role}' is not permitted to {action} on endpoint '{endpoint}'.")
        }
    }
}

/// Outcome of a successful check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AuthorizationGrant {
    /// The endpoint allows anonymous access; no roles were consulted.
    Anonymous,
    /// `role` holds a grant covering `action` on `endpoint`.
    Granted {
        role: String,
        endpoint: String,
        action: EndpointPermissionAction,
    },
}

/// Authorize `verb` on `endpoint` for a caller holding `roles`.
///
/// The first role (in the order given) with a matching grant wins. Roles the
/// store does not know contribute no grants. A store failure denies the
/// request; it is never retried.
pub async fn authorize_endpoint<S>(
    store: &S,
    roles: &[RoleName],
    endpoint: &EndpointDescriptor,
    anonymous: bool,
    verb: HttpVerb,
) -> Result<AuthorizationGrant, AuthzError>
where
    S: RoleStore + ?Sized,
{
    if anonymous {
        return Ok(AuthorizationGrant::Anonymous);
    }

    let action = verb.required_action()?;
    let identifier = endpoint.identifier();

    let mut last_role: Option<&RoleName> = None;
    let mut kind = DenialKind::NoRoles;

    for name in roles {
        last_role = Some(name);

        let role = store
            .role_by_name(name.as_str())
            .await
            .map_err(|source| AuthzError::Lookup {
                role: name.to_string(),
                source,
            })?;

        let Some(role) = role.filter(|r| !r.permissions.is_empty()) else {
            tracing::debug!(role = %name, "role has no endpoint permissions");
            kind = DenialKind::NoGrants;
            continue;
        };

        let authorized = role
            .permissions
            .iter()
            .any(|grant| grant.matches(&identifier) && grant.allows(action));
        if authorized {
            return Ok(AuthorizationGrant::Granted {
                role: name.to_string(),
                endpoint: identifier,
                action,
            });
        }
        kind = DenialKind::MissingPermission;
    }

    tracing::info!(
        role = last_role.map(|r| r.as_str()).unwrap_or(""),
        endpoint = %identifier,
        action = %action,
        "authorization denied"
    );
    Err(AuthzError::Denied {
        kind,
        role: last_role.map(|r| r.to_string()),
        endpoint: identifier,
        action,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::{EndpointPermission, Role, bootstrap_roles};
    use EndpointPermissionAction as A;

    struct MapStore(HashMap<String, Role>);

    impl MapStore {
        fn bootstrap() -> Self {
            Self::with(bootstrap_roles())
        }

        fn with(roles: Vec<Role>) -> Self {
            Self(roles.into_iter().map(|r| (r.name.key(), r)).collect())
        }
    }

    #[async_trait]
    impl RoleStore for MapStore {
        async fn role_by_name(&self, name: &str) -> Result<Option<Role>, RoleLookupError> {
            Ok(self.0.get(&name.to_ascii_lowercase()).cloned())
        }

        async fn list_roles(&self) -> Result<Vec<Role>, RoleLookupError> {
            Ok(self.0.values().cloned().collect())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl RoleStore for BrokenStore {
        async fn role_by_name(&self, _name: &str) -> Result<Option<Role>, RoleLookupError> {
            Err(RoleLookupError("connection refused".into()))
        }

        async fn list_roles(&self) -> Result<Vec<Role>, RoleLookupError> {
            Err(RoleLookupError("connection refused".into()))
        }
    }

    fn roles(names: &[&str]) -> Vec<RoleName> {
        names.iter().map(|n| RoleName::from(*n)).collect()
    }

    fn get_by_id() -> EndpointDescriptor {
        EndpointDescriptor::new("Server", "GetById").with_route_param("{Id}")
    }

    fn every_endpoint() -> Vec<EndpointDescriptor> {
        vec![
            EndpointDescriptor::new("Server", "GetAll"),
            get_by_id(),
            EndpointDescriptor::new("Server", "Delete").with_route_param("{Id}"),
            EndpointDescriptor::new("Role", "GetByName").with_route_param("{Name}"),
            EndpointDescriptor::new("Account", "WhoAmI"),
        ]
    }

    const VERBS: [HttpVerb; 6] = [
        HttpVerb::Get,
        HttpVerb::Options,
        HttpVerb::Post,
        HttpVerb::Put,
        HttpVerb::Patch,
        HttpVerb::Delete,
    ];

    #[tokio::test]
    async fn admin_wildcard_authorizes_everything() {
        let store = MapStore::bootstrap();
        for endpoint in every_endpoint() {
            for verb in VERBS {
                let grant = authorize_endpoint(&store, &roles(&["admin"]), &endpoint, false, verb)
                    .await
                    .unwrap();
                assert!(matches!(grant, AuthorizationGrant::Granted { .. }));
            }
        }
    }

    #[tokio::test]
    async fn coarse_read_grant_covers_sub_actions_for_get_only() {
        let store = MapStore::bootstrap();
        let user = roles(&["user"]);

        let grant = authorize_endpoint(&store, &user, &get_by_id(), false, HttpVerb::Get)
            .await
            .unwrap();
        assert_eq!(
            grant,
            AuthorizationGrant::Granted {
                role: "user".into(),
                endpoint: "Server/GetById/Id".into(),
                action: A::Read,
            }
        );

        let err = authorize_endpoint(&store, &user, &get_by_id(), false, HttpVerb::Delete)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthzError::Denied {
                kind: DenialKind::MissingPermission,
                action: A::Delete,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn guest_is_denied_with_role_and_endpoint_in_message() {
        let store = MapStore::bootstrap();
        let err = authorize_endpoint(&store, &roles(&["guest"]), &get_by_id(), false, HttpVerb::Get)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("guest"), "{message}");
        assert!(message.contains("Server/GetById/Id"), "{message}");
        assert!(message.contains("Read"), "{message}");
    }

    #[tokio::test]
    async fn unknown_roles_contribute_nothing() {
        let store = MapStore::bootstrap();

        let err = authorize_endpoint(&store, &roles(&["ghost"]), &get_by_id(), false, HttpVerb::Get)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Denied { kind: DenialKind::NoGrants, .. }));

        let grant = authorize_endpoint(&store, &roles(&["ghost", "user"]), &get_by_id(), false, HttpVerb::Get)
            .await
            .unwrap();
        assert!(matches!(grant, AuthorizationGrant::Granted { ref role, .. } if role == "user"));
    }

    #[tokio::test]
    async fn first_authorizing_role_short_circuits() {
        let store = MapStore::bootstrap();
        let grant = authorize_endpoint(
            &store,
            &roles(&["guest", "priviledged", "admin"]),
            &get_by_id(),
            false,
            HttpVerb::Put,
        )
        .await
        .unwrap();
        assert!(matches!(grant, AuthorizationGrant::Granted { ref role, .. } if role == "priviledged"));
    }

    #[tokio::test]
    async fn message_names_last_checked_role() {
        let store = MapStore::bootstrap();
        let err = authorize_endpoint(&store, &roles(&["guest", "user"]), &get_by_id(), false, HttpVerb::Post)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthzError::Denied { kind: DenialKind::MissingPermission, ref role, .. } if role.as_deref() == Some("user")
        ));
    }

    #[tokio::test]
    async fn single_endpoint_grant_does_not_leak_to_siblings() {
        let store = MapStore::bootstrap();
        let single = roles(&["singleendpoint"]);

        assert!(
            authorize_endpoint(&store, &single, &get_by_id(), false, HttpVerb::Get)
                .await
                .is_ok()
        );
        assert!(
            authorize_endpoint(&store, &single, &EndpointDescriptor::new("Server", "GetAll"), false, HttpVerb::Get)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn role_names_and_grant_endpoints_are_case_insensitive() {
        let store = MapStore::with(vec![
            Role::new("Auditor", "").with_permission(EndpointPermission::new("server/getbyid", [A::Read])),
        ]);
        let grant = authorize_endpoint(&store, &roles(&["AUDITOR"]), &get_by_id(), false, HttpVerb::Get).await;
        assert!(grant.is_ok());
    }

    #[tokio::test]
    async fn none_action_never_authorizes_and_does_not_override_write() {
        let store = MapStore::with(vec![
            Role::new("mixed", "")
                .with_permission(EndpointPermission::new("Server", [A::None]))
                .with_permission(EndpointPermission::new("Server", [A::Write])),
            Role::new("nothing", "").with_permission(EndpointPermission::new("All", [A::None])),
        ]);

        assert!(
            authorize_endpoint(&store, &roles(&["mixed"]), &get_by_id(), false, HttpVerb::Delete)
                .await
                .is_ok()
        );
        assert!(
            authorize_endpoint(&store, &roles(&["nothing"]), &get_by_id(), false, HttpVerb::Get)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn no_roles_is_denied() {
        let store = MapStore::bootstrap();
        let err = authorize_endpoint(&store, &[], &get_by_id(), false, HttpVerb::Get)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Denied { kind: DenialKind::NoRoles, role: None, .. }));
    }

    #[tokio::test]
    async fn anonymous_endpoints_skip_the_check() {
        let store = BrokenStore;
        let grant = authorize_endpoint(&store, &[], &get_by_id(), true, HttpVerb::Head)
            .await
            .unwrap();
        assert_eq!(grant, AuthorizationGrant::Anonymous);
    }

    #[tokio::test]
    async fn unmapped_verb_fails_loudly() {
        let store = MapStore::bootstrap();
        let err = authorize_endpoint(&store, &roles(&["admin"]), &get_by_id(), false, HttpVerb::Head)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::UnsupportedVerb(_)));
    }

    #[tokio::test]
    async fn store_failure_denies_without_retry() {
        let err = authorize_endpoint(&BrokenStore, &roles(&["admin"]), &get_by_id(), false, HttpVerb::Get)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Lookup { ref role, .. } if role == "admin"));
    }
}
