use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::EndpointPermissionAction;

/// Endpoint identifier that matches every endpoint.
pub const ALL_ENDPOINTS: &str = "All";

/// Role name as carried in tokens and stored roles.
///
/// Comparison between role names is case-insensitive (`Admin` == `admin`);
/// the original spelling is preserved for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(Cow<'static, str>);

impl RoleName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form, used as a lookup key by role stores.
    pub fn key(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl PartialEq for RoleName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for RoleName {}

impl core::hash::Hash for RoleName {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state)
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleName {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for RoleName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A grant: actions allowed on an endpoint identifier (or on `All`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPermission {
    pub endpoint: String,
    pub actions: Vec<EndpointPermissionAction>,
}

impl EndpointPermission {
    pub fn new(endpoint: impl Into<String>, actions: impl Into<Vec<EndpointPermissionAction>>) -> Self {
        Self {
            endpoint: endpoint.into(),
            actions: actions.into(),
        }
    }

    /// Whether this grant covers the given endpoint identifier.
    ///
    /// Matching is case-insensitive: exact, prefix (`Server` covers
    /// `Server/GetById/Id`), or the literal `All` wildcard.
    pub fn matches(&self, identifier: &str) -> bool {
        if self.endpoint == ALL_ENDPOINTS {
            return true;
        }
        let grant = self.endpoint.to_ascii_lowercase();
        let target = identifier.to_ascii_lowercase();
        target == grant || target.starts_with(&grant)
    }

    /// Whether this grant allows `required`.
    pub fn allows(&self, required: EndpointPermissionAction) -> bool {
        self.actions.iter().any(|a| a.satisfies(required))
    }
}

/// Named permission bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: RoleName,
    pub description: String,
    pub permissions: Vec<EndpointPermission>,
}

impl Role {
    pub fn new(name: impl Into<RoleName>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            permissions: Vec::new(),
        }
    }

    pub fn with_permission(mut self, permission: EndpointPermission) -> Self {
        self.permissions.push(permission);
        self
    }
}

/// The closed set of roles seeded when provisioning a fresh store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BootstrapRole {
    Admin,
    Priviledged,
    User,
    SingleEndpoint,
    Guest,
}

impl BootstrapRole {
    pub const ALL: [BootstrapRole; 5] = [
        BootstrapRole::Admin,
        BootstrapRole::Priviledged,
        BootstrapRole::User,
        BootstrapRole::SingleEndpoint,
        BootstrapRole::Guest,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Priviledged => "priviledged",
            Self::User => "user",
            Self::SingleEndpoint => "singleendpoint",
            Self::Guest => "guest",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(name))
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Admin => "Full access to every endpoint",
            Self::Priviledged => "Create, read and update server records",
            Self::User => "Read-only access to server records",
            Self::SingleEndpoint => "Read a single server record by id",
            Self::Guest => "Authenticated but not permitted on protected endpoints",
        }
    }

    /// The canonical grant set for this role.
    pub fn role(&self) -> Role {
        use EndpointPermissionAction as A;

        let role = Role::new(self.name(), self.description());
        match self {
            Self::Admin => role.with_permission(EndpointPermission::new(ALL_ENDPOINTS, [A::Write])),
            Self::Priviledged => {
                role.with_permission(EndpointPermission::new("Server", [A::Create, A::Read, A::Update]))
            }
            Self::User => role.with_permission(EndpointPermission::new("Server", [A::Read])),
            Self::SingleEndpoint => {
                role.with_permission(EndpointPermission::new("Server/GetById/Id", [A::Read]))
            }
            Self::Guest => role,
        }
    }
}

/// Every bootstrap role with its canonical grants.
pub fn bootstrap_roles() -> Vec<Role> {
    BootstrapRole::ALL.iter().map(BootstrapRole::role).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use EndpointPermissionAction as A;

    #[test]
    fn role_names_compare_case_insensitively() {
        assert_eq!(RoleName::from("Admin"), RoleName::from("admin"));
        assert_eq!(RoleName::from("Admin").as_str(), "Admin");
        assert_eq!(RoleName::from("Admin").key(), "admin");
    }

    #[test]
    fn grant_matches_exact_prefix_and_wildcard() {
        let coarse = EndpointPermission::new("Server", [A::Read]);
        assert!(coarse.matches("Server/GetById/Id"));
        assert!(coarse.matches("server/getall"));
        assert!(!coarse.matches("Role/GetAll"));

        let exact = EndpointPermission::new("Server/GetById/Id", [A::Read]);
        assert!(exact.matches("SERVER/GETBYID/ID"));
        assert!(!exact.matches("Server/GetAll"));

        let all = EndpointPermission::new(ALL_ENDPOINTS, [A::Write]);
        assert!(all.matches("Anything/At/All"));
    }

    #[test]
    fn bootstrap_grants() {
        let admin = BootstrapRole::Admin.role();
        assert_eq!(admin.permissions, vec![EndpointPermission::new("All", [A::Write])]);

        let guest = BootstrapRole::Guest.role();
        assert!(guest.permissions.is_empty());

        let single = BootstrapRole::SingleEndpoint.role();
        assert_eq!(single.permissions[0].endpoint, "Server/GetById/Id");

        assert_eq!(bootstrap_roles().len(), 5);
        assert_eq!(BootstrapRole::from_name("PRIVILEDGED"), Some(BootstrapRole::Priviledged));
        assert_eq!(BootstrapRole::from_name("root"), None);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        const SPECIFIC: [EndpointPermissionAction; 4] = [
            EndpointPermissionAction::Read,
            EndpointPermissionAction::Create,
            EndpointPermissionAction::Update,
            EndpointPermissionAction::Delete,
        ];

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: `All`/`Write` covers every endpoint and every specific action.
            #[test]
            fn wildcard_write_allows_everything(
                identifier in "[A-Za-z]{1,12}(/[A-Za-z]{1,12}){0,2}",
                idx in 0usize..4
            ) {
                let grant = EndpointPermission::new(ALL_ENDPOINTS, [EndpointPermissionAction::Write]);
                prop_assert!(grant.matches(&identifier));
                prop_assert!(grant.allows(SPECIFIC[idx]));
            }

            /// Property: a controller grant covers its actions regardless of case.
            #[test]
            fn controller_grant_covers_sub_actions(
                action in "[A-Za-z]{1,12}",
                param in proptest::option::of("[A-Za-z]{1,8}")
            ) {
                let grant = EndpointPermission::new("Server", [EndpointPermissionAction::Read]);
                let identifier = match param {
                    Some(p) => format!("server/{action}/{p}"),
                    None => format!("SERVER/{action}"),
                };
                prop_assert!(grant.matches(&identifier));
                prop_assert!(grant.allows(EndpointPermissionAction::Read));
                prop_assert!(!grant.allows(EndpointPermissionAction::Delete));
            }

            /// Property: `None` never allows anything.
            #[test]
            fn none_grants_nothing(idx in 0usize..4) {
                let grant = EndpointPermission::new(ALL_ENDPOINTS, [EndpointPermissionAction::None]);
                prop_assert!(!grant.allows(SPECIFIC[idx]));
            }
        }
    }
}
