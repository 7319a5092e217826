//! `inventra-auth`: authentication and endpoint authorization core.
//!
//! This crate is intentionally decoupled from HTTP and storage: header values
//! come in as plain strings, accounts and roles come from the
//! [`AccountResolver`] and [`RoleStore`] collaborators.

pub mod account;
pub mod authorize;
pub mod claims;
pub mod credentials;
pub mod dispatch;
pub mod endpoint;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod token;

pub use account::{Account, AccountLookupError, AccountResolver, IpRestriction, RoleLookupError, RoleStore};
pub use authorize::{AuthorizationGrant, AuthzError, DenialKind, authorize_endpoint};
pub use claims::{Claim, ClaimSet, ClaimTypeMap};
pub use credentials::{
    API_KEY_HEADER, AUTHORIZATION_HEADER, Credential, CredentialError, CredentialHeaders, extract_api_key,
    extract_basic, extract_bearer,
};
pub use dispatch::{
    AuthenticateResult, Authenticated, INVALID_SCHEME_MESSAGE, Scheme, SchemeDispatcher, authenticate_bearer,
    select_scheme,
};
pub use endpoint::{EndpointDescriptor, EndpointTable};
pub use permissions::{EndpointPermissionAction, HttpVerb, VerbError};
pub use principal::Principal;
pub use roles::{ALL_ENDPOINTS, BootstrapRole, EndpointPermission, Role, RoleName, bootstrap_roles};
pub use token::{TokenEngine, TokenError, TokenSettings};
