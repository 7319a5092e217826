//! Scheme dispatcher: picks the credential scheme from the request headers
//! and turns the outcome into one uniform result.
//!
//! ApiKey and Basic are only accepted by the credential-exchange endpoint;
//! business endpoints are protected by Bearer tokens via
//! [`authenticate_bearer`].

use std::net::IpAddr;
use std::sync::Arc;

use serde::Serialize;

use crate::{
    Account, AccountResolver, CredentialError, CredentialHeaders, Principal, TokenEngine, extract_api_key,
    extract_basic, extract_bearer,
};

pub const INVALID_SCHEME_MESSAGE: &str =
    "Invalid authentication scheme. Valid options are ApiKey, Basic or OpenIdConnect/Bearer.";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Scheme {
    ApiKey,
    Basic,
    Bearer,
    /// Anything else, including no credential at all.
    Unsupported,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKey => "ApiKey",
            Self::Basic => "Basic",
            Self::Bearer => "Bearer",
            Self::Unsupported => "Unsupported",
        }
    }
}

impl core::fmt::Display for Scheme {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub scheme: Scheme,
    /// Present when the principal came from the account store rather than a token.
    pub account: Option<Account>,
    pub principal: Principal,
}

/// Terminal outcome of authenticating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticateResult {
    Success(Box<Authenticated>),
    /// Credentials were presented but rejected.
    Fail { scheme: Scheme, reason: String },
    /// The expected credential was not presented.
    Challenge { scheme: Scheme, reason: String },
}

impl AuthenticateResult {
    fn fail(scheme: Scheme, reason: impl Into<String>) -> Self {
        Self::Fail {
            scheme,
            reason: reason.into(),
        }
    }

    fn challenge(scheme: Scheme, reason: impl Into<String>) -> Self {
        Self::Challenge {
            scheme,
            reason: reason.into(),
        }
    }

    fn from_credential_error(scheme: Scheme, err: CredentialError) -> Self {
        match err {
            CredentialError::MissingApiKey | CredentialError::MissingAuthorization => Self::challenge(scheme, err.to_string()),
            other => Self::fail(scheme, other.to_string()),
        }
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            Self::Success(auth) => auth.scheme,
            Self::Fail { scheme, .. } | Self::Challenge { scheme, .. } => *scheme,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Header precedence: `ApiKey`, then `Authorization: Basic`, else unsupported.
pub fn select_scheme(headers: &CredentialHeaders<'_>) -> Scheme {
    if headers.has_api_key() {
        Scheme::ApiKey
    } else if headers.is_basic() {
        Scheme::Basic
    } else {
        Scheme::Unsupported
    }
}

/// Authenticates ApiKey and Basic credentials against an account resolver.
#[derive(Clone)]
pub struct SchemeDispatcher {
    resolver: Arc<dyn AccountResolver>,
}

impl SchemeDispatcher {
    pub fn new(resolver: Arc<dyn AccountResolver>) -> Self {
        Self { resolver }
    }

    pub async fn authenticate(&self, headers: &CredentialHeaders<'_>, remote_ip: Option<IpAddr>) -> AuthenticateResult {
        let scheme = select_scheme(headers);
        let credential = match scheme {
            Scheme::ApiKey => extract_api_key(headers),
            Scheme::Basic => extract_basic(headers),
            Scheme::Bearer | Scheme::Unsupported => {
                tracing::debug!("no supported credential scheme presented");
                return if headers.authorization.is_none() {
                    AuthenticateResult::challenge(scheme, INVALID_SCHEME_MESSAGE)
                } else {
                    AuthenticateResult::fail(scheme, INVALID_SCHEME_MESSAGE)
                };
            }
        };

        let credential = match credential {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(%scheme, error = %e, "credential could not be parsed");
                return AuthenticateResult::from_credential_error(scheme, e);
            }
        };

        match self.resolver.resolve(&credential, remote_ip).await {
            Ok(account) => {
                tracing::debug!(%scheme, account_id = %account.id, "authenticated");
                let principal = Principal::from_account(&account);
                AuthenticateResult::Success(Box::new(Authenticated {
                    scheme,
                    account: Some(account),
                    principal,
                }))
            }
            Err(e) => {
                tracing::info!(%scheme, error = %e, "authentication failed");
                AuthenticateResult::fail(scheme, e.to_string())
            }
        }
    }
}

/// Authenticate `Authorization: Bearer <jwt>` with the token engine.
pub fn authenticate_bearer(engine: &TokenEngine, headers: &CredentialHeaders<'_>) -> AuthenticateResult {
    let token = match extract_bearer(headers) {
        Ok(crate::Credential::Bearer(token)) => token,
        Ok(_) => return AuthenticateResult::fail(Scheme::Bearer, INVALID_SCHEME_MESSAGE),
        Err(CredentialError::NotBearer) => return AuthenticateResult::fail(Scheme::Bearer, INVALID_SCHEME_MESSAGE),
        Err(e) => return AuthenticateResult::from_credential_error(Scheme::Bearer, e),
    };

    match engine.validate(&token) {
        Ok(principal) => AuthenticateResult::Success(Box::new(Authenticated {
            scheme: Scheme::Bearer,
            account: None,
            principal,
        })),
        Err(e) => {
            tracing::info!(error = %e, "bearer token rejected");
            AuthenticateResult::fail(Scheme::Bearer, e.to_string())
        }
    }
}
