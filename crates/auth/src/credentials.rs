//! Credential extraction from raw request headers.
//!
//! Pure parsing: no lookups, no IO. The transport layer hands over the raw
//! header values as [`CredentialHeaders`].

use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;

pub const API_KEY_HEADER: &str = "ApiKey";
pub const AUTHORIZATION_HEADER: &str = "Authorization";

const BASIC_PREFIX: &str = "basic ";
const BEARER_PREFIX: &str = "bearer ";

/// A credential presented by a caller. Lives for one request only.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    ApiKey(String),
    Basic { username: String, password: String },
    Bearer(String),
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(..)"),
            Self::Basic { username, .. } => f.debug_struct("Basic").field("username", username).finish_non_exhaustive(),
            Self::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("API Key was not provided.")]
    MissingApiKey,

    #[error("Authorization header was not provided.")]
    MissingAuthorization,

    #[error("Authorization header is not a Basic credential.")]
    NotBasic,

    #[error("Authorization header is not a Bearer token.")]
    NotBearer,

    #[error("Invalid Basic authentication header: {0}")]
    Decode(String),

    #[error("Basic authentication credentials do not resolve to username:password format.")]
    Format,
}

/// Raw values of the headers that can carry a credential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CredentialHeaders<'a> {
    pub api_key: Option<&'a str>,
    pub authorization: Option<&'a str>,
}

impl<'a> CredentialHeaders<'a> {
    pub fn new(api_key: Option<&'a str>, authorization: Option<&'a str>) -> Self {
        Self { api_key, authorization }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn is_basic(&self) -> bool {
        self.authorization.is_some_and(|v| starts_with_ignore_case(v, BASIC_PREFIX))
    }

    pub fn is_bearer(&self) -> bool {
        self.authorization.is_some_and(|v| starts_with_ignore_case(v, BEARER_PREFIX))
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.len() >= prefix.len()
        && value.is_char_boundary(prefix.len())
        && value[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// `ApiKey: <key>`
pub fn extract_api_key(headers: &CredentialHeaders<'_>) -> Result<Credential, CredentialError> {
    match headers.api_key.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(Credential::ApiKey(key.to_string())),
        _ => Err(CredentialError::MissingApiKey),
    }
}

/// `Authorization: Basic base64(username:password)`
pub fn extract_basic(headers: &CredentialHeaders<'_>) -> Result<Credential, CredentialError> {
    let header = headers.authorization.ok_or(CredentialError::MissingAuthorization)?;
    if !starts_with_ignore_case(header, BASIC_PREFIX) {
        return Err(CredentialError::NotBasic);
    }

    let encoded = header[BASIC_PREFIX.len()..].trim();
    let decoded = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| CredentialError::Decode(e.to_string()))?;
    let decoded = String::from_utf8(decoded).map_err(|e| CredentialError::Decode(e.to_string()))?;

    match decoded.split_once(':') {
        Some((username, password)) => Ok(Credential::Basic {
            username: username.to_string(),
            password: password.to_string(),
        }),
        None => Err(CredentialError::Format),
    }
}

/// `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &CredentialHeaders<'_>) -> Result<Credential, CredentialError> {
    let header = headers.authorization.ok_or(CredentialError::MissingAuthorization)?;
    if !starts_with_ignore_case(header, BEARER_PREFIX) {
        return Err(CredentialError::NotBearer);
    }

    let token = header[BEARER_PREFIX.len()..].trim();
    if token.is_empty() {
        return Err(CredentialError::NotBearer);
    }
    Ok(Credential::Bearer(token.to_string()))
}
