//! Token engine: issues and validates HMAC-SHA256 signed JWTs.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use inventra_core::AccountId;

use crate::claims::canonical;
use crate::{Account, ClaimSet, ClaimTypeMap, Principal, RoleName};

/// Settings the engine is built from. `secret` is Base64.
#[derive(Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub lifetime_minutes: i64,
}

impl core::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("lifetime_minutes", &self.lifetime_minutes)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token issuer is invalid")]
    InvalidIssuer,

    #[error("token audience is invalid")]
    InvalidAudience,

    #[error("token has expired")]
    Expired,

    #[error("token is missing required claim '{0}'")]
    MissingClaim(String),

    #[error("token claim '{0}' is malformed")]
    MalformedClaim(String),

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("signing secret is not valid Base64: {0}")]
    MalformedSecret(String),

    #[error("token lifetime of {0} minutes is out of range")]
    InvalidLifetime(i64),

    #[error("token could not be encoded: {0}")]
    Encoding(String),
}

/// Issues and validates tokens for one issuer/audience/secret triple.
pub struct TokenEngine {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    lifetime: TimeDelta,
    claim_map: ClaimTypeMap,
}

impl TokenEngine {
    /// Decode the Base64 secret and build the signing keys.
    ///
    /// Fails with [`TokenError::MalformedSecret`] if the secret is not valid
    /// Base64 or decodes to nothing, and with [`TokenError::InvalidLifetime`]
    /// unless the lifetime is a positive, representable number of minutes.
    pub fn new(settings: &TokenSettings) -> Result<Self, TokenError> {
        let secret = general_purpose::STANDARD
            .decode(settings.secret.trim())
            .map_err(|e| TokenError::MalformedSecret(e.to_string()))?;
        if secret.is_empty() {
            return Err(TokenError::MalformedSecret("secret is empty".to_string()));
        }
        let lifetime = TimeDelta::try_minutes(settings.lifetime_minutes)
            .filter(|l| *l > TimeDelta::zero())
            .ok_or(TokenError::InvalidLifetime(settings.lifetime_minutes))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&secret),
            decoding_key: DecodingKey::from_secret(&secret),
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            lifetime,
            claim_map: ClaimTypeMap::default(),
        })
    }

    /// Replace the claim vocabulary used on both sides of the engine.
    pub fn with_claim_map(mut self, claim_map: ClaimTypeMap) -> Self {
        self.claim_map = claim_map;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn issue(&self, account: &Account, roles: &[RoleName]) -> Result<String, TokenError> {
        self.issue_at(account, roles, Utc::now())
    }

    /// Issue a token as of `now`; expiry is `now + lifetime`.
    pub fn issue_at(&self, account: &Account, roles: &[RoleName], now: DateTime<Utc>) -> Result<String, TokenError> {
        let mut claims = ClaimSet::new();
        claims.push(canonical::SUBJECT, account.id.to_string());
        claims.push(canonical::USERNAME, account.username.clone());
        claims.push(canonical::EMAIL, account.email.clone());
        claims.push(canonical::DISPLAY_NAME, account.display_name.clone());
        claims.push(canonical::TOKEN_ID, Uuid::new_v4().to_string());
        for role in roles {
            claims.push(canonical::ROLE, role.as_str().to_string());
        }

        let mut payload = match claims.to_json() {
            Value::Object(map) => rename_keys(map, |name| self.claim_map.to_wire(name).to_string()),
            _ => Map::new(),
        };
        payload.insert("iss".to_string(), Value::from(self.issuer.clone()));
        payload.insert("aud".to_string(), Value::from(self.audience.clone()));
        payload.insert("iat".to_string(), Value::from(now.timestamp()));
        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| TokenError::Encoding("expiry is out of range".to_string()))?;
        payload.insert("exp".to_string(), Value::from(expires_at.timestamp()));

        let token = encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        tracing::debug!(account_id = %account.id, roles = roles.len(), "issued token");
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<Principal, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate signature, issuer, audience and expiry as of `now` (no
    /// clock-skew allowance), then check the required claims are present.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Expiry is checked below against `now`, strictly.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let data = decode::<Map<String, Value>>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
            ErrorKind::InvalidAudience => TokenError::InvalidAudience,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::MissingRequiredClaim(claim) => TokenError::MissingClaim(claim.clone()),
            _ => TokenError::Malformed(e.to_string()),
        })?;

        let exp = data
            .claims
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or_else(|| TokenError::MalformedClaim("exp".to_string()))?;
        if now.timestamp() >= exp {
            return Err(TokenError::Expired);
        }

        let claims = self.read_claims(data.claims);
        for required in [canonical::SUBJECT, canonical::TOKEN_ID, canonical::ROLE] {
            if !claims.contains(required) {
                return Err(TokenError::MissingClaim(required.to_string()));
            }
        }

        let account_id: AccountId = claims
            .first(canonical::SUBJECT)
            .unwrap_or_default()
            .parse()
            .map_err(|_| TokenError::MalformedClaim(canonical::SUBJECT.to_string()))?;
        let username = claims.first(canonical::USERNAME).unwrap_or_default().to_string();
        let roles = claims
            .all(canonical::ROLE)
            .map(|r| RoleName::from(r.to_string()))
            .collect();

        Ok(Principal::new(account_id, username, roles, claims))
    }

    /// Flatten wire claims into canonical name/value pairs.
    fn read_claims(&self, wire: Map<String, Value>) -> ClaimSet {
        let mut claims = ClaimSet::new();
        for (name, value) in wire {
            let name = self.claim_map.to_canonical(&name).to_string();
            match value {
                Value::Array(values) => {
                    for v in values {
                        claims.push(name.clone(), claim_value(v));
                    }
                }
                Value::Null => {}
                v => claims.push(name, claim_value(v)),
            }
        }
        claims
    }
}

fn claim_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn rename_keys(map: Map<String, Value>, rename: impl Fn(&str) -> String) -> Map<String, Value> {
    map.into_iter().map(|(k, v)| (rename(&k), v)).collect()
}
