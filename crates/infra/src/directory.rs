//! In-memory account directory: provisioning and credential resolution.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use inventra_auth::{Account, AccountLookupError, AccountResolver, BootstrapRole, Credential, RoleName};
use inventra_core::{AccountId, DomainError};

use crate::crypto;

/// Request to create an account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub password: Option<String>,
    /// Use this API key instead of generating one.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub ip_restriction: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// A freshly created account and its plaintext API key (shown once).
#[derive(Debug, Clone)]
pub struct ProvisionedAccount {
    pub account: Account,
    pub api_key: String,
}

#[derive(Debug, Clone)]
struct StoredAccount {
    account: Account,
    password_hash: Option<String>,
    api_key_hash: String,
}

#[derive(Debug, Default)]
struct Indexes {
    accounts: HashMap<AccountId, StoredAccount>,
    by_username: HashMap<String, AccountId>,
    by_api_key: HashMap<String, AccountId>,
}

/// Thread-safe account directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    inner: RwLock<Indexes>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account. Roles default to `guest` when none are given.
    pub fn provision(&self, new: NewAccount) -> Result<ProvisionedAccount, DomainError> {
        let username = new.username.trim().to_string();
        if username.is_empty() || username.contains(':') {
            return Err(DomainError::validation("username must be non-empty and must not contain ':'"));
        }
        if !new.email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }

        let roles: Vec<RoleName> = if new.roles.is_empty() {
            vec![RoleName::from(BootstrapRole::Guest.name())]
        } else {
            new.roles.iter().map(|r| RoleName::from(r.trim())).collect()
        };

        let password_hash = new.password.as_deref().map(crypto::hash_password).transpose()?;
        let api_key = new.api_key.unwrap_or_else(crypto::generate_api_key);
        let api_key_hash = crypto::hash_api_key(&api_key);

        let account = Account {
            id: AccountId::new(),
            username: username.clone(),
            email: new.email.trim().to_lowercase(),
            display_name: new.display_name.trim().to_string(),
            ip_restriction: new.ip_restriction.filter(|s| !s.trim().is_empty()),
            created_at: Utc::now(),
            expires_at: new.expires_at,
            roles,
        };

        let mut idx = self
            .inner
            .write()
            .map_err(|_| DomainError::unavailable("account directory lock poisoned"))?;
        let username_key = username.to_lowercase();
        if idx.by_username.contains_key(&username_key) {
            return Err(DomainError::conflict(format!("username '{username}' is taken")));
        }
        if idx.by_api_key.contains_key(&api_key_hash) {
            return Err(DomainError::conflict("API key is already in use"));
        }

        idx.by_username.insert(username_key, account.id);
        idx.by_api_key.insert(api_key_hash.clone(), account.id);
        idx.accounts.insert(
            account.id,
            StoredAccount {
                account: account.clone(),
                password_hash,
                api_key_hash,
            },
        );

        tracing::info!(account_id = %account.id, username = %account.username, "account provisioned");
        Ok(ProvisionedAccount { account, api_key })
    }

    pub fn get(&self, id: AccountId) -> Option<Account> {
        let idx = self.inner.read().ok()?;
        idx.accounts.get(&id).map(|s| s.account.clone())
    }

    fn lookup(&self, credential: &Credential) -> Result<Account, AccountLookupError> {
        let idx = self
            .inner
            .read()
            .map_err(|_| AccountLookupError::Unavailable("account directory lock poisoned".to_string()))?;

        match credential {
            Credential::ApiKey(key) => {
                let id = idx
                    .by_api_key
                    .get(&crypto::hash_api_key(key))
                    .ok_or(AccountLookupError::NotFound)?;
                idx.accounts
                    .get(id)
                    .map(|s| s.account.clone())
                    .ok_or(AccountLookupError::NotFound)
            }
            Credential::Basic { username, password } => {
                let stored = idx
                    .by_username
                    .get(&username.to_lowercase())
                    .and_then(|id| idx.accounts.get(id))
                    .ok_or(AccountLookupError::InvalidPassword)?;
                let verified = stored
                    .password_hash
                    .as_deref()
                    .is_some_and(|hash| crypto::verify_password(password, hash));
                if !verified {
                    return Err(AccountLookupError::InvalidPassword);
                }
                Ok(stored.account.clone())
            }
            Credential::Bearer(_) => Err(AccountLookupError::UnsupportedCredential),
        }
    }
}

#[async_trait]
impl AccountResolver for InMemoryAccountDirectory {
    async fn resolve(&self, credential: &Credential, remote_ip: Option<IpAddr>) -> Result<Account, AccountLookupError> {
        let account = self.lookup(credential)?;
        account.check_access(remote_ip, Utc::now())?;
        Ok(account)
    }
}
