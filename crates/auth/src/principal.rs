use serde::Serialize;

use inventra_core::AccountId;

use crate::{ClaimSet, RoleName};

/// Authenticated identity for the duration of one request.
///
/// Built once per request by the token engine (or from a resolved account)
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    account_id: AccountId,
    username: String,
    roles: Vec<RoleName>,
    claims: ClaimSet,
}

impl Principal {
    pub fn new(account_id: AccountId, username: impl Into<String>, roles: Vec<RoleName>, claims: ClaimSet) -> Self {
        Self {
            account_id,
            username: username.into(),
            roles,
            claims,
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Role names in claim order.
    pub fn roles(&self) -> &[RoleName] {
        &self.roles
    }

    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.as_str().eq_ignore_ascii_case(name))
    }
}

impl Principal {
    /// Principal for a freshly resolved account (no token involved).
    pub fn from_account(account: &crate::Account) -> Self {
        use crate::claims::canonical;

        let mut claims = ClaimSet::new();
        claims.push(canonical::SUBJECT, account.id.to_string());
        claims.push(canonical::USERNAME, account.username.clone());
        claims.push(canonical::EMAIL, account.email.clone());
        claims.push(canonical::DISPLAY_NAME, account.display_name.clone());
        for role in &account.roles {
            claims.push(canonical::ROLE, role.as_str().to_string());
        }

        Self::new(account.id, account.username.clone(), account.roles.clone(), claims)
    }
}
