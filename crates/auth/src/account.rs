//! Account model and the collaborator interfaces the auth core depends on.

use std::net::{IpAddr, Ipv4Addr};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use inventra_core::AccountId;

use crate::{Credential, Role, RoleName};

/// Persisted identity, as handed over by the account store.
///
/// Secrets are never part of this type: password and API-key hashes stay
/// with the store that owns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub ip_restriction: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub roles: Vec<RoleName>,
}

impl Account {
    /// Expiry and source-IP policy shared by every credential scheme.
    pub fn check_access(&self, remote_ip: Option<IpAddr>, now: DateTime<Utc>) -> Result<(), AccountLookupError> {
        if self.expires_at.is_some_and(|exp| now >= exp) {
            return Err(AccountLookupError::Expired);
        }

        let Some(raw) = self.ip_restriction.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(());
        };
        let restriction = IpRestriction::parse(raw);
        match remote_ip {
            Some(ip) if restriction.permits(ip) => Ok(()),
            Some(ip) => Err(AccountLookupError::IpNotAllowed(ip.to_string())),
            None => Err(AccountLookupError::IpNotAllowed("unknown".to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountLookupError {
    #[error("Account not found.")]
    NotFound,

    #[error("Invalid username or password.")]
    InvalidPassword,

    #[error("Account has expired.")]
    Expired,

    #[error("IP address {0} is not allowed for this account.")]
    IpNotAllowed(String),

    #[error("Credential type is not supported by the account store.")]
    UnsupportedCredential,

    #[error("Account store unavailable.")]
    Unavailable(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("role store unavailable: {0}")]
pub struct RoleLookupError(pub String);

/// Turns a credential into an account (or a reason it cannot).
#[async_trait]
pub trait AccountResolver: Send + Sync {
    async fn resolve(&self, credential: &Credential, remote_ip: Option<IpAddr>) -> Result<Account, AccountLookupError>;
}

/// Read access to stored roles.
///
/// `Ok(None)` means "no such role" and is not an error.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn role_by_name(&self, name: &str) -> Result<Option<Role>, RoleLookupError>;

    async fn list_roles(&self) -> Result<Vec<Role>, RoleLookupError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum IpRule {
    Exact(IpAddr),
    Slash24([u8; 3]),
}

/// Parsed form of an account's IP restriction string.
///
/// Comma-separated entries. An IPv4 entry matches its whole /24: a full
/// address `a.b.c.d` admits itself and every `a.b.c.*` neighbour, as do the
/// `a.b.c.*`, `a.b.c` and `a.b.c.0/24` spellings. IPv6 entries only match
/// exactly. Unparseable entries match nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpRestriction {
    rules: Vec<IpRule>,
}

impl IpRestriction {
    pub fn parse(raw: &str) -> Self {
        let rules = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(parse_rule)
            .collect();
        Self { rules }
    }

    pub fn permits(&self, ip: IpAddr) -> bool {
        let ip = canonical_ip(ip);
        self.rules.iter().any(|rule| match rule {
            IpRule::Exact(allowed) => canonical_ip(*allowed) == ip,
            IpRule::Slash24(prefix) => match ip {
                IpAddr::V4(v4) => v4.octets()[..3] == prefix[..],
                IpAddr::V6(_) => false,
            },
        })
    }
}

fn parse_rule(entry: &str) -> Option<IpRule> {
    if let Some(network) = entry.strip_suffix("/24") {
        let v4: Ipv4Addr = network.parse().ok()?;
        let o = v4.octets();
        return Some(IpRule::Slash24([o[0], o[1], o[2]]));
    }
    match entry.parse::<IpAddr>().map(canonical_ip) {
        Ok(IpAddr::V4(v4)) => {
            let o = v4.octets();
            return Some(IpRule::Slash24([o[0], o[1], o[2]]));
        }
        Ok(v6) => return Some(IpRule::Exact(v6)),
        Err(_) => {}
    }

    let network = entry.strip_suffix(".*").unwrap_or(entry);
    let octets: Vec<u8> = network
        .split('.')
        .map(|p| p.parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    match octets.as_slice() {
        [a, b, c] => Some(IpRule::Slash24([*a, *b, *c])),
        _ => None,
    }
}

fn canonical_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn account(ip_restriction: Option<&str>) -> Account {
        Account {
            id: AccountId::new(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            display_name: "Alice".into(),
            ip_restriction: ip_restriction.map(str::to_string),
            created_at: Utc::now(),
            expires_at: None,
            roles: vec![RoleName::from("user")],
        }
    }

    #[test]
    fn full_ipv4_address_admits_itself_and_its_slash24() {
        let r = IpRestriction::parse("10.1.2.3");
        assert!(r.permits(ip("10.1.2.3")));
        assert!(r.permits(ip("10.1.2.200")));
        assert!(!r.permits(ip("10.1.3.3")));
        assert!(!r.permits(ip("11.1.2.3")));
    }

    #[test]
    fn ipv6_entry_matches_only_itself() {
        let r = IpRestriction::parse("2001:db8::1");
        assert!(r.permits(ip("2001:db8::1")));
        assert!(!r.permits(ip("2001:db8::2")));
    }

    #[test]
    fn slash24_forms_match_the_whole_range() {
        for raw in ["10.1.2.*", "10.1.2", "10.1.2.0/24"] {
            let r = IpRestriction::parse(raw);
            assert!(r.permits(ip("10.1.2.200")), "{raw}");
            assert!(!r.permits(ip("10.1.3.1")), "{raw}");
        }
    }

    #[test]
    fn lists_and_mapped_ipv6() {
        let r = IpRestriction::parse("192.168.0.1, ::1");
        assert!(r.permits(ip("::ffff:192.168.0.1")));
        assert!(r.permits(ip("::1")));
        assert!(r.permits(ip("192.168.0.2")));
        assert!(!r.permits(ip("192.168.1.1")));
    }

    #[test]
    fn garbage_matches_nothing() {
        let r = IpRestriction::parse("not-an-ip");
        assert!(!r.permits(ip("127.0.0.1")));
    }

    #[test]
    fn unrestricted_account_accepts_any_caller() {
        let acct = account(None);
        assert!(acct.check_access(None, Utc::now()).is_ok());
        assert!(acct.check_access(Some(ip("8.8.8.8")), Utc::now()).is_ok());
    }

    #[test]
    fn restricted_account_rejects_other_addresses() {
        let acct = account(Some("10.0.0.*"));
        assert!(acct.check_access(Some(ip("10.0.0.9")), Utc::now()).is_ok());

        let err = acct.check_access(Some(ip("10.0.1.9")), Utc::now()).unwrap_err();
        assert_eq!(err, AccountLookupError::IpNotAllowed("10.0.1.9".into()));
        assert!(acct.check_access(None, Utc::now()).is_err());
    }

    #[test]
    fn expired_account_is_rejected() {
        let now = Utc::now();
        let mut acct = account(None);
        acct.expires_at = Some(now);
        assert_eq!(acct.check_access(None, now), Err(AccountLookupError::Expired));

        acct.expires_at = Some(now + Duration::minutes(1));
        assert!(acct.check_access(None, now).is_ok());
    }
}
