//! Claim vocabulary shared by token issuance and validation.
//!
//! Claims are always exposed under canonical short names. A [`ClaimTypeMap`]
//! translates them to and from the names written on the wire, so both sides
//! of the token engine use one table and round-trips stay lossless.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub mod canonical {
    pub const SUBJECT: &str = "sub";
    pub const USERNAME: &str = "username";
    pub const EMAIL: &str = "email";
    pub const DISPLAY_NAME: &str = "name";
    pub const TOKEN_ID: &str = "jti";
    pub const ROLE: &str = "role";
}

/// Bidirectional map between canonical claim names and wire claim names.
///
/// Outbound, each canonical name has exactly one wire name. Inbound, several
/// wire names (aliases) may map onto the same canonical name. Unknown claims
/// pass through unchanged in both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimTypeMap {
    outbound: HashMap<String, String>,
    inbound: HashMap<String, String>,
}

impl ClaimTypeMap {
    /// An empty map: every claim keeps its name.
    pub fn identity() -> Self {
        Self {
            outbound: HashMap::new(),
            inbound: HashMap::new(),
        }
    }

    /// Map `canonical` to `wire` in both directions.
    pub fn with(mut self, canonical: &str, wire: &str) -> Self {
        self.outbound.insert(canonical.to_string(), wire.to_string());
        self.inbound.insert(wire.to_ascii_lowercase(), canonical.to_string());
        self
    }

    /// Accept `wire` as an additional inbound name for `canonical`.
    pub fn with_alias(mut self, canonical: &str, wire: &str) -> Self {
        self.inbound.insert(wire.to_ascii_lowercase(), canonical.to_string());
        self
    }

    /// Canonical name -> wire name (issuance side).
    pub fn to_wire<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.outbound.get(canonical).map(String::as_str).unwrap_or(canonical)
    }

    /// Wire name -> canonical name (validation side). Case-insensitive.
    pub fn to_canonical<'a>(&'a self, wire: &'a str) -> &'a str {
        self.inbound
            .get(&wire.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or(wire)
    }
}

impl Default for ClaimTypeMap {
    /// JWT short names, plus the long-form identity claim URIs some issuers emit.
    fn default() -> Self {
        use canonical::*;

        Self::identity()
            .with(SUBJECT, "sub")
            .with(USERNAME, "unique_name")
            .with(EMAIL, "email")
            .with(DISPLAY_NAME, "name")
            .with(TOKEN_ID, "jti")
            .with(ROLE, "role")
            .with_alias(USERNAME, "username")
            .with_alias(ROLE, "roles")
            .with_alias(
                SUBJECT,
                "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
            )
            .with_alias(USERNAME, "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name")
            .with_alias(
                EMAIL,
                "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress",
            )
            .with_alias(ROLE, "http://schemas.microsoft.com/ws/2008/06/identity/claims/role")
    }
}

/// A single name/value claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub name: String,
    pub value: String,
}

/// Ordered claim collection with case-insensitive name lookup.
///
/// A name may occur several times (one `role` claim per role).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Vec<Claim>);

impl ClaimSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Claim {
            name: name.into(),
            value: value.into(),
        });
    }

    /// First value for `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.all(name).next()
    }

    /// Every value for `name`, in insertion order.
    pub fn all<'a, 'b>(&'a self, name: &'b str) -> impl Iterator<Item = &'a str> + use<'a, 'b> {
        self.0
            .iter()
            .filter(move |c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.first(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object view; repeated names become arrays.
    pub fn to_json(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for claim in &self.0 {
            let value = serde_json::Value::String(claim.value.clone());
            match out.get_mut(&claim.name) {
                None => {
                    out.insert(claim.name.clone(), value);
                }
                Some(serde_json::Value::Array(values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = serde_json::Value::Array(vec![first, value]);
                }
            }
        }
        serde_json::Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_is_bidirectional() {
        let map = ClaimTypeMap::default();
        assert_eq!(map.to_wire(canonical::USERNAME), "unique_name");
        assert_eq!(map.to_canonical("unique_name"), canonical::USERNAME);
        assert_eq!(map.to_canonical("Unique_Name"), canonical::USERNAME);

        for name in [
            canonical::SUBJECT,
            canonical::USERNAME,
            canonical::EMAIL,
            canonical::DISPLAY_NAME,
            canonical::TOKEN_ID,
            canonical::ROLE,
        ] {
            assert_eq!(map.to_canonical(map.to_wire(name)), name);
        }
    }

    #[test]
    fn long_form_aliases_normalize() {
        let map = ClaimTypeMap::default();
        assert_eq!(
            map.to_canonical("http://schemas.microsoft.com/ws/2008/06/identity/claims/role"),
            canonical::ROLE
        );
        assert_eq!(map.to_canonical("tenant"), "tenant");
    }

    #[test]
    fn claim_set_lookup_is_case_insensitive_and_keeps_duplicates() {
        let mut claims = ClaimSet::new();
        claims.push("role", "admin");
        claims.push("Role", "user");
        claims.push("sub", "abc");

        assert_eq!(claims.all("ROLE").collect::<Vec<_>>(), vec!["admin", "user"]);
        assert_eq!(claims.first("SUB"), Some("abc"));
        assert!(!claims.contains("email"));

        let json = claims.to_json();
        assert_eq!(json["sub"], "abc");
        assert_eq!(json["role"], "admin");
        assert_eq!(json["Role"], "user");
    }

    #[test]
    fn to_json_collects_repeated_names_into_arrays() {
        let mut claims = ClaimSet::new();
        claims.push("role", "a");
        claims.push("role", "b");
        claims.push("role", "c");

        assert_eq!(claims.to_json()["role"], serde_json::json!(["a", "b", "c"]));
    }

    #[test]
    fn values_outlive_the_lookup_name() {
        let mut claims = ClaimSet::new();
        claims.push("email", "alice@example.com");

        let email = {
            let name = String::from("EMAIL");
            claims.first(&name)
        };
        assert_eq!(email, Some("alice@example.com"));

        let roles: Vec<&str> = {
            let name = canonical::ROLE.to_uppercase();
            claims.all(&name).collect()
        };
        assert!(roles.is_empty());
    }
}
