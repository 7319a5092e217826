//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;

use thiserror::Error;

use inventra_auth::{TokenEngine, TokenError, TokenSettings};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_LIFETIME_MINUTES: i64 = 60;
/// One year.
pub const MAX_LIFETIME_MINUTES: i64 = 60 * 24 * 365;

/// Startup configuration failure. Fatal: the service must not start.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token: TokenSettings,
    pub bind_addr: SocketAddr,
    /// When set, an `admin` account authenticating with this API key is seeded.
    pub bootstrap_admin_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let lifetime_minutes = match get("JWT_LIFETIME_MINUTES") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(m) if (1..=MAX_LIFETIME_MINUTES).contains(&m) => m,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "JWT_LIFETIME_MINUTES",
                        reason: format!("expected 1 to {MAX_LIFETIME_MINUTES} minutes, got '{raw}'"),
                    });
                }
            },
            None => DEFAULT_LIFETIME_MINUTES,
        };

        let token = TokenSettings {
            secret: required("JWT_SECRET")?,
            issuer: required("JWT_ISSUER")?,
            audience: required("JWT_AUDIENCE")?,
            lifetime_minutes,
        };

        // Decode the secret now so a bad one never reaches request handling.
        TokenEngine::new(&token).map_err(|e| ConfigError::Invalid {
            name: match &e {
                TokenError::InvalidLifetime(_) => "JWT_LIFETIME_MINUTES",
                _ => "JWT_SECRET",
            },
            reason: e.to_string(),
        })?;

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            name: "BIND_ADDR",
            reason: format!("{e}"),
        })?;

        Ok(Self {
            token,
            bind_addr,
            bootstrap_admin_api_key: get("BOOTSTRAP_ADMIN_API_KEY"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SECRET: &str = "dGVzdC1zZWNyZXQta2V5LWZvci10ZXN0aW5nLW9ubHk=";

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("JWT_SECRET", SECRET),
            ("JWT_ISSUER", "inventra"),
            ("JWT_AUDIENCE", "inventra-clients"),
        ]
    }

    #[test]
    fn applies_defaults() {
        let cfg = AppConfig::from_lookup(vars(&base())).unwrap();
        assert_eq!(cfg.token.lifetime_minutes, DEFAULT_LIFETIME_MINUTES);
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.bootstrap_admin_api_key, None);
    }

    #[test]
    fn required_values_must_be_present_and_non_empty() {
        let mut pairs = base();
        pairs.retain(|(k, _)| *k != "JWT_ISSUER");
        assert_eq!(
            AppConfig::from_lookup(vars(&pairs)).unwrap_err(),
            ConfigError::Missing("JWT_ISSUER")
        );

        let mut pairs = base();
        pairs[2] = ("JWT_AUDIENCE", "  ");
        assert_eq!(
            AppConfig::from_lookup(vars(&pairs)).unwrap_err(),
            ConfigError::Missing("JWT_AUDIENCE")
        );
    }

    #[test]
    fn rejects_non_base64_secret() {
        let mut pairs = base();
        pairs[0] = ("JWT_SECRET", "not base64!!");
        let err = AppConfig::from_lookup(vars(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "JWT_SECRET", .. }));
    }

    #[test]
    fn rejects_bad_lifetime_and_bind_addr() {
        let mut pairs = base();
        pairs.push(("JWT_LIFETIME_MINUTES", "0"));
        assert!(matches!(
            AppConfig::from_lookup(vars(&pairs)),
            Err(ConfigError::Invalid { name: "JWT_LIFETIME_MINUTES", .. })
        ));

        for huge in ["999999999999999", "525601"] {
            let mut pairs = base();
            pairs.push(("JWT_LIFETIME_MINUTES", huge));
            assert!(matches!(
                AppConfig::from_lookup(vars(&pairs)),
                Err(ConfigError::Invalid { name: "JWT_LIFETIME_MINUTES", .. })
            ));
        }

        let mut pairs = base();
        pairs.push(("JWT_LIFETIME_MINUTES", "525600"));
        assert_eq!(AppConfig::from_lookup(vars(&pairs)).unwrap().token.lifetime_minutes, MAX_LIFETIME_MINUTES);

        let mut pairs = base();
        pairs.push(("BIND_ADDR", "localhost"));
        assert!(matches!(
            AppConfig::from_lookup(vars(&pairs)),
            Err(ConfigError::Invalid { name: "BIND_ADDR", .. })
        ));
    }
}
