//! Configuration loading and representation.
//!
//! All settings come from the environment:
//!
//! | variable | default |
//! |---|---|
//! | `RODSTOCK_BIND_ADDR` | `0.0.0.0:8080` |
//! | `RODSTOCK_APPROVAL_PASSPHRASE` | dev default (logged as a warning) |
//! | `RODSTOCK_SEED_PATH` | unset: start with an empty ledger |

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use rodstock_auth::ApprovalSecret;

pub const BIND_ADDR_VAR: &str = "RODSTOCK_BIND_ADDR";
pub const APPROVAL_PASSPHRASE_VAR: &str = "RODSTOCK_APPROVAL_PASSPHRASE";
pub const SEED_PATH_VAR: &str = "RODSTOCK_SEED_PATH";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_APPROVAL_PASSPHRASE: &str = "dev-approval";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidBindAddr { var: &'static str, value: String },

    #[error("{0} is set but empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub approval_secret: ApprovalSecret,
    pub seed_path: Option<PathBuf>,
}

impl AppConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr {
                var: BIND_ADDR_VAR,
                value: raw_addr.clone(),
            })?;

        let approval_secret = match lookup(APPROVAL_PASSPHRASE_VAR) {
            Some(v) if v.is_empty() => return Err(ConfigError::Empty(APPROVAL_PASSPHRASE_VAR)),
            Some(v) => ApprovalSecret::new(v),
            None => {
                tracing::warn!(
                    "{APPROVAL_PASSPHRASE_VAR} not set; using insecure dev default"
                );
                ApprovalSecret::new(DEV_APPROVAL_PASSPHRASE)
            }
        };

        let seed_path = lookup(SEED_PATH_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind_addr,
            approval_secret,
            seed_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8080");
        assert!(cfg.approval_secret.verify("dev-approval"));
        assert!(cfg.seed_path.is_none());
    }

    #[test]
    fn values_are_read_from_lookup() {
        let cfg = AppConfig::from_lookup(lookup(&[
            (BIND_ADDR_VAR, "127.0.0.1:9000"),
            (APPROVAL_PASSPHRASE_VAR, "Aço-2024"),
            (SEED_PATH_VAR, "/var/lib/rodstock/seed.json"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert!(cfg.approval_secret.verify("Aço-2024"));
        assert_eq!(
            cfg.seed_path,
            Some(PathBuf::from("/var/lib/rodstock/seed.json"))
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(BIND_ADDR_VAR, "nope")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));

        let err = AppConfig::from_lookup(lookup(&[(APPROVAL_PASSPHRASE_VAR, "")])).unwrap_err();
        assert_eq!(err, ConfigError::Empty(APPROVAL_PASSPHRASE_VAR));
    }
}
