//! Site and database configuration.
//!
//! Site details that end up in every uploaded record are read from an optional
//! JSON file:
//!
//! ```json
//! {
//!   "institution": "SFU",
//!   "pull_test_machine": "Dage Series 4000",
//!   "wire_bond_machine": "Delvotec G5",
//!   "thresholds": { "min_mean": 8.0 }
//! }
//! ```
//!
//! Database endpoints and credentials come from the environment (a `.env` file
//! is loaded first by the binary).

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::classify::Thresholds;
use crate::error::AuthError;

pub const DEFAULT_AUTH_URL: &str =
    "https://uuidentity.plus4u.net/uu-oidc-maing02/bb977a99f4cc4c37a2afce3fd599d0a7/oidc/grantToken";
pub const DEFAULT_API_URL: &str = "https://itkpd-test.unicorncollege.cz";
pub const DEFAULT_SCOPE: &str = "openid https://itkpd-test.unicorncollege.cz";

/// Fixed details of the test site and its equipment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub institution: String,
    pub pull_test_machine: String,
    pub wire_bond_machine: String,
    pub thresholds: Thresholds,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            institution: "SFU".to_string(),
            pull_test_machine: "Dage Series 4000".to_string(),
            wire_bond_machine: "Delvotec G5".to_string(),
            thresholds: Thresholds::default(),
        }
    }
}

impl SiteConfig {
    /// Loads the config from a JSON file at `path`. Missing keys keep their
    /// defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read site config '{path}'"))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("invalid site config '{path}'"))?;
        Ok(config)
    }

    /// Loads `path` if given, otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Where and how to reach the test database.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub auth_url: String,
    pub api_url: String,
    pub scope: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl DatabaseConfig {
    /// Reads `ITKDB_AUTH_URL`, `ITKDB_API_URL`, `ITKDB_SCOPE` and
    /// `ITKDB_TIMEOUT_SECS`, falling back to defaults for any that are unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout = match lookup("ITKDB_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.trim()
                    .parse()
                    .with_context(|| format!("ITKDB_TIMEOUT_SECS is not a number: '{secs}'"))?,
            ),
            None => defaults.timeout,
        };

        Ok(Self {
            auth_url: lookup("ITKDB_AUTH_URL").unwrap_or(defaults.auth_url),
            api_url: lookup("ITKDB_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            scope: lookup("ITKDB_SCOPE").unwrap_or(defaults.scope),
            timeout,
            connect_timeout: defaults.connect_timeout,
        })
    }
}

/// The two access codes the test database requires. Never printed.
#[derive(Clone)]
pub struct AccessCodes {
    pub code1: String,
    pub code2: String,
}

impl fmt::Debug for AccessCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessCodes(<redacted>)")
    }
}

impl AccessCodes {
    /// Uses the given codes, falling back to `ITKDB_ACCESS_CODE1` and
    /// `ITKDB_ACCESS_CODE2`.
    pub fn resolve(code1: Option<String>, code2: Option<String>) -> Result<Self, AuthError> {
        Self::resolve_with(code1, code2, |key| std::env::var(key).ok())
    }

    pub fn resolve_with<F>(
        code1: Option<String>,
        code2: Option<String>,
        lookup: F,
    ) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |given: Option<String>, key: &str| {
            given
                .or_else(|| lookup(key))
                .filter(|code| !code.is_empty())
        };

        let code1 = pick(code1, "ITKDB_ACCESS_CODE1").ok_or(AuthError::MissingAccessCode(1))?;
        let code2 = pick(code2, "ITKDB_ACCESS_CODE2").ok_or(AuthError::MissingAccessCode(2))?;
        Ok(Self { code1, code2 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env;
    use std::fs;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_site_config_partial_file_keeps_defaults() {
        let path = env::temp_dir().join("wire_pull_upload_site_config.json");
        fs::write(
            &path,
            r#"{ "institution": "UBC", "thresholds": { "min_mean": 9.0 } }"#,
        )
        .unwrap();

        let config = SiteConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.institution, "UBC");
        assert_eq!(config.pull_test_machine, "Dage Series 4000");
        assert_eq!(config.thresholds.min_mean, 9.0);
        assert_eq!(config.thresholds.max_std_dev, 1.5);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_site_config_missing_file() {
        assert!(SiteConfig::load("/nonexistent/wire_pull_site.json").is_err());
    }

    #[test]
    fn test_database_config_defaults() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, DatabaseConfig::default());
    }

    #[test]
    fn test_database_config_overrides() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[
            ("ITKDB_API_URL", "http://localhost:8080/"),
            ("ITKDB_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_database_config_bad_timeout() {
        let result = DatabaseConfig::from_lookup(lookup_from(&[("ITKDB_TIMEOUT_SECS", "soon")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_access_codes_prefer_arguments() {
        let codes = AccessCodes::resolve_with(
            Some("a".into()),
            None,
            lookup_from(&[("ITKDB_ACCESS_CODE1", "x"), ("ITKDB_ACCESS_CODE2", "b")]),
        )
        .unwrap();

        assert_eq!(codes.code1, "a");
        assert_eq!(codes.code2, "b");
    }

    #[test]
    fn test_access_codes_missing() {
        let err = AccessCodes::resolve_with(Some("a".into()), Some(String::new()), lookup_from(&[]))
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingAccessCode(2)));
    }

    #[test]
    fn test_access_codes_are_redacted() {
        let codes = AccessCodes {
            code1: "secret1".into(),
            code2: "secret2".into(),
        };
        assert!(!format!("{codes:?}").contains("secret"));
    }
}
