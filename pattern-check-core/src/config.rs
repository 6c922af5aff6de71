use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ConfigError, CoreError, UnknownAbsentFieldPolicy};

/// Default prefix for every environment variable read by [`PluginConfig`].
pub const DEFAULT_ENV_PREFIX: &str = "PATTERN_CHECK_";

const DEFAULT_PLATFORMS: &[&str] = &["alertflow", "exflow"];

/// How a path that resolves to nothing takes part in comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AbsentFieldPolicy {
    /// A missing field compares as the empty string.
    #[default]
    TreatAsEmpty,
    /// A missing field fails `equals`/`contains` and satisfies their negations.
    NeverMatch,
}

impl FromStr for AbsentFieldPolicy {
    type Err = UnknownAbsentFieldPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "empty" | "treat_as_empty" => Ok(AbsentFieldPolicy::TreatAsEmpty),
            "never_match" | "never" => Ok(AbsentFieldPolicy::NeverMatch),
            _ => Err(UnknownAbsentFieldPolicy(value.to_string())),
        }
    }
}

/// Runtime configuration for the plugin and its host adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginConfig {
    /// Base URL of the backend that stores execution steps.
    pub backend_url: Option<String>,
    pub api_key: Option<String>,
    /// Platform identifiers this plugin accepts requests for.
    pub platforms: Vec<String>,
    pub absent_fields: AbsentFieldPolicy,
    pub http_bind: String,
    pub log_level: String,
    /// Prefix the values were read with; error messages name variables with it.
    pub env_prefix: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            api_key: None,
            platforms: DEFAULT_PLATFORMS.iter().map(|p| p.to_string()).collect(),
            absent_fields: AbsentFieldPolicy::default(),
            http_bind: "0.0.0.0:8095".to_string(),
            log_level: "info".to_string(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }
}

impl PluginConfig {
    /// Loads configuration from the process environment using the default prefix.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `PATTERN_CHECK_`).
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded environment file");
        }
        Self::from_lookup(prefix, |key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);
        let defaults = Self::default();

        let backend_url = lookup(&key("BACKEND_URL")).filter(|raw| !raw.trim().is_empty());
        let api_key = lookup(&key("API_KEY")).filter(|raw| !raw.trim().is_empty());

        let platforms_key = key("PLATFORMS");
        let platforms = match lookup(&platforms_key) {
            Some(raw) => {
                let platforms: Vec<String> = raw
                    .split(',')
                    .map(|item| item.trim().to_ascii_lowercase())
                    .filter(|item| !item.is_empty())
                    .collect();
                if platforms.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: platforms_key,
                        value: raw,
                        expected: "a comma separated list of platforms",
                    });
                }
                platforms
            }
            None => defaults.platforms,
        };

        let absent_key = key("ABSENT_FIELDS");
        let absent_fields = match lookup(&absent_key) {
            Some(raw) => raw
                .parse::<AbsentFieldPolicy>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: absent_key,
                    value: raw.clone(),
                    expected: "`empty` or `never_match`",
                })?,
            None => defaults.absent_fields,
        };

        let http_bind = lookup(&key("HTTP_BIND")).unwrap_or(defaults.http_bind);
        let log_level = lookup(&key("LOG_LEVEL")).unwrap_or(defaults.log_level);

        Ok(Self {
            backend_url,
            api_key,
            platforms,
            absent_fields,
            http_bind,
            log_level,
            env_prefix: prefix.to_string(),
        })
    }

    /// Returns the backend URL or an error naming the variable that must be set.
    pub fn require_backend_url(&self) -> Result<&str, ConfigError> {
        self.backend_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar(format!("{}BACKEND_URL", self.env_prefix)))
    }

    /// Whether the given platform identifier is accepted.
    pub fn supports_platform(&self, platform: &str) -> bool {
        self.platforms
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(platform))
    }
}

/// Helper that loads config and converts to the canonical core error type.
pub fn load_plugin_config() -> Result<PluginConfig, CoreError> {
    Ok(PluginConfig::from_env()?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_defaults_when_nothing_is_set() {
        let cfg = PluginConfig::from_lookup("PC_", lookup(&[])).expect("config should load");
        assert_eq!(
            cfg,
            PluginConfig {
                env_prefix: "PC_".into(),
                ..PluginConfig::default()
            }
        );
        assert!(cfg.supports_platform("alertflow"));
        assert!(cfg.supports_platform("ExFlow"));
        assert!(cfg.require_backend_url().is_err());
    }

    #[test]
    fn missing_backend_url_names_the_configured_prefix() {
        let cfg = PluginConfig::from_lookup("PC_", lookup(&[])).expect("config should load");
        assert_eq!(
            cfg.require_backend_url(),
            Err(ConfigError::MissingEnvVar("PC_BACKEND_URL".into()))
        );
        assert_eq!(
            PluginConfig::default().require_backend_url(),
            Err(ConfigError::MissingEnvVar("PATTERN_CHECK_BACKEND_URL".into()))
        );
    }

    #[test]
    fn parses_absence_policies_case_insensitively() {
        assert_eq!(" Never_Match ".parse(), Ok(AbsentFieldPolicy::NeverMatch));
        assert_eq!("empty".parse(), Ok(AbsentFieldPolicy::TreatAsEmpty));
        assert_eq!(
            "maybe".parse::<AbsentFieldPolicy>(),
            Err(UnknownAbsentFieldPolicy("maybe".into()))
        );
    }

    #[test]
    fn reads_prefixed_values() {
        let cfg = PluginConfig::from_lookup(
            "PC_",
            lookup(&[
                ("PC_BACKEND_URL", "http://backend:8080"),
                ("PC_API_KEY", "secret"),
                ("PC_PLATFORMS", " AlertFlow , "),
                ("PC_ABSENT_FIELDS", "never_match"),
                ("PC_HTTP_BIND", "127.0.0.1:9000"),
            ]),
        )
        .expect("config should load");

        assert_eq!(cfg.require_backend_url(), Ok("http://backend:8080"));
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.platforms, vec!["alertflow".to_string()]);
        assert!(!cfg.supports_platform("exflow"));
        assert_eq!(cfg.absent_fields, AbsentFieldPolicy::NeverMatch);
        assert_eq!(cfg.http_bind, "127.0.0.1:9000");
    }

    #[test]
    fn rejects_unknown_absence_policy() {
        let err = PluginConfig::from_lookup("PC_", lookup(&[("PC_ABSENT_FIELDS", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PC_ABSENT_FIELDS"));
    }

    #[test]
    fn rejects_empty_platform_list() {
        let err =
            PluginConfig::from_lookup("PC_", lookup(&[("PC_PLATFORMS", " , ")])).unwrap_err();
        assert!(err.to_string().contains("PC_PLATFORMS"));
    }
}
