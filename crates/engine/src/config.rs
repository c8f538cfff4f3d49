//! Engine configuration.
//!
//! Read from a TOML file; every field has a default so an empty or missing
//! file yields a local-only session with inline unlocks.
//!
//! ```toml
//! unlock_delay_ms = 0
//! impact_seed = 42
//!
//! [persistence]
//! mode = "remote"
//! user_id = "u-123"
//! student_number = "s1234567"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding `unlock_delay_ms`.
pub const UNLOCK_DELAY_ENV: &str = "ECOQUEST_UNLOCK_DELAY_MS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// Everything lives in local key-value storage.
    #[default]
    Local,
    /// Numeric account totals live in a remote profile.
    Remote,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub mode: PersistenceMode,
    /// Signed-in user; required when `mode = "remote"`.
    pub user_id: Option<String>,
    /// Used when creating a missing remote profile.
    pub student_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay before the next day's task unlocks. 0 applies it inline.
    pub unlock_delay_ms: u64,
    /// Seed for the water-bonus RNG; entropy when absent.
    pub impact_seed: Option<u64>,
    pub persistence: PersistenceConfig,
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path`, falling back to defaults when it does not exist, then
    /// apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        config.apply_env(std::env::var(UNLOCK_DELAY_ENV).ok().as_deref())?;
        Ok(config)
    }

    /// Apply the value of [`UNLOCK_DELAY_ENV`], if set.
    pub fn apply_env(&mut self, unlock_delay: Option<&str>) -> Result<(), ConfigError> {
        if let Some(raw) = unlock_delay {
            self.unlock_delay_ms = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{UNLOCK_DELAY_ENV} must be an integer, got '{raw}'"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.persistence.mode == PersistenceMode::Remote
            && !matches!(self.persistence.user_id.as_deref(), Some(id) if !id.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "persistence.user_id is required when mode is \"remote\"".to_string(),
            ));
        }
        Ok(())
    }

    pub fn unlock_delay(&self) -> Duration {
        Duration::from_millis(self.unlock_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let c = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(c, EngineConfig::default());
        assert_eq!(c.unlock_delay(), Duration::ZERO);
        assert_eq!(c.persistence.mode, PersistenceMode::Local);
    }

    #[test]
    fn parses_full_document() {
        let c = EngineConfig::from_toml_str(
            r#"
            unlock_delay_ms = 250
            impact_seed = 42

            [persistence]
            mode = "remote"
            user_id = "u-1"
            student_number = "s1"
            "#,
        )
        .unwrap();
        assert_eq!(c.unlock_delay(), Duration::from_millis(250));
        assert_eq!(c.impact_seed, Some(42));
        assert_eq!(c.persistence.mode, PersistenceMode::Remote);
        assert_eq!(c.persistence.user_id.as_deref(), Some("u-1"));
    }

    #[test]
    fn remote_without_user_is_invalid() {
        let err = EngineConfig::from_toml_str("[persistence]\nmode = \"remote\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_toml_is_parse_error() {
        assert!(matches!(
            EngineConfig::from_toml_str("unlock_delay_ms = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_override() {
        let mut c = EngineConfig::default();
        c.apply_env(Some("1500")).unwrap();
        assert_eq!(c.unlock_delay_ms, 1500);
        c.apply_env(None).unwrap();
        assert_eq!(c.unlock_delay_ms, 1500);
        assert!(c.apply_env(Some("later")).is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let c = EngineConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(c.impact_seed, None);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecoquest.toml");
        std::fs::write(&path, "impact_seed = 7\n").unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap().impact_seed, Some(7));
    }
}
