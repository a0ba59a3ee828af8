use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RelayError, RelayResult};
use crate::models::ViewerRole;

/// Top-level configuration for an application embedding relay-core.
///
/// `viewer_role` is deliberately required with no default: which roster slot
/// is "self" is a per-application contract (the HR dashboard runs as
/// `primary`, the employee app as `secondary`), and silently defaulting it
/// would mislabel every message in a misconfigured deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub viewer_role: ViewerRole,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Legacy classification constants, injected rather than hard-coded so tests
/// can exercise the roster-based and legacy paths independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Role-marker substring historically embedded in staff display names.
    #[serde(default = "default_primary_marker")]
    pub primary_marker: String,

    /// Well-known staff-side sender identifier predating the roster
    /// convention.
    #[serde(default = "default_primary_sender_id")]
    pub primary_sender_id: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            primary_marker: default_primary_marker(),
            primary_sender_id: default_primary_sender_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Max chars of a counterpart name in a last-message prefix.
    #[serde(default = "default_prefix_name_len")]
    pub prefix_name_len: usize,

    /// Max chars of the stored last-message preview.
    #[serde(default = "default_preview_len")]
    pub preview_len: usize,

    /// Chars of the conversation id used as a last-resort display name.
    #[serde(default = "default_id_placeholder_len")]
    pub id_placeholder_len: usize,

    /// Label shown when no name can be resolved at all.
    #[serde(default = "default_placeholder_title")]
    pub placeholder_title: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            prefix_name_len: default_prefix_name_len(),
            preview_len: default_preview_len(),
            id_placeholder_len: default_id_placeholder_len(),
            placeholder_title: default_placeholder_title(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

fn default_primary_marker() -> String {
    "(HR)".to_string()
}

fn default_primary_sender_id() -> String {
    "hr_admin".to_string()
}

fn default_prefix_name_len() -> usize {
    15
}

fn default_preview_len() -> usize {
    100
}

fn default_id_placeholder_len() -> usize {
    8
}

fn default_placeholder_title() -> String {
    "Conversation".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Intermediate shape so a missing `viewer_role` produces a targeted error
/// instead of a generic deserialization failure.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    viewer_role: Option<String>,

    #[serde(default)]
    resolver: ResolverConfig,

    #[serde(default)]
    display: DisplayConfig,

    #[serde(default)]
    logging: LoggingConfig,
}

impl RelayConfig {
    /// Build a config programmatically; mainly for tests and embedding.
    pub fn new(viewer_role: ViewerRole) -> Self {
        Self {
            viewer_role,
            resolver: ResolverConfig::default(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from an optional file plus `RELAY_`-prefixed
    /// environment variables (e.g. `RELAY_VIEWER_ROLE=primary`,
    /// `RELAY_RESOLVER__PRIMARY_MARKER="(HR)"`). Environment values override
    /// file values.
    pub fn load(path: Option<&Path>) -> RelayResult<Self> {
        let mut builder = ConfigBuilder::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix("RELAY").separator("__"));

        let raw: RawConfig = builder.build()?.try_deserialize()?;

        let viewer_role = raw
            .viewer_role
            .ok_or_else(|| RelayError::MissingRequiredConfig("viewer_role".to_string()))?
            .parse::<ViewerRole>()
            .map_err(|message| RelayError::InvalidConfigValue {
                key: "viewer_role".to_string(),
                message,
            })?;

        Ok(Self {
            viewer_role,
            resolver: raw.resolver,
            display: raw.display,
            logging: raw.logging,
        })
    }
}

/// Initialize global tracing output from the logging config. Safe to call
/// more than once; later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    if config.json_format {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::new(ViewerRole::Primary);
        assert_eq!(config.resolver.primary_marker, "(HR)");
        assert_eq!(config.resolver.primary_sender_id, "hr_admin");
        assert_eq!(config.display.prefix_name_len, 15);
        assert_eq!(config.display.preview_len, 100);
        assert_eq!(config.display.id_placeholder_len, 8);
        assert_eq!(config.display.placeholder_title, "Conversation");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(
            &path,
            r#"
viewer_role = "secondary"

[resolver]
primary_marker = "(Staff)"

[display]
prefix_name_len = 20
"#,
        )
        .unwrap();

        let config = RelayConfig::load(Some(&path)).unwrap();
        assert_eq!(config.viewer_role, ViewerRole::Secondary);
        assert_eq!(config.resolver.primary_marker, "(Staff)");
        assert_eq!(config.resolver.primary_sender_id, "hr_admin");
        assert_eq!(config.display.prefix_name_len, 20);
    }

    #[test]
    fn test_load_missing_viewer_role_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, "[resolver]\nprimary_marker = \"(HR)\"\n").unwrap();

        let err = RelayConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, RelayError::MissingRequiredConfig(_)));
    }

    #[test]
    fn test_load_invalid_viewer_role_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, "viewer_role = \"staff\"\n").unwrap();

        let err = RelayConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, RelayError::InvalidConfigValue { .. }));
    }
}
