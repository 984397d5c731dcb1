// SPDX-License-Identifier: MIT OR Apache-2.0

//! gnmi-cli configuration file parser.
//!
//! The config file (typically `~/.gnmi/config`) holds connection
//! information for multiple targets, keyed by context name.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GnmiError, Result};

/// Environment variable naming the config file path.
pub const ENV_GNMI_CONFIG: &str = "GNMI_CONFIG";

/// Environment variable overriding the active context.
pub const ENV_GNMI_CONTEXT: &str = "GNMI_CONTEXT";

/// The entire configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GnmiConfig {
    /// The currently active context name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Map of context names to their configurations.
    pub contexts: HashMap<String, GnmiContext>,
}

/// Connection details for a single target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct GnmiContext {
    /// Target address, `host` or `host:port`.
    pub target: String,

    /// Network OS variant name, as accepted by
    /// [`DeviceOs`](crate::DeviceOs)'s `FromStr`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// Username sent as call metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Path to PEM root certificates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_certificates: Option<PathBuf>,

    /// Path to the PEM client private key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<PathBuf>,

    /// Path to the PEM client certificate chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_chain: Option<PathBuf>,

    /// Explicit TLS name override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_target_override: Option<String>,

    /// Derive the TLS name override from the root certificate.
    #[serde(default)]
    pub auto_ssl_target_override: bool,

    /// Use a cleartext channel.
    #[serde(default)]
    pub insecure: bool,
}

impl GnmiConfig {
    /// Load configuration from the default location (`~/.gnmi/config`).
    #[allow(clippy::result_large_err)]
    pub fn load_default() -> Result<Self> {
        Self::load_from_path(Self::default_path()?)
    }

    /// Load configuration honoring `GNMI_CONFIG` and `GNMI_CONTEXT`.
    #[allow(clippy::result_large_err)]
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load_from_path(Self::config_path()?)?;
        if let Ok(context) = std::env::var(ENV_GNMI_CONTEXT) {
            config.context = Some(context);
        }
        Ok(config)
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed YAML.
    #[allow(clippy::result_large_err)]
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            GnmiError::Config(format!(
                "unable to read config file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| GnmiError::Config(format!("unable to parse config YAML: {e}")))
    }

    /// The default config file path (`~/.gnmi/config`).
    #[allow(clippy::result_large_err)]
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| GnmiError::Config("could not determine home directory".to_string()))?;
        Ok(home.join(".gnmi").join("config"))
    }

    /// The config file path, respecting `GNMI_CONFIG`.
    #[allow(clippy::result_large_err)]
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var(ENV_GNMI_CONFIG) {
            Ok(PathBuf::from(env_path))
        } else {
            Self::default_path()
        }
    }

    /// The currently active context, if set and present.
    pub fn active_context(&self) -> Option<&GnmiContext> {
        self.context
            .as_ref()
            .and_then(|name| self.contexts.get(name))
    }

    /// Look up a context by name.
    pub fn get_context(&self, name: &str) -> Option<&GnmiContext> {
        self.contexts.get(name)
    }

    /// List all available context names.
    pub fn context_names(&self) -> Vec<&String> {
        self.contexts.keys().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
context: lab-xr
contexts:
  lab-xr:
    target: 192.0.2.1:57400
    os: IOS XR
    username: admin
    root-certificates: /etc/gnmi/lab-root.pem
    auto-ssl-target-override: true
  lab-nx:
    target: 192.0.2.2
    os: NX-OS
    insecure: true
"#;

    #[test]
    fn test_parse_basic_config() {
        let config = GnmiConfig::from_yaml(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.context, Some("lab-xr".to_string()));
        assert_eq!(config.contexts.len(), 2);
    }

    #[test]
    fn test_active_context() {
        let config = GnmiConfig::from_yaml(SAMPLE_CONFIG).unwrap();
        let active = config.active_context().unwrap();
        assert_eq!(active.target, "192.0.2.1:57400");
        assert_eq!(active.os.as_deref(), Some("IOS XR"));
        assert_eq!(active.username.as_deref(), Some("admin"));
        assert_eq!(
            active.root_certificates,
            Some(PathBuf::from("/etc/gnmi/lab-root.pem"))
        );
        assert!(active.auto_ssl_target_override);
        assert!(!active.insecure);
    }

    #[test]
    fn test_get_context() {
        let config = GnmiConfig::from_yaml(SAMPLE_CONFIG).unwrap();
        let ctx = config.get_context("lab-nx").unwrap();
        assert_eq!(ctx.target, "192.0.2.2");
        assert!(ctx.insecure);
        assert!(ctx.root_certificates.is_none());
    }

    #[test]
    fn test_context_names() {
        let config = GnmiConfig::from_yaml(SAMPLE_CONFIG).unwrap();
        let mut names = config.context_names();
        names.sort();
        assert_eq!(names, vec!["lab-nx", "lab-xr"]);
    }

    #[test]
    fn test_missing_context() {
        let config = GnmiConfig::from_yaml(SAMPLE_CONFIG).unwrap();
        assert!(config.get_context("nonexistent").is_none());
    }

    #[test]
    fn test_minimal_config() {
        let minimal = r#"
contexts:
  minimal:
    target: 127.0.0.1:9339
"#;
        let config = GnmiConfig::from_yaml(minimal).unwrap();
        assert_eq!(config.context, None);
        assert!(config.active_context().is_none());
        let ctx = config.get_context("minimal").unwrap();
        assert_eq!(ctx.target, "127.0.0.1:9339");
        assert!(!ctx.insecure);
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, SAMPLE_CONFIG).unwrap();

        let config = GnmiConfig::load_from_path(&path).unwrap();
        assert_eq!(config.context, Some("lab-xr".to_string()));
    }

    #[test]
    fn test_load_missing_file_rejected() {
        assert!(matches!(
            GnmiConfig::load_from_path("/nonexistent/gnmi_config_12345"),
            Err(GnmiError::Config(_))
        ));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        assert!(matches!(
            GnmiConfig::from_yaml("contexts: ["),
            Err(GnmiError::Config(_))
        ));
    }
}
