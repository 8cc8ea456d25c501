//! dsconsole configuration file handling
//!
//! Settings live in `dsconsole.toml`. Every section is optional; a missing
//! file in the working directory means built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use dsconsole_cn::SelectTuning;
use dsconsole_core::TimerHandle;
use dsconsole_shell::{ProcessRunner, ServerSession, ToolPaths};

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "dsconsole.toml";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DsConsoleConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub typeahead: TypeaheadConfig,
}

/// Which instance the management commands talk to
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server_id: Option<String>,
}

/// Admin tool locations and privilege escalation
#[derive(Debug, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_dsconf")]
    pub dsconf: String,
    #[serde(default = "default_dsctl")]
    pub dsctl: String,
    #[serde(default = "default_ldapsearch")]
    pub ldapsearch: String,
    /// Prefix for commands that need root, e.g. `["sudo", "-n"]`
    #[serde(default = "default_elevate")]
    pub elevate: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            dsconf: default_dsconf(),
            dsctl: default_dsctl(),
            ldapsearch: default_ldapsearch(),
            elevate: default_elevate(),
        }
    }
}

fn default_dsconf() -> String {
    "dsconf".to_string()
}

fn default_dsctl() -> String {
    "dsctl".to_string()
}

fn default_ldapsearch() -> String {
    "ldapsearch".to_string()
}

fn default_elevate() -> Vec<String> {
    vec!["sudo".to_string(), "-n".to_string()]
}

/// Typeahead timing and click-open behavior
#[derive(Debug, Deserialize, Serialize)]
pub struct TypeaheadConfig {
    #[serde(default = "default_guard_window_ms")]
    pub guard_window_ms: u64,
    #[serde(default = "default_true")]
    pub open_on_click: bool,
    #[serde(default)]
    pub max_options_for_click_open: Option<usize>,
}

impl Default for TypeaheadConfig {
    fn default() -> Self {
        Self {
            guard_window_ms: default_guard_window_ms(),
            open_on_click: true,
            max_options_for_click_open: None,
        }
    }
}

fn default_guard_window_ms() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl DsConsoleConfig {
    /// Load an explicit file, or `dsconsole.toml` in the working directory if present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file {} does not exist", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: DsConsoleConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Typeahead knobs, optionally bound to a timer scheduler
    pub fn tuning(&self, scheduler: Option<TimerHandle>) -> SelectTuning {
        SelectTuning {
            guard_window: Duration::from_millis(self.typeahead.guard_window_ms),
            open_on_click: self.typeahead.open_on_click,
            max_options_for_click_open: self.typeahead.max_options_for_click_open,
            scheduler,
        }
    }

    pub fn tool_paths(&self) -> ToolPaths {
        ToolPaths {
            dsconf: self.tools.dsconf.clone(),
            dsctl: self.tools.dsctl.clone(),
            ldapsearch: self.tools.ldapsearch.clone(),
        }
    }

    pub fn runner(&self) -> ProcessRunner {
        ProcessRunner::with_elevate(self.tools.elevate.clone())
    }

    /// Session for `server_id`, falling back to the configured instance
    pub fn session(&self, server_id: Option<&str>) -> Result<ServerSession> {
        let Some(id) = server_id.or(self.server.server_id.as_deref()) else {
            anyhow::bail!(
                "No server instance given. Pass --server or set server.server_id in {}",
                DEFAULT_CONFIG_FILE
            );
        };
        let session = ServerSession::new(id)?.with_tools(self.tool_paths());
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: DsConsoleConfig = toml::from_str("").unwrap();
        assert_eq!(config.tools.dsconf, "dsconf");
        assert_eq!(config.tools.elevate, ["sudo", "-n"]);
        assert_eq!(config.typeahead.guard_window_ms, 10);
        assert!(config.typeahead.open_on_click);
        assert!(config.server.server_id.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config: DsConsoleConfig = toml::from_str(
            r#"
            [server]
            server_id = "localhost"

            [tools]
            elevate = []

            [typeahead]
            guard_window_ms = 25
            max_options_for_click_open = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.tools.dsctl, "dsctl");
        assert_eq!(config.tools.ldapsearch, "ldapsearch");
        assert!(config.tools.elevate.is_empty());

        let tuning = config.tuning(None);
        assert_eq!(tuning.guard_window, Duration::from_millis(25));
        assert_eq!(tuning.max_options_for_click_open, Some(50));
        assert!(tuning.scheduler.is_none());

        let session = config.session(None).unwrap();
        assert_eq!(session.server_id(), "localhost");
    }

    #[test]
    fn test_session_override_and_missing() {
        let config = DsConsoleConfig::default();
        assert!(config.session(None).is_err());
        assert_eq!(config.session(Some("slapd-ds2")).unwrap().server_id(), "ds2");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = DsConsoleConfig::load(Some(Path::new("/nonexistent/dsconsole.toml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_toml_round_trip_keeps_defaults() {
        let text = DsConsoleConfig::default().to_toml().unwrap();
        let back: DsConsoleConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.typeahead.guard_window_ms, 10);
    }
}
