use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::batch::ExecutionMode;
use crate::error::ErrorCode;
use crate::id::{Base64Generator, PADDED_WIDTH};
use crate::pack::PackConfig;

/// A config file that exists but cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("invalid settings in {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl ConfigError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { .. } => ErrorCode::ConfigParseError,
            Self::Invalid { .. } => ErrorCode::InvalidConfig,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub pack: PackConfig,
    #[serde(default)]
    pub ids: IdConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub execution: ExecutionMode,
}

impl ProjectConfig {
    /// Reject settings the pack format or id generator cannot honour.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if let Err(problem) = self.pack.validate() {
            bail!(problem);
        }
        if self.ids.width == 0 || self.ids.width > PADDED_WIDTH {
            bail!(
                "ids.width must be between 1 and {PADDED_WIDTH}, got {}",
                self.ids.width
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdConfig {
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_id_width")]
    pub width: usize,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            width: default_id_width(),
        }
    }
}

impl IdConfig {
    /// Build a generator for this prefix and width.
    ///
    /// # Errors
    ///
    /// Returns an error if the width is out of range.
    pub fn generator(&self) -> Result<Base64Generator> {
        Base64Generator::new(self.prefix.clone(), self.width).context("Invalid [ids] section")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Treat dependency cycles between distinct types as errors.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".aggregraph/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config =
        toml::from_str::<ProjectConfig>(&content).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    config.validate().map_err(|e| ConfigError::Invalid {
        path: path.clone(),
        reason: format!("{e:#}"),
    })?;
    Ok(config)
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("aggregraph/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<UserConfig>(&content).map_err(|e| ConfigError::Parse {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    Ok(config)
}

pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format)?;

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> Result<String> {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return Ok("json".to_string());
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if std::io::stdout().is_terminal() {
        Ok("pretty".to_string())
    } else {
        Ok("text".to_string())
    }
}

const fn default_id_width() -> usize {
    PADDED_WIDTH
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_project_config(root: &Path, content: &str) {
        let dir = root.join(".aggregraph");
        std::fs::create_dir_all(&dir).expect("create config dir");
        std::fs::write(dir.join("config.toml"), content).expect("write config");
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.pack.base_id, 10_000);
        assert_eq!(cfg.pack.id_key, "@id");
        assert_eq!(cfg.pack.ref_prefix, "&");
        assert_eq!(cfg.ids.width, 16);
        assert!(cfg.ids.prefix.is_empty());
        assert!(!cfg.graph.strict);
        assert_eq!(cfg.execution, ExecutionMode::Sequential);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        write_project_config(
            root.path(),
            r#"
[pack]
base_id = 1

[ids]
prefix = "ord-"
width = 6

[graph]
strict = true

[execution]
mode = "parallel"
workers = 4
"#,
        );

        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.pack.base_id, 1);
        assert_eq!(cfg.pack.id_key, "@id");
        assert_eq!(cfg.ids.prefix, "ord-");
        assert_eq!(cfg.ids.width, 6);
        assert!(cfg.graph.strict);
        assert_eq!(cfg.execution, ExecutionMode::Parallel { workers: 4 });

        let generator = cfg.ids.generator().expect("generator");
        assert_eq!(generator.next_id().expect("id"), "ord-------");
    }

    #[test]
    fn malformed_project_config_names_the_file() {
        let root = tempfile::tempdir().expect("temp dir");
        write_project_config(root.path(), "[pack\nbase_id = ");
        let err = load_project_config(root.path()).expect_err("parse should fail");
        assert!(err.to_string().contains("config.toml"));
        let typed = err.downcast_ref::<ConfigError>().expect("typed config error");
        assert_eq!(typed.code(), ErrorCode::ConfigParseError);
    }

    #[test]
    fn ambiguous_wire_keys_are_rejected() {
        let root = tempfile::tempdir().expect("temp dir");
        write_project_config(root.path(), "[pack]\nid_key = \"&id\"\n");
        let err = load_project_config(root.path()).expect_err("validation should fail");
        assert!(format!("{err:#}").contains("ref_prefix"));
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn out_of_range_width_is_rejected() {
        let cfg = ProjectConfig {
            ids: IdConfig {
                prefix: String::new(),
                width: 17,
            },
            ..ProjectConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output = resolve_output(true, Some("pretty".to_string()), Some("text".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "json");
    }

    #[test]
    fn env_beats_user_config() {
        let output = resolve_output(false, Some("json".to_string()), Some("text".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "text");
    }

    #[test]
    fn legacy_aliases_are_normalized() {
        let pretty = resolve_output(false, Some("table".to_string()), Some("human".to_string()))
            .expect("resolve should succeed");
        assert_eq!(pretty, "pretty");

        let text = resolve_output(false, Some("human".to_string()), Some("table".to_string()))
            .expect("resolve should succeed");
        assert_eq!(text, "text");
    }

    #[test]
    fn user_config_parses_output() {
        let cfg: UserConfig = toml::from_str("output = \"json\"\n").expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
    }
}
