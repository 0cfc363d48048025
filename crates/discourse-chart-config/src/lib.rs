use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Template '{name}' in {config_path} has no columns")]
    EmptyTemplate { config_path: PathBuf, name: String },
}

/// One node of a column template outline.
///
/// A node without children is a chart column; a node with children is a
/// group whose leaves become columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ColumnConfig>,
}

impl ColumnConfig {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn group(label: impl Into<String>, children: Vec<ColumnConfig>) -> Self {
        Self {
            label: label.into(),
            children,
        }
    }

    /// Number of chart columns below (or at) this node
    pub fn leaf_count(&self) -> usize {
        if self.children.is_empty() {
            1
        } else {
            self.children.iter().map(ColumnConfig::leaf_count).sum()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub name: String,
    pub columns: Vec<ColumnConfig>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            columns: vec![
                ColumnConfig::group(
                    "Prenuclear",
                    vec![ColumnConfig::leaf("Outer"), ColumnConfig::leaf("Inner")],
                ),
                ColumnConfig::group(
                    "Nucleus",
                    vec![
                        ColumnConfig::leaf("Subject"),
                        ColumnConfig::leaf("Verb"),
                        ColumnConfig::group(
                            "Object/Complement",
                            vec![ColumnConfig::leaf("Object"), ColumnConfig::leaf("Complement")],
                        ),
                    ],
                ),
                ColumnConfig::group(
                    "Postnuclear",
                    vec![ColumnConfig::leaf("Inner"), ColumnConfig::leaf("Outer")],
                ),
            ],
        }
    }
}

fn default_uncharted_batch_size() -> usize {
    20
}

fn default_max_undo_depth() -> usize {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// How many uncharted words the ribbon offers at once
    #[serde(default = "default_uncharted_batch_size")]
    pub uncharted_batch_size: usize,
    #[serde(default = "default_max_undo_depth")]
    pub max_undo_depth: usize,
    #[serde(default)]
    pub template: TemplateConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            uncharted_batch_size: default_uncharted_batch_size(),
            max_undo_depth: default_max_undo_depth(),
            template: TemplateConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        if config.template.columns.is_empty() {
            return Err(ConfigError::EmptyTemplate {
                config_path: config_path.to_path_buf(),
                name: config.template.name,
            });
        }

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load the user's config, falling back to the built-in defaults when
    /// no config file exists yet.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/discourse-chart");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }
}
