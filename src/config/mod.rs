//! Project configuration management for `awe.toml`.
//!
//! # Sections
//!
//! | Section            | Purpose                                        |
//! |--------------------|------------------------------------------------|
//! | `[tools]`          | Compiler runtime, command overrides, timeout   |
//! | `[groups.<name>]`  | One asset group: source, destination, options  |
//!
//! # Example
//!
//! ```toml
//! [tools]
//! timeout = 300
//!
//! [groups.theme]
//! src = "assets/src"
//! dest = "assets/build"
//! bower = "bower_components"
//! sourcemaps = true
//! ```

mod build;
pub mod defaults;
mod error;
mod group;
mod tools;

pub use build::{BowerLink, BuildConfig};
pub use error::ConfigError;
pub use group::GroupConfig;
pub use tools::{Toolchain, ToolsConfig};

#[cfg(test)]
pub use build::test_config;

use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Default config filename
pub const CONFIG_FILE: &str = "awe.toml";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing awe.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project root directory (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Compiler settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Asset groups by name, built in name order
    #[serde(default)]
    pub groups: BTreeMap<String, GroupConfig>,
}

impl ProjectConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ProjectConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Load `<root>/<config>` and remember the root.
    pub fn load(root: &Path, config: &Path) -> Result<Self, ConfigError> {
        let mut loaded = Self::from_path(&root.join(config))?;
        loaded.root = root.to_path_buf();
        Ok(loaded)
    }

    /// Starter configuration written by `awe init`.
    pub fn template() -> Self {
        Self {
            groups: BTreeMap::from([("main".to_owned(), GroupConfig::default())]),
            ..Default::default()
        }
    }

    /// Validate settings that cannot be expressed in the types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.groups.is_empty() {
            return Err(ConfigError::Validation(
                "[groups] must define at least one asset group".into(),
            ));
        }

        if self.tools.timeout == 0 {
            return Err(ConfigError::Validation(
                "[tools.timeout] must be greater than 0".into(),
            ));
        }

        for (field, command) in [
            ("coffee", &self.tools.coffee),
            ("compass", &self.tools.compass),
        ] {
            if let Some(command) = command
                && command.first().is_none_or(String::is_empty)
            {
                return Err(ConfigError::Validation(format!(
                    "[tools.{field}] must have at least one element"
                )));
            }
        }

        for (name, group) in &self.groups {
            Self::validate_group(name, group)?;
        }

        Ok(())
    }

    fn validate_group(name: &str, group: &GroupConfig) -> Result<(), ConfigError> {
        let src = trimmed(&group.src);
        let dest = trimmed(&group.dest);

        for (field, path) in [("src", &src), ("dest", &dest)] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "[groups.{name}.{field}] must not be empty"
                )));
            }
        }

        // The destination is emptied before every build
        if src.starts_with(&dest) || dest.starts_with(&src) {
            return Err(ConfigError::Validation(format!(
                "[groups.{name}] src and dest must not contain each other"
            )));
        }

        Ok(())
    }

    /// Groups to build, in name order. An empty `names` selects all.
    pub fn select(&self, names: &[String]) -> Result<Vec<(&str, &GroupConfig)>, ConfigError> {
        if names.is_empty() {
            return Ok(self
                .groups
                .iter()
                .map(|(name, group)| (name.as_str(), group))
                .collect());
        }

        let mut selected = names
            .iter()
            .map(|name| {
                self.groups
                    .get_key_value(name)
                    .map(|(name, group)| (name.as_str(), group))
                    .ok_or_else(|| ConfigError::UnknownGroup(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        selected.sort_by_key(|(name, _)| *name);
        selected.dedup_by_key(|(name, _)| *name);
        Ok(selected)
    }

    /// Compiler commands with defaults resolved against the root.
    pub fn toolchain(&self) -> Toolchain {
        Toolchain::resolve(&self.tools, &self.root)
    }
}

fn trimmed(path: &Path) -> PathBuf {
    PathBuf::from(crate::utils::path::trim_separators(&path.to_string_lossy()))
}

// ============================================================================
// Tests
// ============================================================================
