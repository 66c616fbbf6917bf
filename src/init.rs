//! Project initialization.
//!
//! Writes a starter `awe.toml` with one default asset group.

use crate::config::ProjectConfig;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Write the default configuration to `<root>/<config>`.
pub fn init_config(root: &Path, config: &Path) -> Result<()> {
    let path = root.join(config);
    if path.exists() {
        bail!(
            "Config file `{}` already exists. Remove it manually or init in a different path.",
            path.display()
        );
    }

    let content = toml::to_string_pretty(&ProjectConfig::template())?;
    if !root.exists() {
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create {}", root.display()))?;
    }
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE;
    use tempfile::tempdir;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempdir().unwrap();
        init_config(dir.path(), Path::new(CONFIG_FILE)).unwrap();

        let config = ProjectConfig::load(dir.path(), Path::new(CONFIG_FILE)).unwrap();
        config.validate().unwrap();
        assert!(config.groups.contains_key("main"));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "# mine\n").unwrap();

        let err = init_config(dir.path(), Path::new(CONFIG_FILE)).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# mine\n");
    }

    #[test]
    fn test_init_creates_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("new-site");
        init_config(&root, Path::new(CONFIG_FILE)).unwrap();
        assert!(root.join(CONFIG_FILE).is_file());
    }
}
