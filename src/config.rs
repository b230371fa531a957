use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Backend used for `external_load` / `external_save`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalBackend {
    #[default]
    Relational,
    Document,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalConfig {
    pub backend: ExternalBackend,
    /// SQLite database for the relational backend
    pub database: PathBuf,
    /// JSON lines collection for the document backend
    pub collection: PathBuf,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            backend: ExternalBackend::default(),
            database: default_directory().join("regstore.db"),
            collection: default_directory().join("regdata.jsonl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegstoreConfig {
    /// Storage mode name; unknown names fall back to `txt`
    pub mode: Option<String>,
    /// Global switch for every save
    pub dependencies_save: bool,
    /// Default file store directory
    pub directory: PathBuf,
    pub external: Option<ExternalConfig>,
}

impl Default for RegstoreConfig {
    fn default() -> Self {
        Self {
            mode: None,
            dependencies_save: true,
            directory: default_directory(),
            external: None,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("regstore.toml")
}

pub fn default_directory() -> PathBuf {
    PathBuf::from(".regstore")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<RegstoreConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: RegstoreConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &RegstoreConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = ".regstore/";

    if gitignore_path.exists() {
        let existing = std::fs::read_to_string(&gitignore_path)?;
        if existing.lines().any(|line| line.trim() == entry) {
            return Ok(());
        }
    }

    let mut content = String::new();
    if gitignore_path.exists() {
        content.push_str(&std::fs::read_to_string(&gitignore_path)?);
        if !content.ends_with('\n') {
            content.push('\n');
        }
    }
    content.push_str(entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("nope.toml").as_path())).unwrap().is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("regstore.toml");
        std::fs::write(&path, "mode = \"bin\"\n[external]\nbackend = \"document\"\n").unwrap();

        let config = load_config(Some(path.as_path())).unwrap().unwrap();
        assert_eq!(config.mode.as_deref(), Some("bin"));
        assert!(config.dependencies_save);
        assert_eq!(config.directory, default_directory());
        let external = config.external.unwrap();
        assert_eq!(external.backend, ExternalBackend::Document);
        assert_eq!(external.collection, default_directory().join("regdata.jsonl"));
    }

    #[test]
    fn test_write_config_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("regstore.toml");
        let config = RegstoreConfig::default();

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();
        assert_eq!(load_config(Some(path.as_path())).unwrap().unwrap(), config);
    }

    #[test]
    fn test_gitignore_entry_added_once() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "target/").unwrap();
        ensure_gitignore(dir.path()).unwrap();
        ensure_gitignore(dir.path()).unwrap();

        let contents = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(contents, "target/\n.regstore/\n");
    }
}
