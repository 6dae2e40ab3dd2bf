use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::activity::DEFAULT_PAGE_SIZE;
use crate::error::{IdeastormError, Result};
use crate::storage::DATA_DIR;

pub const CONFIG_FILE: &str = "config.yaml";

/// Project configuration, stored as `.ideastorm/config.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site_title: String,
    pub site_description: String,
    pub feed_page_size: u32,
    /// Applied to newly created problems
    pub default_public: bool,
    pub default_open: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_title: "Ideastorm".to_string(),
            site_description: "An idea-generation platform".to_string(),
            feed_page_size: DEFAULT_PAGE_SIZE,
            default_public: true,
            default_open: true,
        }
    }
}

impl Config {
    /// Load the project config. A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(DATA_DIR).join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        self.validate()?;
        let path = root.join(DATA_DIR).join(CONFIG_FILE);
        fs::write(&path, serde_yaml::to_string(self)?)?;
        tracing::debug!(path = %path.display(), "config written");
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.feed_page_size == 0 {
            return Err(IdeastormError::Config(
                "feed_page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<serde_yaml::Error> for IdeastormError {
    fn from(e: serde_yaml::Error) -> Self {
        IdeastormError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(DATA_DIR)).unwrap();
        tmp
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = project();
        let config = Config::load(tmp.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.feed_page_size, 10);
    }

    #[test]
    fn test_save_and_load() {
        let tmp = project();
        let config = Config {
            site_title: "Town hall".to_string(),
            default_public: false,
            ..Config::default()
        };
        config.save(tmp.path()).unwrap();
        assert_eq!(Config::load(tmp.path()).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = project();
        fs::write(tmp.path().join(DATA_DIR).join(CONFIG_FILE), "feed_page_size: 25\n").unwrap();
        let config = Config::load(tmp.path()).unwrap();
        assert_eq!(config.feed_page_size, 25);
        assert_eq!(config.site_title, "Ideastorm");
    }

    #[test]
    fn test_rejects_bad_files() {
        let tmp = project();
        let path = tmp.path().join(DATA_DIR).join(CONFIG_FILE);

        fs::write(&path, "feed_page_size: 0\n").unwrap();
        assert!(matches!(Config::load(tmp.path()), Err(IdeastormError::Config(_))));

        fs::write(&path, "feed_page_size: [nope\n").unwrap();
        assert!(matches!(Config::load(tmp.path()), Err(IdeastormError::Config(_))));
    }
}
