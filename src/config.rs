use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, Result};

/// repository configuration stored in the data directory as `config`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub core: CoreConfig,
}

/// the `core` section
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(rename = "repositoryformatversion")]
    pub repository_format_version: u32,
    #[serde(rename = "filemode")]
    pub file_mode: bool,
    pub base: bool,
}

impl Config {
    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_path(path)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig {
                repository_format_version: 0,
                file_mode: false,
                base: false,
            },
        }
    }
}
