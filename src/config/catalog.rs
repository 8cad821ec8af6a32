use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding the local checkpoint database.
    pub data_dir: PathBuf,
    /// Project queried when none is given explicitly.
    pub project: String,
    /// Recorded as the owner of notebooks created locally.
    pub principal: String,
}

impl CatalogConfig {
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("nbcheckpoint.db")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from [`config_path`], falling back to defaults when the file does
    /// not exist.
    pub fn load_default() -> Result<Self> {
        let path = config_path()?;
        match Self::load(&path) {
            Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            return Err(Error::Config("project cannot be empty".to_string()));
        }
        if self.principal.trim().is_empty() {
            return Err(Error::Config("principal cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Open (and create if needed) the local store described by this config.
    #[cfg(feature = "sqlite")]
    pub fn open_store(&self) -> Result<crate::store::SqliteStore> {
        fs::create_dir_all(&self.data_dir)?;
        let store = crate::store::SqliteStore::new(self.db_path())?
            .with_principal(self.principal.clone());
        store.initialize()?;
        Ok(store)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            project: "default".to_string(),
            principal: "local".to_string(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "nbcheckpoint").ok_or_else(|| {
        Error::Config("could not determine config directory; is $HOME set?".to_string())
    })?;
    Ok(dirs.config_dir().join("config.toml"))
}
