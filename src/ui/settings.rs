//! Persisted client preferences.

use crate::{utils, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

serde_plain::derive_display_from_serialize!(Theme);
serde_plain::derive_fromstr_from_deserialize!(Theme);

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Reads and writes the client preferences.
#[async_trait::async_trait]
pub trait Settings: Send + Sync {
    async fn theme(&self) -> Result<Theme>;

    async fn set_theme(&self, theme: Theme) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    theme: Theme,
}

/// Keeps the preferences in `$CASHCAL_HOME/settings.json`. The last write wins.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(home: &Path) -> Self {
        Self {
            path: home.join(SETTINGS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<SettingsFile> {
        if !self.path.is_file() {
            debug!("No settings at {}, using defaults", self.path.display());
            return Ok(SettingsFile::default());
        }
        utils::deserialize(&self.path).await
    }
}

#[async_trait::async_trait]
impl Settings for FileSettings {
    async fn theme(&self) -> Result<Theme> {
        Ok(self.load().await?.theme)
    }

    async fn set_theme(&self, theme: Theme) -> Result<()> {
        let mut settings = self.load().await?;
        settings.theme = theme;
        if let Some(dir) = self.path.parent() {
            utils::make_dir(dir).await?;
        }
        utils::serialize(&self.path, &settings).await
    }
}

/// Preferences that are forgotten when the process exits.
#[derive(Debug, Default)]
pub struct MemorySettings {
    theme: Mutex<Theme>,
}

impl MemorySettings {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme: Mutex::new(theme),
        }
    }
}

#[async_trait::async_trait]
impl Settings for MemorySettings {
    async fn theme(&self) -> Result<Theme> {
        Ok(*self.theme.lock().unwrap_or_else(|p| p.into_inner()))
    }

    async fn set_theme(&self, theme: Theme) -> Result<()> {
        *self.theme.lock().unwrap_or_else(|p| p.into_inner()) = theme;
        Ok(())
    }
}
