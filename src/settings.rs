//! Settings of the migration engine itself.
//!
//! These are not part of `project.json`; they describe where the document
//! lives, which tool is running it, and where release notes are fetched from.
//! Defaults cover the common case. A TOML file can override any subset:
//!
//! ```toml
//! tool_name = "viur"
//!
//! [changelog]
//! enabled = false
//! timeout_secs = 3
//! ```

use std::{path::Path, time::Duration};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Environment variable naming a TOML settings file.
pub const SETTINGS_ENV: &str = "PROJECT_CONFIG_SETTINGS";

/// Well-known name of the project configuration file.
pub const PROJECT_CONFIG_FILE: &str = "project.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct Settings {
    /// File name searched for when locating the project root.
    pub file_name: String,

    /// Name used in synthesized build commands (`<tool> package install vi`).
    pub tool_name: String,

    /// Version of the running tool, recorded as `cli-version`.
    pub tool_version: String,

    pub changelog: ChangelogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            file_name: PROJECT_CONFIG_FILE.to_string(),
            tool_name: "viur".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            changelog: ChangelogSettings::default(),
        }
    }
}

/// Where release notes come from and how much of them is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct ChangelogSettings {
    pub enabled: bool,
    pub organization: String,
    pub repository: String,
    /// Reference holding the latest notes.
    pub branch: String,
    pub file: String,
    /// Lines shown on first-time notification.
    pub preview_lines: usize,
    pub timeout_secs: u64,
}

impl Default for ChangelogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            organization: "viur-framework".to_string(),
            repository: "viur-cli".to_string(),
            branch: "main".to_string(),
            file: "CHANGELOG.md".to_string(),
            preview_lines: 20,
            timeout_secs: 10,
        }
    }
}

impl ChangelogSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Raw URL of the notes at `reference`, or at the configured branch.
    pub fn url(&self, reference: Option<&str>) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            self.organization,
            self.repository,
            reference.unwrap_or(&self.branch),
            self.file
        )
    }
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::SettingsRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Loads settings from [`SETTINGS_ENV`] if it is set, defaults otherwise.
    pub fn discover() -> Result<Self, Error> {
        match std::env::var_os(SETTINGS_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}
