//! Typed model of `project.json`.
//!
//! The on-disk document is a single JSON object. Three top-level keys are
//! reserved (`format`, `cli-version`, `default`); every other key is a named
//! profile. [`Document`] keeps the reserved keys in named fields and the
//! profiles in a separate map that can only be filled through
//! [`Document::set_profile`], so a profile called `format` cannot exist.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

pub const FORMAT_KEY: &str = "format";
pub const CLI_VERSION_KEY: &str = "cli-version";
pub const DEFAULT_PROFILE: &str = "default";
pub const BUILDS_KEY: &str = "builds";

/// Top-level keys that never name a profile.
pub const RESERVED_KEYS: [&str; 2] = [FORMAT_KEY, CLI_VERSION_KEY];

/// Schema revision of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatTag {
    V1_0_0,
    V1_0_1,
    V1_1_0,
    V1_1_1,
    V1_2_0,
    V2_0_0,
}

impl FormatTag {
    pub const CURRENT: FormatTag = FormatTag::V2_0_0;

    pub const ALL: [FormatTag; 6] = [
        FormatTag::V1_0_0,
        FormatTag::V1_0_1,
        FormatTag::V1_1_0,
        FormatTag::V1_1_1,
        FormatTag::V1_2_0,
        FormatTag::V2_0_0,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormatTag::V1_0_0 => "1.0.0",
            FormatTag::V1_0_1 => "1.0.1",
            FormatTag::V1_1_0 => "1.1.0",
            FormatTag::V1_1_1 => "1.1.1",
            FormatTag::V1_2_0 => "1.2.0",
            FormatTag::V2_0_0 => "2.0.0",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| Error::schema(format!("unknown format version {s:?}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildKind {
    Exec,
    Npm,
    /// Pre-1.1.1 spelling of [`BuildKind::Exec`].
    Script,
}

/// One named instruction in `default.builds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildEntry {
    pub command: String,
    pub kind: BuildKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Fields this model does not know about, kept as written.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BuildEntry {
    pub fn exec(command: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            kind: BuildKind::Exec,
            version: Some(version.into()),
            extra: Map::new(),
        }
    }
}

/// The `default` profile: build entries plus arbitrary shared settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultProfile {
    /// Always present once a document has been through the typed model.
    #[serde(default)]
    pub builds: BTreeMap<String, BuildEntry>,
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl DefaultProfile {
    /// The profile as a plain mapping, `builds` included.
    pub fn to_map(&self) -> Result<Map<String, Value>, Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::schema("default profile did not serialize to a mapping")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub format: FormatTag,
    pub cli_version: Option<String>,
    pub default: DefaultProfile,
    profiles: BTreeMap<String, Map<String, Value>>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            format: FormatTag::CURRENT,
            cli_version: None,
            default: DefaultProfile::default(),
            profiles: BTreeMap::new(),
        }
    }
}

/// Whether `name` may be used as a profile key.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_KEYS.contains(&name)
}

impl Document {
    /// Builds the typed document from a raw top-level mapping.
    ///
    /// `format` must hold a known tag. `default` is optional and must be a
    /// mapping when present, as must every profile.
    pub fn from_raw(mut raw: Map<String, Value>) -> Result<Self, Error> {
        let format = match raw.remove(FORMAT_KEY) {
            Some(Value::String(tag)) => tag.parse()?,
            Some(other) => {
                return Err(Error::schema(format!("unknown format version {other}")));
            }
            None => return Err(Error::schema("missing format version")),
        };

        let cli_version = match raw.remove(CLI_VERSION_KEY) {
            Some(Value::String(version)) => Some(version),
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(Error::schema(format!("{CLI_VERSION_KEY} must be a string, found {other}")));
            }
        };

        let default = match raw.remove(DEFAULT_PROFILE) {
            Some(value @ Value::Object(_)) => serde_json::from_value(value)
                .map_err(|e| Error::schema(format!("invalid default profile: {e}")))?,
            Some(other) => {
                return Err(Error::schema(format!("default profile must be a mapping, found {other}")));
            }
            None => DefaultProfile::default(),
        };

        let mut document = Document {
            format,
            cli_version,
            default,
            profiles: BTreeMap::new(),
        };

        for (name, body) in raw {
            match body {
                Value::Object(body) => document.set_profile(name, body)?,
                other => {
                    return Err(Error::schema(format!(
                        "profile {name:?} must be a mapping, found {other}"
                    )));
                }
            }
        }

        Ok(document)
    }

    /// The document as a single JSON object with sorted keys.
    pub fn to_raw(&self) -> Result<Map<String, Value>, Error> {
        let mut raw = Map::new();
        for (name, body) in &self.profiles {
            raw.insert(name.clone(), Value::Object(body.clone()));
        }
        raw.insert(FORMAT_KEY.to_string(), Value::String(self.format.to_string()));
        if let Some(version) = &self.cli_version {
            raw.insert(CLI_VERSION_KEY.to_string(), Value::String(version.clone()));
        }
        raw.insert(DEFAULT_PROFILE.to_string(), Value::Object(self.default.to_map()?));
        Ok(raw)
    }

    pub fn profile(&self, name: &str) -> Option<&Map<String, Value>> {
        self.profiles.get(name)
    }

    pub fn profiles(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        self.profiles.iter().map(|(name, body)| (name.as_str(), body))
    }

    /// Inserts or replaces a named profile.
    pub fn set_profile(&mut self, name: impl Into<String>, body: Map<String, Value>) -> Result<(), Error> {
        let name = name.into();
        if is_reserved(&name) || name == DEFAULT_PROFILE {
            return Err(Error::InvalidProfile(format!(
                "your profile can not be named {name:?}"
            )));
        }
        self.profiles.insert(name, body);
        Ok(())
    }
}
