//! The project document on disk.
//!
//! [`ProjectStore`] is the entry point for commands that need project
//! configuration. It finds `project.json` by walking up from a start
//! directory, loads and migrates it, writes the migrated document back, and
//! resolves profiles.
//!
//! # Example
//!
//! ```rust,no_run
//! use project_config::{ProjectStore, Settings};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = ProjectStore::interactive(Settings::discover()?);
//!
//!     // Locates, loads and migrates on first use.
//!     let develop = store.get_profile("develop")?;
//!     println!("application: {}", develop["application_name"]);
//!
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value, ser::PrettyFormatter};
use tracing::info;

use crate::{
    atomic::AtomicFile,
    changelog::{ChangelogSource, GithubChangelog},
    console::{Console, Prompt},
    document::{Document, FORMAT_KEY},
    error::Error,
    migration::Migrator,
    profile,
    settings::Settings,
};

/// Owner of the configuration document for one tool invocation.
///
/// # Lifecycle
///
/// 1. **Create**: [`init`](ProjectStore::init) starts from an in-memory
///    fallback document at the current format with an empty default profile.
/// 2. **Locate**: [`locate`](ProjectStore::locate) or
///    [`locate_from`](ProjectStore::locate_from) records the project root.
/// 3. **Load**: [`load`](ProjectStore::load) overlays the file onto the
///    fallback, migrates, and saves.
/// 4. **Use**: [`get_profile`](ProjectStore::get_profile),
///    [`document`](ProjectStore::document).
///
/// `get_profile` performs steps 2 and 3 itself when they have not happened
/// yet.
pub struct ProjectStore {
    settings: Settings,
    changelog: Box<dyn ChangelogSource>,
    console: Box<dyn Console>,

    /// Directory containing the configuration file, once located.
    root: Option<PathBuf>,

    document: Document,
    loaded: bool,
}

impl ProjectStore {
    pub fn init(
        settings: Settings,
        changelog: Box<dyn ChangelogSource>,
        console: Box<dyn Console>,
    ) -> Self {
        Self {
            settings,
            changelog,
            console,
            root: None,
            document: Document::default(),
            loaded: false,
        }
    }

    /// A store that fetches release notes from GitHub and asks on the terminal.
    pub fn interactive(settings: Settings) -> Self {
        let changelog = Box::new(GithubChangelog::new(&settings.changelog));
        Self::init(settings, changelog, Box::new(Prompt::stdio()))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Walks up from the current working directory; see
    /// [`locate_from`](ProjectStore::locate_from).
    pub fn locate(&mut self) -> Result<&Path, Error> {
        let cwd = std::env::current_dir().map_err(|source| Error::Read {
            path: PathBuf::from("."),
            source,
        })?;
        self.locate_from(&cwd)
    }

    /// Finds the nearest directory at or above `start` that contains the
    /// configuration file and records it as the project root.
    ///
    /// The process working directory is left alone; relative paths of other
    /// commands should be resolved against [`root`](ProjectStore::root).
    pub fn locate_from(&mut self, start: &Path) -> Result<&Path, Error> {
        let start = std::path::absolute(start).map_err(|source| Error::Read {
            path: start.to_path_buf(),
            source,
        })?;

        let Some(found) = start
            .ancestors()
            .find(|dir| dir.join(&self.settings.file_name).is_file())
        else {
            return Err(Error::NotFound {
                file_name: self.settings.file_name.clone(),
                start,
            });
        };

        if found != start {
            info!("Project root is {}", found.display());
        }

        let root = self.root.insert(found.to_path_buf());
        Ok(root.as_path())
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Full path of the configuration file, once located.
    pub fn path(&self) -> Option<PathBuf> {
        self.root
            .as_ref()
            .map(|root| root.join(&self.settings.file_name))
    }

    fn require_path(&self) -> Result<PathBuf, Error> {
        self.path().ok_or_else(|| Error::NotFound {
            file_name: self.settings.file_name.clone(),
            start: PathBuf::new(),
        })
    }

    /// Reads the configuration file, migrates it and writes it back.
    ///
    /// Locates the project from the working directory first if that has not
    /// happened yet. Returns the names of the migration steps that changed
    /// the document.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] - no configuration file up to the filesystem root
    /// - [`Error::Read`] - the file cannot be read
    /// - [`Error::Parse`] - the file is not a JSON object
    /// - [`Error::Schema`] - the document cannot be migrated automatically
    /// - [`Error::Write`] - saving the migrated document failed
    ///
    /// On every error the file is left as it was.
    pub fn load(&mut self) -> Result<Vec<&'static str>, Error> {
        if self.root.is_none() {
            self.locate()?;
        }
        let path = self.require_path()?;

        let contents = AtomicFile::new(&path)
            .read()
            .map_err(|source| Error::Read {
                path: path.clone(),
                source,
            })?;
        let parsed: Map<String, Value> =
            serde_json::from_str(&contents).map_err(|source| Error::Parse { path, source })?;

        let mut raw = self.document.to_raw()?;
        raw.extend(parsed);

        let applied = self.migrate_raw(raw)?;
        self.loaded = true;
        Ok(applied)
    }

    /// Runs the migration pipeline over the in-memory document and saves.
    pub fn migrate(&mut self) -> Result<Vec<&'static str>, Error> {
        let raw = self.document.to_raw()?;
        self.migrate_raw(raw)
    }

    fn migrate_raw(&mut self, raw: Map<String, Value>) -> Result<Vec<&'static str>, Error> {
        let migrated =
            Migrator::new(&self.settings, self.changelog.as_ref(), self.console.as_mut()).run(raw)?;

        self.document = migrated.document;
        self.save()?;
        Ok(migrated.applied)
    }

    /// Writes the document with sorted keys, four-space indentation and a
    /// trailing newline, replacing the file atomically.
    pub fn save(&self) -> Result<(), Error> {
        let path = self.require_path()?;
        let contents = render(&self.document)?;
        AtomicFile::new(&path)
            .write(contents.as_bytes())
            .map_err(|source| Error::Write { path, source })
    }

    /// Effective settings of profile `name`, loading the project on first use.
    ///
    /// `format` is rejected without touching the file system.
    pub fn get_profile(&mut self, name: &str) -> Result<Map<String, Value>, Error> {
        if name == FORMAT_KEY {
            return Err(Error::InvalidProfile(
                "your profile can not be named 'format'".to_string(),
            ));
        }
        if !self.loaded {
            self.load()?;
        }
        profile::effective(&self.document, name)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }
}

/// Canonical text of `document` as stored in `project.json`.
pub fn render(document: &Document) -> Result<String, Error> {
    let value = Value::Object(document.to_raw()?);

    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    buf.push(b'\n');

    String::from_utf8(buf).map_err(|e| Error::schema(format!("document is not valid UTF-8: {e}")))
}
