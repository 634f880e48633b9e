//! Schema migration of `project.json`.
//!
//! Migration runs in two stages. The layout stage works on the raw JSON
//! object, because documents written by old tool versions keep keys at
//! places the typed model has no field for. Once the layout is normalized
//! the `format` tag is validated and the document becomes a [`Document`],
//! which the remaining steps transform one after another.
//!
//! Every step is idempotent and gated on the state of the document, so a
//! document that is already current passes through unchanged. The pipeline
//! never writes anything; persisting the result is up to the caller.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    changelog::{self, ChangelogSource},
    console::{AdminChoice, Console},
    document::{BUILDS_KEY, BuildEntry, BuildKind, DEFAULT_PROFILE, Document, FORMAT_KEY, FormatTag},
    error::Error,
    relocate,
    settings::Settings,
};

/// Keys that identify the application and belong to the default profile.
pub const IDENTITY_KEYS: [&str; 2] = ["application_name", "version"];

/// Key of an obsolete setting that is dropped wherever it occurs.
pub const LEGACY_CORE_KEY: &str = "core";

/// Pre-2.0.0 settings that became build entries.
pub const LEGACY_BUILD_KEYS: [&str; 3] = ["admin", "scriptor", "vi"];

type LayoutStep = fn(Map<String, Value>) -> Map<String, Value>;

type Step = fn(Document, &mut Migrator<'_>) -> Result<Document, Error>;

const LAYOUT_STEPS: &[(&str, LayoutStep)] = &[
    ("relocate application_name", relocate_application_name),
    ("relocate version", relocate_version),
    ("purge core", purge_core),
    ("promote format", promote_format),
];

const STEPS: &[(&str, Step)] = &[
    ("strip pyodide prefix", strip_pyodide_prefix),
    ("record tool version", record_tool_version),
    ("1.0.0 -> 1.0.1", upgrade_1_0_0),
    ("1.0.1 -> 1.1.0", upgrade_1_0_1),
    ("1.1.0 -> 1.1.1", upgrade_1_1_0),
    ("1.1.1 -> 2.0.0", upgrade_1_1_1),
    ("convert legacy builds", convert_legacy_builds),
    ("choose admin build", choose_admin_build),
];

/// Result of one pipeline run.
#[derive(Debug)]
pub struct Migrated {
    pub document: Document,
    /// Names of the steps that changed the document, in order.
    pub applied: Vec<&'static str>,
    /// Whether this run crossed into 2.0.0.
    pub upgraded: bool,
}

pub struct Migrator<'a> {
    settings: &'a Settings,
    changelog: &'a dyn ChangelogSource,
    console: &'a mut dyn Console,
    upgraded: bool,
}

impl<'a> Migrator<'a> {
    pub fn new(
        settings: &'a Settings,
        changelog: &'a dyn ChangelogSource,
        console: &'a mut dyn Console,
    ) -> Self {
        Self {
            settings,
            changelog,
            console,
            upgraded: false,
        }
    }

    /// Brings a raw document to [`FormatTag::CURRENT`].
    ///
    /// Fails with [`Error::Schema`] when the `format` tag is unknown or the
    /// document cannot be represented after the layout stage. Changelog
    /// failures are logged and never fail the run.
    pub fn run(&mut self, mut raw: Map<String, Value>) -> Result<Migrated, Error> {
        self.upgraded = false;
        let mut applied = Vec::new();

        for &(name, step) in LAYOUT_STEPS {
            let before = raw.clone();
            raw = step(raw);
            if raw != before {
                debug!(step = name, "applied");
                applied.push(name);
            }
        }

        let mut document = Document::from_raw(raw)?;

        for &(name, step) in STEPS {
            let before = document.clone();
            document = step(document, self)?;
            if document != before {
                debug!(step = name, "applied");
                applied.push(name);
            }
        }

        Ok(Migrated {
            document,
            applied,
            upgraded: self.upgraded,
        })
    }

    fn notify(&mut self, previous: Option<&str>) -> Result<(), Error> {
        if !self.settings.changelog.enabled {
            return Ok(());
        }

        match changelog::notice(self.changelog, &self.settings.changelog, previous) {
            Ok(notice) => self.console.show_changelog(&notice),
            Err(e) => {
                warn!("{e}");
                Ok(())
            }
        }
    }
}

fn default_profile(root: &mut Map<String, Value>) -> Option<&mut Map<String, Value>> {
    root.get_mut(DEFAULT_PROFILE).and_then(Value::as_object_mut)
}

/// Leaves `key` only directly inside the default profile.
///
/// When `default` lacks the key, the first occurrence elsewhere is copied in;
/// afterwards every other occurrence is dropped. Build entries carry their
/// own `version`, so the `builds` mapping of every profile is set aside while
/// this runs.
fn relocate_identity_key(mut root: Map<String, Value>, key: &str) -> Map<String, Value> {
    let builds = detach_builds(&mut root);

    let present = default_profile(&mut root).is_some_and(|profile| profile.contains_key(key));
    if !present {
        relocate::find_and_move(&mut root, key, DEFAULT_PROFILE, true);
    }

    let kept = default_profile(&mut root).and_then(|profile| profile.remove(key));
    relocate::remove_all(&mut root, key);

    if let (Some(profile), Some(value)) = (default_profile(&mut root), kept) {
        profile.insert(key.to_string(), value);
    }
    for (name, value) in builds {
        if let Some(profile) = root.get_mut(&name).and_then(Value::as_object_mut) {
            profile.insert(BUILDS_KEY.to_string(), value);
        }
    }

    root
}

/// Removes `builds` from every top-level profile, keyed by profile name.
fn detach_builds(root: &mut Map<String, Value>) -> Vec<(String, Value)> {
    root.iter_mut()
        .filter_map(|(name, profile)| {
            let builds = profile.as_object_mut()?.remove(BUILDS_KEY)?;
            Some((name.clone(), builds))
        })
        .collect()
}

fn relocate_application_name(root: Map<String, Value>) -> Map<String, Value> {
    relocate_identity_key(root, IDENTITY_KEYS[0])
}

fn relocate_version(root: Map<String, Value>) -> Map<String, Value> {
    relocate_identity_key(root, IDENTITY_KEYS[1])
}

fn purge_core(mut root: Map<String, Value>) -> Map<String, Value> {
    relocate::remove_all(&mut root, LEGACY_CORE_KEY);
    root
}

/// Very old documents kept `format` inside the default profile.
fn promote_format(mut root: Map<String, Value>) -> Map<String, Value> {
    if let Some(format) = default_profile(&mut root).and_then(|profile| profile.remove(FORMAT_KEY))
    {
        root.insert(FORMAT_KEY.to_string(), format);
    }
    root
}

/// Introduced with 1.0.1: `pyodide` versions are stored without the `v`.
fn strip_pyodide_prefix(mut document: Document, _: &mut Migrator<'_>) -> Result<Document, Error> {
    if let Some(Value::String(version)) = document.default.settings.get_mut("pyodide")
        && let Some(stripped) = version.strip_prefix('v')
    {
        *version = stripped.to_string();
    }
    Ok(document)
}

fn record_tool_version(
    mut document: Document,
    migrator: &mut Migrator<'_>,
) -> Result<Document, Error> {
    let running = &migrator.settings.tool_version;
    if document.cli_version.as_deref() == Some(running.as_str()) {
        return Ok(document);
    }

    let running = running.clone();
    migrator.notify(document.cli_version.as_deref())?;
    document.cli_version = Some(running);
    Ok(document)
}

fn upgrade_1_0_0(mut document: Document, _: &mut Migrator<'_>) -> Result<Document, Error> {
    if document.format == FormatTag::V1_0_0 {
        document.format = FormatTag::V1_0_1;
    }
    Ok(document)
}

fn upgrade_1_0_1(mut document: Document, _: &mut Migrator<'_>) -> Result<Document, Error> {
    if document.format == FormatTag::V1_0_1 {
        document.format = FormatTag::V1_1_0;
    }
    Ok(document)
}

/// `script` builds were renamed to `exec` in 1.1.1.
fn upgrade_1_1_0(mut document: Document, _: &mut Migrator<'_>) -> Result<Document, Error> {
    for entry in document.default.builds.values_mut() {
        if entry.kind == BuildKind::Script {
            entry.kind = BuildKind::Exec;
        }
    }
    if document.format == FormatTag::V1_1_0 {
        document.format = FormatTag::V1_1_1;
    }
    Ok(document)
}

fn upgrade_1_1_1(mut document: Document, migrator: &mut Migrator<'_>) -> Result<Document, Error> {
    if matches!(document.format, FormatTag::V1_1_1 | FormatTag::V1_2_0) {
        info!(from = %document.format, to = %FormatTag::V2_0_0, "upgrading project format");
        document.format = FormatTag::V2_0_0;
        migrator.upgraded = true;
    }
    Ok(document)
}

/// Turns `default.admin = "v4.0.0"` and friends into build entries.
fn convert_legacy_builds(
    mut document: Document,
    migrator: &mut Migrator<'_>,
) -> Result<Document, Error> {
    for key in LEGACY_BUILD_KEYS {
        let version = match document.default.settings.remove(key) {
            None => continue,
            Some(Value::String(version)) => version,
            Some(other) => {
                return Err(Error::schema(format!(
                    "default.{key} must be a version string, found {other}"
                )));
            }
        };

        let command = format!("{} package install {key}", migrator.settings.tool_name);
        let version = version.trim_start_matches('v');
        document
            .default
            .builds
            .insert(key.to_string(), BuildEntry::exec(command, version));
    }
    Ok(document)
}

/// Asked once, on the run that crossed into 2.0.0.
fn choose_admin_build(
    mut document: Document,
    migrator: &mut Migrator<'_>,
) -> Result<Document, Error> {
    let builds = &mut document.default.builds;
    if !migrator.upgraded || !(builds.contains_key("admin") || builds.contains_key("vi")) {
        return Ok(document);
    }

    match migrator.console.choose_admin()? {
        AdminChoice::AdminOnly => {
            builds.remove("vi");
            info!("You are using the ViUR Admin");
        }
        AdminChoice::ViOnly => {
            builds.remove("admin");
            info!("You are using the Vi Administration");
        }
        AdminChoice::Both => {}
    }
    Ok(document)
}
