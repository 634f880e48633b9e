use project_config::{
    AdminChoice, ChangelogSettings, ChangelogSource, Error, FetchError, ProjectStore, Settings,
    Unattended,
};
use serde_json::{Value, json};
use std::{fs, path::Path};
use tempfile::TempDir;

/// Helper to create a temporary directory for tests
fn temp_project_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

struct Offline;

impl ChangelogSource for Offline {
    fn fetch(&self, _: Option<&str>) -> Result<String, FetchError> {
        Err(FetchError::Transport {
            url: "offline".to_string(),
            reason: "tests run without network".to_string(),
        })
    }
}

fn settings(file_name: &str) -> Settings {
    Settings::builder()
        .file_name(file_name)
        .tool_version("3.0.0")
        .changelog(ChangelogSettings {
            enabled: false,
            ..ChangelogSettings::default()
        })
        .build()
        .expect("Failed to build settings")
}

fn store_with(settings: Settings) -> ProjectStore {
    ProjectStore::init(
        settings,
        Box::new(Offline),
        Box::new(Unattended::new(AdminChoice::Both, std::io::sink())),
    )
}

fn new_store() -> ProjectStore {
    store_with(settings("project.json"))
}

fn write_project(dir: &Path, value: &Value) {
    fs::write(
        dir.join("project.json"),
        serde_json::to_string(value).expect("Failed to serialize fixture"),
    )
    .expect("Failed to write project file");
}

#[test]
fn test_locate_walks_up_to_project_root() {
    let temp_dir = temp_project_dir();
    write_project(temp_dir.path(), &json!({"format": "2.0.0", "default": {}}));
    let nested = temp_dir.path().join("sources").join("app");
    fs::create_dir_all(&nested).expect("Failed to create nested dir");

    let mut store = new_store();
    let root = store
        .locate_from(&nested)
        .expect("Failed to locate project")
        .to_path_buf();

    assert_eq!(root, std::path::absolute(temp_dir.path()).expect("absolute"));
    assert_eq!(store.path(), Some(root.join("project.json")));
}

#[test]
fn test_locate_without_project_file_fails() {
    let temp_dir = temp_project_dir();
    let mut store = store_with(settings("no-such-project-file-4f1c.json"));

    let result = store.locate_from(temp_dir.path());
    assert!(matches!(result, Err(Error::NotFound { .. })));
}

#[test]
fn test_malformed_json_is_a_parse_error_and_file_is_untouched() {
    let temp_dir = temp_project_dir();
    let path = temp_dir.path().join("project.json");
    let content = "{\n    \"format\": \"2.0.0\",\n    \"default\": {\n}\n";
    fs::write(&path, content).expect("Failed to write project file");

    let mut store = new_store();
    store.locate_from(temp_dir.path()).expect("Failed to locate project");
    let result = store.load();

    match result {
        Err(Error::Parse { source, .. }) => assert!(source.line() > 0),
        other => panic!("Expected parse error, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(&path).expect("read back"), content);
}

#[test]
fn test_top_level_array_is_a_parse_error() {
    let temp_dir = temp_project_dir();
    fs::write(temp_dir.path().join("project.json"), "[1, 2]").expect("Failed to write");

    let mut store = new_store();
    store.locate_from(temp_dir.path()).expect("Failed to locate project");
    assert!(matches!(store.load(), Err(Error::Parse { .. })));
}

#[test]
fn test_save_writes_sorted_keys_with_four_space_indent() {
    let temp_dir = temp_project_dir();
    write_project(
        temp_dir.path(),
        &json!({
            "live": {"b": 1, "a": 2},
            "format": "2.0.0",
            "cli-version": "3.0.0",
            "default": {"application_name": "shop"}
        }),
    );

    let mut store = new_store();
    store.locate_from(temp_dir.path()).expect("Failed to locate project");
    store.load().expect("Failed to load project");

    let expected = r#"{
    "cli-version": "3.0.0",
    "default": {
        "application_name": "shop",
        "builds": {}
    },
    "format": "2.0.0",
    "live": {
        "a": 2,
        "b": 1
    }
}
"#;
    let saved = fs::read_to_string(temp_dir.path().join("project.json")).expect("read back");
    assert_eq!(saved, expected);
}

#[test]
fn test_save_leaves_no_temp_files() {
    let temp_dir = temp_project_dir();
    write_project(temp_dir.path(), &json!({"format": "1.1.0", "default": {}}));

    let mut store = new_store();
    store.locate_from(temp_dir.path()).expect("Failed to locate project");
    store.load().expect("Failed to load project");
    store.save().expect("Failed to save project");

    let entries: Vec<_> = fs::read_dir(temp_dir.path())
        .expect("Failed to read dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["project.json".to_string()]);
}

#[test]
fn test_get_profile_loads_lazily_and_merges() {
    let temp_dir = temp_project_dir();
    write_project(
        temp_dir.path(),
        &json!({
            "format": "2.0.0",
            "default": {"a": 1, "b": 2},
            "staging": {"b": 3, "c": 4}
        }),
    );

    let mut store = new_store();
    store.locate_from(temp_dir.path()).expect("Failed to locate project");
    let mut merged = store.get_profile("staging").expect("Failed to get profile");

    assert_eq!(merged.remove("builds"), Some(json!({})));
    assert_eq!(Value::Object(merged), json!({"a": 1, "b": 3, "c": 4}));
}

#[test]
fn test_format_profile_is_always_rejected() {
    // never located, never loaded: the name alone is enough
    let mut store = new_store();
    assert!(matches!(
        store.get_profile("format"),
        Err(Error::InvalidProfile(_))
    ));

    let temp_dir = temp_project_dir();
    write_project(temp_dir.path(), &json!({"format": "2.0.0", "default": {}}));
    store.locate_from(temp_dir.path()).expect("Failed to locate project");
    store.load().expect("Failed to load project");
    assert!(matches!(
        store.get_profile("format"),
        Err(Error::InvalidProfile(_))
    ));
}

#[test]
fn test_unknown_profile_is_rejected() {
    let temp_dir = temp_project_dir();
    write_project(temp_dir.path(), &json!({"format": "2.0.0", "default": {}}));

    let mut store = new_store();
    store.locate_from(temp_dir.path()).expect("Failed to locate project");
    assert!(matches!(
        store.get_profile("develop"),
        Err(Error::InvalidProfile(_))
    ));
}

#[test]
fn test_document_changes_persist_on_save() {
    let temp_dir = temp_project_dir();
    write_project(temp_dir.path(), &json!({"format": "2.0.0", "default": {}}));

    let mut store = new_store();
    store.locate_from(temp_dir.path()).expect("Failed to locate project");
    store.load().expect("Failed to load project");

    let mut body = serde_json::Map::new();
    body.insert("distribution_folder".to_string(), json!("./deploy"));
    store
        .document_mut()
        .set_profile("develop", body)
        .expect("Failed to add profile");
    store.save().expect("Failed to save project");

    let mut reloaded = new_store();
    reloaded
        .locate_from(temp_dir.path())
        .expect("Failed to locate project");
    let develop = reloaded.get_profile("develop").expect("Failed to get profile");
    assert_eq!(develop["distribution_folder"], json!("./deploy"));
}

#[test]
fn test_missing_file_keys_fall_back_to_in_memory_defaults() {
    let temp_dir = temp_project_dir();
    write_project(temp_dir.path(), &json!({"live": {}}));

    let mut store = new_store();
    store.locate_from(temp_dir.path()).expect("Failed to locate project");
    store.load().expect("Failed to load project");

    let saved: Value = serde_json::from_str(
        &fs::read_to_string(temp_dir.path().join("project.json")).expect("read back"),
    )
    .expect("valid JSON");
    assert_eq!(
        saved,
        json!({
            "cli-version": "3.0.0",
            "default": {"builds": {}},
            "format": "2.0.0",
            "live": {}
        })
    );
}
