use std::fs;
use std::sync::Arc;

use tempfile::tempdir;

use crate::config::{
    ChainedSource, CommandLineSource, ConfigError, Configuration, ConfigurationSource,
    EnvironmentVariablesSource, JsonFileSource,
};

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[test]
fn test_json_file_flattens_nested_values() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("AppSettings.json");
    fs::write(
        &path,
        r#"{
            "Application": { "Title": "Demo", "Timeout": 30, "Verbose": false, "Proxy": null },
            "Endpoints": ["https://a.example", { "Url": "https://b.example" }],
            "Empty": {},
            "None": []
        }"#,
    )
    .unwrap();

    let config = JsonFileSource::new(&path, false).load().unwrap();
    assert_eq!(config.get("Application:Title"), Some("Demo"));
    assert_eq!(config.get("Application:Timeout"), Some("30"));
    assert_eq!(config.get("Application:Verbose"), Some("false"));
    assert_eq!(config.get("Application:Proxy"), Some(""));
    assert_eq!(config.get("Endpoints:0"), Some("https://a.example"));
    assert_eq!(config.get("Endpoints:1:Url"), Some("https://b.example"));
    assert_eq!(config.get("Empty"), Some(""));
    assert_eq!(config.get("None"), Some(""));
}

#[test]
fn test_missing_optional_file_is_empty() {
    let dir = tempdir().expect("Failed to create temp directory");
    let source = JsonFileSource::new(dir.path().join("absent.json"), true);
    assert!(source.load().unwrap().is_empty());
}

#[test]
fn test_missing_required_file_is_io_error() {
    let dir = tempdir().expect("Failed to create temp directory");
    let source = JsonFileSource::new(dir.path().join("absent.json"), false);
    assert!(matches!(source.load(), Err(ConfigError::Io { .. })));
}

#[test]
fn test_blank_file_is_empty() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("blank.json");
    fs::write(&path, "  \n").unwrap();
    assert!(JsonFileSource::new(&path, true).load().unwrap().is_empty());
}

#[test]
fn test_malformed_file_is_fatal_even_when_optional() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("broken.json");
    fs::write(&path, r#"{ "Application": { "Timeout": 30 "#).unwrap();

    match JsonFileSource::new(&path, true).load() {
        Err(ConfigError::Malformed { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("Expected Malformed, got {:?}", other),
    }
}

#[test]
fn test_non_object_root_is_rejected() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("list.json");
    fs::write(&path, "[1, 2, 3]").unwrap();
    assert!(matches!(
        JsonFileSource::new(&path, true).load(),
        Err(ConfigError::InvalidRoot { .. })
    ));
}

#[test]
fn test_environment_prefix_is_stripped_case_insensitively() {
    let source = EnvironmentVariablesSource::new(
        "apphost_",
        vec![
            ("APPHOST_Application__Timeout".to_string(), "60".to_string()),
            ("apphost_environment".to_string(), "Development".to_string()),
            ("APPHOST_".to_string(), "ignored".to_string()),
            ("OTHER_Application__Timeout".to_string(), "1".to_string()),
            ("APP".to_string(), "short".to_string()),
        ],
    );

    let config = source.load().unwrap();
    assert_eq!(config.len(), 2);
    assert_eq!(config.get("Application:Timeout"), Some("60"));
    assert_eq!(config.get("Environment"), Some("Development"));
}

#[test]
fn test_command_line_forms() {
    let source = CommandLineSource::new(args(&[
        "--Application:Timeout=60",
        "/Application:Title",
        "Demo",
        "environment=Staging",
        "--Logging:LogLevel:Default",
        "debug",
        "stray",
        "-v",
    ]));

    let config = source.load().unwrap();
    assert_eq!(config.get("Application:Timeout"), Some("60"));
    assert_eq!(config.get("Application:Title"), Some("Demo"));
    assert_eq!(config.get("environment"), Some("Staging"));
    assert_eq!(config.get("Logging:LogLevel:Default"), Some("debug"));
    assert_eq!(config.len(), 4);
}

#[test]
fn test_command_line_empty_value_and_trailing_switch() {
    let config = CommandLineSource::new(args(&["--Greeting=", "--Dangling"]))
        .load()
        .unwrap();
    assert_eq!(config.get("Greeting"), Some(""));
    assert!(!config.contains_key("Dangling"));
}

#[test]
fn test_command_line_rejects_short_assignment() {
    let result = CommandLineSource::new(args(&["-t=5"])).load();
    assert!(matches!(result, Err(ConfigError::InvalidArgument { .. })));

    let result = CommandLineSource::new(args(&["--=5"])).load();
    assert!(matches!(result, Err(ConfigError::InvalidArgument { .. })));
}

#[test]
fn test_chained_source_copies_tree() {
    let inner: Configuration = [("environment", "Development")].into_iter().collect();
    let source = ChainedSource::new("host", Arc::new(inner.clone()));
    assert_eq!(source.load().unwrap(), inner);
    assert!(source.name().contains("host"));
}
