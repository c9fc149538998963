//! File and environment layering.

use std::io::Write;

use daedalus_config::{ConfigError, ConfigLoader, LogFormat};

#[test]
fn test_toml_file_then_env() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[server]
http_addr = "127.0.0.1:7000"

[logging]
format = "pretty"
"#
    )
    .unwrap();

    std::env::set_var("DAEDALUS_LOADER_TEST__SERVER__SHUTDOWN_TIMEOUT_SECS", "3");
    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .with_env_prefix("daedalus_loader_test")
        .load()
        .unwrap();
    std::env::remove_var("DAEDALUS_LOADER_TEST__SERVER__SHUTDOWN_TIMEOUT_SECS");

    assert_eq!(config.server.http_addr, "127.0.0.1:7000");
    assert_eq!(config.server.shutdown_timeout_secs, 3);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_json_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{ "validation": {{ "response": false }} }}"#).unwrap();

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert!(!config.validation.response);
}

#[test]
fn test_missing_file() {
    let err = ConfigLoader::new()
        .with_file("/definitely/not/here/daedalus.toml")
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));

    let config = ConfigLoader::new()
        .with_optional_file("/definitely/not/here/daedalus.toml")
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config.server.http_addr, "0.0.0.0:8080");
}

#[test]
fn test_unknown_section_in_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[telemetry]\nenabled = true").unwrap();

    let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::TomlError(_)));
}
