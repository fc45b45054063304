//! Installs a file-backed subscriber. Kept in its own test binary since the
//! global subscriber can be set only once per process.

use vigil_telemetry::{LogConfig, LogFormat, TelemetryError, setup_logging};

#[test]
fn test_file_target_writes_and_second_init_fails() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    let config = LogConfig::new("info")
        .with_format(LogFormat::Json)
        .with_file_logging(&logs, "vigil-test");

    setup_logging(&config).unwrap();
    tracing::info!(sequence = 7_u64, "block appended");

    let entries: Vec<_> = std::fs::read_dir(&logs).unwrap().collect();
    assert_eq!(entries.len(), 1);
    let path = entries[0].as_ref().unwrap().path();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("vigil-test"));
    assert!(name.ends_with(".log"));
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("block appended"));
    assert!(contents.contains("\"sequence\":7"));

    assert!(matches!(
        setup_logging(&LogConfig::default()),
        Err(TelemetryError::InitError(_))
    ));
}
