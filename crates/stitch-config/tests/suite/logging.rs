use stitch_config::{init_tracing, LoggingConfig};

#[test]
fn init_tracing_writes_events_to_the_configured_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stitch.log");
    let config = LoggingConfig {
        level: "info".to_owned(),
        json: false,
        stderr: false,
        file: Some(path.clone()),
    };

    init_tracing(&config);
    tracing::info!(target: "stitch.config", advice_count = 3, "loaded stitch config");
    // Second call is a no-op and must not reopen or truncate the file.
    init_tracing(&LoggingConfig::default());
    tracing::debug!(target: "stitch.config", "below the configured level");

    let text = std::fs::read_to_string(&path).expect("log file");
    assert!(text.contains("loaded stitch config"), "{text}");
    assert!(text.contains("advice_count=3"), "{text}");
    assert!(text.contains("stitch.config"), "{text}");
}
