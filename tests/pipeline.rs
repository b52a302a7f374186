//! End-to-end producer -> worker -> appender tests against a real
//! `LoggingConfig`. Each test builds its own config and file paths so they
//! can run in parallel in the same process.

use std::fs;
use std::io::Read;
use std::time::Duration;

use swiftlog::config::{AppenderConfig, LoggerConfig, LoggingConfig, PoolConfig};

fn unique_path(tag: &str) -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("swiftlog-{tag}-{id}.log"))
}

fn read_file(path: &std::path::Path) -> String {
    let mut contents = String::new();
    fs::File::open(path)
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    contents
}

#[test]
fn records_flow_from_producer_to_file_appender() {
    let path = unique_path("pipeline");
    let mut appenders = std::collections::HashMap::new();
    appenders.insert(
        "file".to_string(),
        AppenderConfig::RollingFile {
            path: path.display().to_string(),
            max_bytes: 10 * 1024 * 1024,
            max_backups: 1,
            level: None,
            encoding: swiftlog::appender::Encoding::Utf8,
        },
    );
    let mut loggers = std::collections::HashMap::new();
    loggers.insert(
        String::new(),
        LoggerConfig {
            appenders: vec!["file".to_string()],
            ..LoggerConfig::default()
        },
    );
    let config = LoggingConfig {
        pool: PoolConfig {
            pool_size: 8,
            buffer_size: 64,
            string_capacity: 8,
        },
        appenders,
        loggers,
        ..LoggingConfig::default()
    };

    swiftlog::initialize(config).unwrap();
    let logger = swiftlog::get_logger("pipeline.test");
    let mut builder = logger
        .begin_record(swiftlog::Level::Info, Some("Tomorrow is another day."))
        .expect("logger enabled and pool not exhausted");
    builder.append_key_value("NumSeconds", |b| {
        b.append_i64(86400);
    });
    builder.submit();

    // give the worker a moment to drain
    std::thread::sleep(Duration::from_millis(200));
    swiftlog::shutdown();

    let contents = read_file(&path);
    assert!(contents.contains("Tomorrow is another day."));
    assert!(contents.contains("86400"));

    let _ = fs::remove_file(&path);
}
