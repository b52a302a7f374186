//! Exercises `DropLogMessageAndNotifyAppenders`: a record dropped because the
//! pool is exhausted still reaches the configured appenders as a synthesized
//! notice once the worker gets to it.

use std::time::Duration;

use swiftlog::config::{AppenderConfig, LoggerConfig, LoggingConfig, PoolConfig, PoolExhaustionStrategy};

fn unique_path(tag: &str) -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("swiftlog-{tag}-{id}.log"))
}

fn read_file(path: &std::path::Path) -> String {
    let mut contents = String::new();
    std::io::Read::read_to_string(&mut std::fs::File::open(path).unwrap(), &mut contents).unwrap();
    contents
}

#[test]
fn pool_exhaustion_delivers_one_notice_through_the_normal_pipeline() {
    let path = unique_path("notify-on-drop");
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
            pool_exhaustion_strategy: PoolExhaustionStrategy::DropLogMessageAndNotifyAppenders,
            ..LoggerConfig::default()
        },
    );
    let config = LoggingConfig {
        pool: PoolConfig {
            pool_size: 2,
            buffer_size: 32,
            string_capacity: 4,
        },
        appenders,
        loggers,
        ..LoggingConfig::default()
    };

    swiftlog::initialize(config).unwrap();
    let logger = swiftlog::get_logger("notify.test");

    // Exhaust the pool by holding builders open without submitting.
    let mut held = Vec::new();
    for _ in 0..2 {
        held.push(
            logger
                .begin_record(swiftlog::Level::Info, Some("held"))
                .expect("pool not yet exhausted"),
        );
    }
    assert!(
        logger.begin_record(swiftlog::Level::Info, Some("dropped")).is_none(),
        "third record should be dropped once the pool is exhausted"
    );

    // The worker's notice buffer doesn't come from the pool, so it can
    // deliver the notice even while the pool itself is still exhausted.
    std::thread::sleep(Duration::from_millis(200));

    drop(held);
    swiftlog::shutdown();

    let contents = read_file(&path);
    assert!(
        contents.contains("pool exhausted"),
        "expected a synthesized notice in the appender output, got: {contents:?}"
    );
    assert!(
        contents.contains('1'),
        "expected the notice to report exactly one dropped record, got: {contents:?}"
    );
}
