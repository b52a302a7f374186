//! Exercises the pool-exhaustion drop policy and level filtering end to end.

use std::time::Duration;

use swiftlog::config::{AppenderConfig, LoggerConfig, LoggingConfig, PoolConfig, PoolExhaustionStrategy};

#[test]
fn disabled_logger_never_touches_the_pool_and_full_pool_drops_under_drop_policy() {
    let mut appenders = std::collections::HashMap::new();
    appenders.insert(
        "console".to_string(),
        AppenderConfig::Console {
            stderr: false,
            colored: false,
            level: None,
            encoding: swiftlog::appender::Encoding::Utf8,
        },
    );
    let mut loggers = std::collections::HashMap::new();
    loggers.insert(
        String::new(),
        LoggerConfig {
            level: swiftlog::Level::Warn,
            appenders: vec!["console".to_string()],
            pool_exhaustion_strategy: PoolExhaustionStrategy::DropLogMessage,
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
    let logger = swiftlog::get_logger("quiet");

    // Below the effective level: begin_record must short-circuit before
    // touching the pool at all.
    assert!(logger.begin_record(swiftlog::Level::Debug, Some("ignored")).is_none());

    // Exhaust the pool by holding builders open without submitting.
    let mut held = Vec::new();
    for _ in 0..2 {
        held.push(
            logger
                .begin_record(swiftlog::Level::Error, Some("held"))
                .expect("pool not yet exhausted"),
        );
    }
    assert!(
        logger.begin_record(swiftlog::Level::Error, Some("dropped")).is_none(),
        "third record should be dropped under DropLogMessage once the pool is exhausted"
    );

    drop(held);
    std::thread::sleep(Duration::from_millis(50));
    swiftlog::shutdown();
}
