//! Hierarchical, read-copy-update resolver mapping dotted logger names to
//! their effective level, appender set, and pool-exhaustion strategy.
//!
//! Grounded on the teacher's `sync::rwlock`/`sync::mutex` RAII-guard idiom,
//! generalized from a single shared value to a whole swappable tree: readers
//! take a cheap `Arc` clone of the current root under a short-lived read
//! lock and then walk it lock-free, while a reconfiguration builds an
//! entirely new tree and swaps the root pointer in one short write-locked
//! step, matching §4.6's "atomically swap the root pointer" requirement.

use std::sync::Arc;
use std::time::Duration;

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};

use crate::appender::{Appender, ConsoleAppender, Encoding, GuardedAppender, RollingFileAppender, UdpAppender};
use crate::appender::console::Stream;
use crate::config::{AppenderConfig, LoggingConfig, PoolExhaustionStrategy};
use crate::error::{LogError, Result};
use crate::level::Level;

/// A shared, guarded appender instance, reachable from every logger config
/// that names it.
pub type SharedAppender = Arc<Mutex<GuardedAppender>>;

/// The effective configuration at one resolver node.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub level: Level,
    pub appenders: Arc<Vec<SharedAppender>>,
    pub pool_exhaustion_strategy: PoolExhaustionStrategy,
}

#[derive(Clone, Debug)]
struct Node {
    config: ResolvedConfig,
    children: HashMap<String, Arc<Node>>,
}

/// Read-copy-update trie over dotted logger names.
///
/// Built once from a [`LoggingConfig`] by [`Resolver::build`], then swapped
/// wholesale on reconfiguration via [`Resolver::swap`].
#[derive(Debug)]
pub struct Resolver {
    root: RwLock<Arc<Node>>,
}

impl Resolver {
    /// Builds a resolver tree from configuration. Appenders named by a
    /// [`crate::config::LoggerConfig`] but never defined in
    /// `config.appenders` produce a [`LogError::Configuration`].
    pub fn build(config: &LoggingConfig) -> Result<Self> {
        let root = build_tree(config)?;
        Ok(Resolver {
            root: RwLock::new(Arc::new(root)),
        })
    }

    /// Looks up the effective configuration for `logger_name`, following the
    /// longest matching dotted-segment prefix.
    pub fn resolve(&self, logger_name: &str) -> ResolvedConfig {
        let root = self.root.read().clone();
        let mut node = &root;
        let mut best = node.config.clone();
        if !logger_name.is_empty() {
            for segment in logger_name.split('.') {
                match node.children.get(segment) {
                    Some(child) => {
                        node = child;
                        best = node.config.clone();
                    }
                    None => break,
                }
            }
        }
        best
    }

    /// Atomically replaces the tree with one built from a new configuration.
    /// Appenders reachable only from the old tree are closed after the swap
    /// completes, once no new lookups can observe them.
    pub fn swap(&self, config: &LoggingConfig) -> Result<()> {
        let new_root = Arc::new(build_tree(config)?);
        let old_root = {
            let mut guard = self.root.write();
            std::mem::replace(&mut *guard, new_root)
        };
        close_unreachable(&old_root, &self.root.read());
        Ok(())
    }
}

fn close_unreachable(old: &Arc<Node>, _new: &Arc<Node>) {
    // Every appender is reference-counted (`SharedAppender`); once the old
    // tree's `Arc<Node>` is dropped here, any appender not also referenced
    // by the new tree drops to zero and its `GuardedAppender` is freed. We
    // additionally call `close` eagerly on everything the old tree reaches
    // so file handles and sockets release deterministically rather than
    // waiting on `Drop` for the remaining live clones held by in-flight work.
    let mut seen = HashMap::new();
    collect_appenders(old, &mut seen);
    for appender in seen.into_values() {
        let mut guard = appender.lock();
        let _ = guard.close();
    }
}

fn collect_appenders(node: &Arc<Node>, out: &mut HashMap<usize, SharedAppender>) {
    for appender in node.config.appenders.iter() {
        out.insert(Arc::as_ptr(appender) as usize, appender.clone());
    }
    for child in node.children.values() {
        collect_appenders(child, out);
    }
}

fn build_tree(config: &LoggingConfig) -> Result<Node> {
    let shared_appenders = build_shared_appenders(config);

    let root_config = config.loggers.get("").cloned().unwrap_or_default();
    let mut root = Node {
        config: ResolvedConfig {
            level: root_config.level,
            appenders: Arc::new(resolve_appender_list(
                &root_config.appenders,
                &shared_appenders,
                "",
            )?),
            pool_exhaustion_strategy: root_config.pool_exhaustion_strategy,
        },
        children: HashMap::new(),
    };

    let mut names: Vec<&String> = config.loggers.keys().filter(|k| !k.is_empty()).collect();
    names.sort();

    for name in names {
        let logger_config = &config.loggers[name];
        let defined = resolve_appender_list(&logger_config.appenders, &shared_appenders, name)?;

        let segments: Vec<&str> = name.split('.').collect();
        let mut node = &mut root;
        for (i, segment) in segments.iter().enumerate() {
            node = descend(&mut node.children, segment, &node.config);
            if i == segments.len() - 1 {
                let appenders = if logger_config.include_parent_appenders {
                    let mut combined = (*node.config.appenders).clone();
                    combined.extend(defined.iter().cloned());
                    combined
                } else {
                    defined.clone()
                };
                node.config = ResolvedConfig {
                    level: logger_config.level,
                    appenders: Arc::new(dedup_by_ptr(appenders)),
                    pool_exhaustion_strategy: logger_config.pool_exhaustion_strategy,
                };
            }
        }
    }

    Ok(root)
}

/// Finds (creating if absent) the child node for `segment`, seeding a newly
/// created child with the parent's current config so intermediate nodes on
/// the path to a deeper logger inherit sensibly.
fn descend<'a>(
    children: &'a mut HashMap<String, Arc<Node>>,
    segment: &str,
    parent_config: &ResolvedConfig,
) -> &'a mut Node {
    let entry = children
        .entry(segment.to_string())
        .or_insert_with(|| {
            Arc::new(Node {
                config: parent_config.clone(),
                children: HashMap::new(),
            })
        });
    Arc::make_mut(entry)
}

fn dedup_by_ptr(appenders: Vec<SharedAppender>) -> Vec<SharedAppender> {
    let mut seen = std::collections::HashSet::new();
    appenders
        .into_iter()
        .filter(|a| seen.insert(Arc::as_ptr(a) as usize))
        .collect()
}

fn resolve_appender_list(
    names: &[String],
    shared: &HashMap<String, SharedAppender>,
    logger_name: &str,
) -> Result<Vec<SharedAppender>> {
    names
        .iter()
        .map(|name| {
            shared
                .get(name)
                .cloned()
                .ok_or_else(|| LogError::Configuration {
                    logger: logger_name.to_string(),
                    appender: name.clone(),
                })
        })
        .collect()
}

fn build_shared_appenders(config: &LoggingConfig) -> HashMap<String, SharedAppender> {
    let mut built = HashMap::new();
    for (name, appender_config) in &config.appenders {
        if let Some(mut appender) = instantiate(name, appender_config) {
            let encoding = encoding_of(appender_config);
            if let Err(err) = appender.set_encoding(encoding) {
                tracing::error!(appender = name, error = %err, "failed to set initial appender encoding");
            }
            built.insert(
                name.clone(),
                Arc::new(Mutex::new(
                    GuardedAppender::new(name.clone(), appender, config.appender_quarantine_delay)
                        .with_min_level(level_floor(appender_config)),
                )),
            );
        }
    }
    built
}

fn level_floor(config: &AppenderConfig) -> Option<Level> {
    match config {
        AppenderConfig::Console { level, .. } => *level,
        AppenderConfig::RollingFile { level, .. } => *level,
        AppenderConfig::Udp { level, .. } => *level,
    }
}

fn encoding_of(config: &AppenderConfig) -> Encoding {
    match config {
        AppenderConfig::Console { encoding, .. } => *encoding,
        AppenderConfig::RollingFile { encoding, .. } => *encoding,
        AppenderConfig::Udp { encoding, .. } => *encoding,
    }
}

fn instantiate(name: &str, config: &AppenderConfig) -> Option<Box<dyn Appender>> {
    match config {
        AppenderConfig::Console { stderr, colored, .. } => {
            let stream = if *stderr { Stream::Stderr } else { Stream::Stdout };
            Some(Box::new(ConsoleAppender::new(stream, *colored)))
        }
        AppenderConfig::RollingFile {
            path,
            max_bytes,
            max_backups,
            ..
        } => RollingFileAppender::open(path, *max_bytes, *max_backups)
            .map(|a| Box::new(a) as Box<dyn Appender>)
            .map_err(|err| {
                tracing::error!(appender = name, error = %err, "failed to open rolling file appender");
            })
            .ok(),
        AppenderConfig::Udp { address, .. } => UdpAppender::connect(address)
            .map(|a| Box::new(a) as Box<dyn Appender>)
            .map_err(|err| {
                tracing::error!(appender = name, error = %err, "failed to connect udp appender");
            })
            .ok(),
    }
}

/// Default idle quarantine delay used by tests and the default configuration.
pub const DEFAULT_QUARANTINE_DELAY: Duration = crate::config::DEFAULT_QUARANTINE_DELAY;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerConfig;
    use std::collections::HashMap as StdHashMap;

    fn config_with(loggers: StdHashMap<String, LoggerConfig>) -> LoggingConfig {
        let mut appenders = StdHashMap::new();
        appenders.insert(
            "console".to_string(),
            AppenderConfig::Console {
                stderr: false,
                colored: false,
                level: None,
                encoding: Encoding::default(),
            },
        );
        appenders.insert(
            "aux".to_string(),
            AppenderConfig::Console {
                stderr: true,
                colored: false,
                level: None,
                encoding: Encoding::default(),
            },
        );
        LoggingConfig {
            pool: Default::default(),
            null_display_string: "null".to_string(),
            truncated_message_suffix: " [TRUNCATED]".to_string(),
            appender_quarantine_delay: Duration::from_secs(15),
            auto_register_enums: false,
            appenders,
            loggers,
        }
    }

    #[test]
    fn resolves_longest_matching_prefix() {
        let mut loggers = StdHashMap::new();
        loggers.insert(
            String::new(),
            LoggerConfig {
                level: Level::Warn,
                appenders: vec!["console".to_string()],
                include_parent_appenders: true,
                pool_exhaustion_strategy: PoolExhaustionStrategy::default(),
            },
        );
        loggers.insert(
            "app".to_string(),
            LoggerConfig {
                level: Level::Debug,
                appenders: vec![],
                include_parent_appenders: true,
                pool_exhaustion_strategy: PoolExhaustionStrategy::default(),
            },
        );
        let resolver = Resolver::build(&config_with(loggers)).unwrap();

        assert_eq!(resolver.resolve("app.db.pool").level, Level::Debug);
        assert_eq!(resolver.resolve("other").level, Level::Warn);
    }

    #[test]
    fn include_parent_appenders_unions_sets() {
        let mut loggers = StdHashMap::new();
        loggers.insert(
            String::new(),
            LoggerConfig {
                level: Level::Info,
                appenders: vec!["console".to_string()],
                include_parent_appenders: true,
                pool_exhaustion_strategy: PoolExhaustionStrategy::default(),
            },
        );
        loggers.insert(
            "app".to_string(),
            LoggerConfig {
                level: Level::Info,
                appenders: vec!["aux".to_string()],
                include_parent_appenders: true,
                pool_exhaustion_strategy: PoolExhaustionStrategy::default(),
            },
        );
        let resolver = Resolver::build(&config_with(loggers)).unwrap();
        assert_eq!(resolver.resolve("app").appenders.len(), 2);
    }

    #[test]
    fn excludes_parent_appenders_when_configured() {
        let mut loggers = StdHashMap::new();
        loggers.insert(
            String::new(),
            LoggerConfig {
                level: Level::Info,
                appenders: vec!["console".to_string()],
                include_parent_appenders: true,
                pool_exhaustion_strategy: PoolExhaustionStrategy::default(),
            },
        );
        loggers.insert(
            "app".to_string(),
            LoggerConfig {
                level: Level::Info,
                appenders: vec!["aux".to_string()],
                include_parent_appenders: false,
                pool_exhaustion_strategy: PoolExhaustionStrategy::default(),
            },
        );
        let resolver = Resolver::build(&config_with(loggers)).unwrap();
        assert_eq!(resolver.resolve("app").appenders.len(), 1);
    }

    #[test]
    fn unknown_appender_reference_is_a_configuration_error() {
        let mut loggers = StdHashMap::new();
        loggers.insert(
            "app".to_string(),
            LoggerConfig {
                level: Level::Info,
                appenders: vec!["missing".to_string()],
                include_parent_appenders: true,
                pool_exhaustion_strategy: PoolExhaustionStrategy::default(),
            },
        );
        let err = Resolver::build(&config_with(loggers)).unwrap_err();
        assert!(matches!(err, LogError::Configuration { .. }));
    }
}
