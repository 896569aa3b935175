//! # Logger registry
//!
//! Hierarchical, named loggers in the spirit of a classic logging manager:
//! every logger has an optional level, a list of attached handlers and a flag
//! telling whether records are also handed to the parent's handlers. Names
//! are dot separated; the parent of `a.b.c` is the closest registered logger
//! among `a.b` and `a`, falling back to the root logger (empty name).
//!
//! [`LogBridge`] plugs a registry into the `log` facade so that
//! `log::info!` calls made anywhere in the process are dispatched through
//! it, using the record target (with `::` mapped to `.`) as logger name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use parking_lot::{Mutex, RwLock};

use crate::logging_config::bootstrap_logging;

/// Name of the root logger.
pub const ROOT_LOGGER: &str = "";

/// Level applied when no logger in the chain sets one.
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

// ================================================================================================
// RECORDS & HANDLERS
// ================================================================================================

/// Owned copy of a log record as delivered to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub logger: String,
    pub message: String,
}

impl LogRecord {
    pub fn new(level: Level, logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            logger: logger.into(),
            message: message.into(),
        }
    }
}

/// A sink attached to one or more loggers.
pub trait Handler: Send + Sync + fmt::Debug {
    fn publish(&self, record: &LogRecord);

    fn flush(&self) {}
}

/// Writes records to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleHandler;

impl Handler for ConsoleHandler {
    fn publish(&self, record: &LogRecord) {
        eprintln!("[{}] {}: {}", record.level, record.logger, record.message);
    }
}

/// Keeps every published record in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryHandler {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Handler for MemoryHandler {
    fn publish(&self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }
}

// ================================================================================================
// LOGGER
// ================================================================================================

/// A named logger handle owned by a [`LoggerRegistry`].
pub struct Logger {
    name: String,
    level: RwLock<Option<LevelFilter>>,
    use_parent_handlers: AtomicBool,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
}

impl Logger {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: RwLock::new(None),
            use_parent_handlers: AtomicBool::new(true),
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.name == ROOT_LOGGER
    }

    /// Level set on this logger, `None` when inherited.
    pub fn level(&self) -> Option<LevelFilter> {
        *self.level.read()
    }

    pub fn set_level(&self, level: Option<LevelFilter>) {
        *self.level.write() = level;
    }

    pub fn use_parent_handlers(&self) -> bool {
        self.use_parent_handlers.load(Ordering::Acquire)
    }

    pub fn set_use_parent_handlers(&self, enabled: bool) {
        self.use_parent_handlers.store(enabled, Ordering::Release);
    }

    /// Snapshot of the handlers attached directly to this logger.
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.handlers.read().clone()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        self.handlers.write().push(handler);
    }

    /// Detaches the given handler instance. Returns false if it was not attached.
    pub fn remove_handler(&self, handler: &Arc<dyn Handler>) -> bool {
        let mut handlers = self.handlers.write();
        match handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
            Some(index) => {
                handlers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear_handlers(&self) {
        self.handlers.write().clear();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("use_parent_handlers", &self.use_parent_handlers())
            .field("handlers", &self.handler_count())
            .finish()
    }
}

// ================================================================================================
// REGISTRY
// ================================================================================================

/// Registry of named loggers.
///
/// Loggers are created on first lookup and live as long as the registry.
/// Enumeration returns a snapshot, so loggers created concurrently with a
/// caller iterating the names are not part of that iteration.
#[derive(Debug)]
pub struct LoggerRegistry {
    loggers: RwLock<BTreeMap<String, Arc<Logger>>>,
}

impl LoggerRegistry {
    /// Creates a registry holding only the root logger.
    pub fn new() -> Self {
        let root = Logger::new(ROOT_LOGGER);
        root.set_level(Some(DEFAULT_LEVEL));
        let mut loggers = BTreeMap::new();
        loggers.insert(ROOT_LOGGER.to_string(), Arc::new(root));
        Self {
            loggers: RwLock::new(loggers),
        }
    }

    /// Process-wide registry, bootstrapped from the logging configuration
    /// on first use and never torn down.
    pub fn global() -> &'static Arc<LoggerRegistry> {
        static GLOBAL_LOGGERS: OnceLock<Arc<LoggerRegistry>> = OnceLock::new();
        GLOBAL_LOGGERS.get_or_init(|| {
            let registry = LoggerRegistry::new();
            bootstrap_logging(&registry);
            Arc::new(registry)
        })
    }

    pub fn root(&self) -> Arc<Logger> {
        self.logger(ROOT_LOGGER)
    }

    /// Returns the logger with this name, creating it if needed.
    pub fn logger(&self, name: &str) -> Arc<Logger> {
        if let Some(logger) = self.loggers.read().get(name) {
            return Arc::clone(logger);
        }
        let mut loggers = self.loggers.write();
        Arc::clone(
            loggers
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Logger::new(name))),
        )
    }

    /// Returns the logger with this name only if it is already registered.
    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers.read().get(name).cloned()
    }

    /// Names of all registered loggers, sorted.
    pub fn logger_names(&self) -> Vec<String> {
        self.loggers.read().keys().cloned().collect()
    }

    /// Closest registered ancestor of the named logger. The root has none.
    pub fn parent_of(&self, name: &str) -> Option<Arc<Logger>> {
        if name == ROOT_LOGGER {
            return None;
        }
        let loggers = self.loggers.read();
        let mut prefix = name;
        while let Some(index) = prefix.rfind('.') {
            prefix = &prefix[..index];
            if let Some(parent) = loggers.get(prefix) {
                return Some(Arc::clone(parent));
            }
        }
        loggers.get(ROOT_LOGGER).cloned()
    }

    /// First level set along the chain from `name` up to the root.
    pub fn effective_level(&self, name: &str) -> LevelFilter {
        if let Some(level) = self.get(name).and_then(|logger| logger.level()) {
            return level;
        }
        let mut current = self.parent_of(name);
        while let Some(logger) = current {
            if let Some(level) = logger.level() {
                return level;
            }
            current = self.parent_of(logger.name());
        }
        DEFAULT_LEVEL
    }

    pub fn is_enabled(&self, name: &str, level: Level) -> bool {
        level <= self.effective_level(name)
    }

    /// Dispatches a record to the handlers of its logger, then up the
    /// parent chain until a logger stops delegating.
    pub fn publish(&self, record: &LogRecord) {
        if !self.is_enabled(&record.logger, record.level) {
            return;
        }
        let mut current = Some(self.logger(&record.logger));
        while let Some(logger) = current {
            for handler in logger.handlers() {
                handler.publish(record);
            }
            if !logger.use_parent_handlers() {
                break;
            }
            current = self.parent_of(logger.name());
        }
    }

    pub fn flush(&self) {
        let loggers: Vec<Arc<Logger>> = self.loggers.read().values().cloned().collect();
        for logger in loggers {
            for handler in logger.handlers() {
                handler.flush();
            }
        }
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a `log` target (`crate::module`) to a registry logger name (`crate.module`).
pub fn logger_name_for_target(target: &str) -> String {
    target.replace("::", ".")
}

// ================================================================================================
// LOG FACADE BRIDGE
// ================================================================================================

/// `log::Log` implementation backed by a [`LoggerRegistry`].
#[derive(Debug, Clone)]
pub struct LogBridge {
    registry: Arc<LoggerRegistry>,
}

impl LogBridge {
    pub fn new(registry: Arc<LoggerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<LoggerRegistry> {
        &self.registry
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.registry
            .is_enabled(&logger_name_for_target(metadata.target()), metadata.level())
    }

    fn log(&self, record: &Record<'_>) {
        let name = logger_name_for_target(record.target());
        if !self.registry.is_enabled(&name, record.level()) {
            return;
        }
        self.registry.publish(&LogRecord::new(
            record.level(),
            name,
            record.args().to_string(),
        ));
    }

    fn flush(&self) {
        self.registry.flush();
    }
}

/// Installs the process-wide registry as the `log` facade's logger.
///
/// Fails if another logger was installed first.
pub fn install_log_bridge() -> Result<(), SetLoggerError> {
    let bridge = LogBridge::new(Arc::clone(LoggerRegistry::global()));
    log::set_boxed_logger(Box::new(bridge))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}
