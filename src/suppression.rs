// Silences this framework's own loggers.
//
// Only loggers registered at call time are affected. A framework logger
// created afterwards keeps delegating to its parents until muted again;
// callers that need a hard guarantee must serialize muting with logger
// creation themselves.

use log::Level;

use crate::logging::{Logger, LoggerRegistry};

/// Logger name prefix reserved for this framework.
pub const FRAMEWORK_NAMESPACE: &str = "rule_introspect";

/// Mutes every logger in `registry` whose name starts with the framework
/// namespace: parent delegation is turned off and all attached handlers are
/// detached. Levels are left untouched.
pub fn mute_loggers(registry: &LoggerRegistry) {
    for name in registry.logger_names() {
        if name.starts_with(FRAMEWORK_NAMESPACE) {
            if let Some(logger) = registry.get(&name) {
                mute_logger(&logger);
            }
        }
    }
}

/// Mutes the framework loggers of the process-wide registry.
pub fn mute_all() {
    mute_loggers(LoggerRegistry::global());
}

/// Whether a record from the named logger would reach any handler.
///
/// A name that is not registered yet is judged by its closest registered
/// ancestor, which is where its records would go.
pub fn is_muted(registry: &LoggerRegistry, name: &str) -> bool {
    if !registry.is_enabled(name, Level::Error) {
        return true;
    }
    let mut current = registry.get(name).or_else(|| registry.parent_of(name));
    while let Some(logger) = current {
        if logger.handler_count() > 0 {
            return false;
        }
        if !logger.use_parent_handlers() {
            return true;
        }
        current = registry.parent_of(logger.name());
    }
    true
}

fn mute_logger(logger: &Logger) {
    logger.set_use_parent_handlers(false);
    for handler in logger.handlers() {
        logger.remove_handler(&handler);
    }
}
