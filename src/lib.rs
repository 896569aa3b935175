//! # Rule Introspection Library
//!
//! Introspection and bootstrap support for a declarative rule engine:
//! capability interface discovery over registered ancestor chains, marker
//! resolution with one level of meta-markers, default rule/engine settings
//! and muting of the framework's own loggers.

pub mod defaults;
pub mod error;
pub mod interfaces;
pub mod logging;
pub mod logging_config;
pub mod marker;
pub mod settings;
pub mod suppression;
pub mod type_registry;
pub mod validation;

pub use defaults::{
    DEFAULT_ENGINE_NAME, DEFAULT_RULE_DESCRIPTION, DEFAULT_RULE_NAME, DEFAULT_RULE_PRIORITY,
    DEFAULT_RULE_PRIORITY_THRESHOLD,
};

pub use error::{Result, RuleError};

pub use interfaces::{
    collect_interfaces,     // Interfaces along the ancestor chain
    implements,             // Membership check over the collected list
    Introspect,             // Rule object -> descriptor key
};

pub use logging::{
    install_log_bridge,     // Route the log facade through the global registry
    ConsoleHandler,         // stderr sink
    Handler,                // Handler trait
    LogBridge,              // log::Log adapter
    LogRecord,              // Record delivered to handlers
    Logger,                 // Named logger handle
    LoggerRegistry,         // Named logger registry
    MemoryHandler,          // In-memory sink
};

pub use logging_config::{bootstrap_logging, LoggerConfig, LoggingConfig, LOG_CONFIG_ENV};

pub use marker::{find_marker, is_marker_present, Marker, MarkerValue};

pub use settings::{EngineSettings, RuleSettings};

pub use suppression::{is_muted, mute_all, mute_loggers, FRAMEWORK_NAMESPACE};

pub use type_registry::{TypeDescriptor, TypeKey, TypeKind, TypeRegistry};

pub use validation::check_not_null;
