// Rule and engine settings with fallback to the crate defaults.
//
// Rule settings come from the `Rule` marker, attached directly or through a
// marker type meta-marked with it. Engine settings are plain configuration,
// loadable from JSON.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_ENGINE_NAME, DEFAULT_RULE_DESCRIPTION, DEFAULT_RULE_NAME, DEFAULT_RULE_PRIORITY,
    DEFAULT_RULE_PRIORITY_THRESHOLD,
};
use crate::error::Result;
use crate::interfaces::Introspect;
use crate::logging::LoggerRegistry;
use crate::marker::find_marker;
use crate::suppression::mute_loggers;
use crate::type_registry::{TypeKey, TypeRegistry};
use crate::validation::parse_json_object;

/// Name, description and priority of a registered rule type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSettings {
    pub name: String,
    pub description: String,
    pub priority: i32,
}

impl RuleSettings {
    /// Reads the `Rule` marker of `rule_type`. Missing, empty or out of
    /// range attributes fall back to the defaults.
    pub fn resolve(registry: &TypeRegistry, rule_type: &TypeKey) -> Result<Self> {
        let marker = find_marker(registry, &TypeKey::rule_marker(), rule_type)?;
        if marker.is_none() {
            debug!("Rule type {} carries no rule marker, using defaults", rule_type);
        }

        let name = marker
            .and_then(|m| m.text("name"))
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_RULE_NAME);
        let description = marker
            .and_then(|m| m.text("description"))
            .filter(|description| !description.is_empty())
            .unwrap_or(DEFAULT_RULE_DESCRIPTION);
        let priority = marker
            .and_then(|m| m.int("priority"))
            .and_then(|priority| i32::try_from(priority).ok())
            .unwrap_or(DEFAULT_RULE_PRIORITY);

        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            priority,
        })
    }

    /// [`RuleSettings::resolve`] for a rule object.
    pub fn for_rule<R: Introspect + ?Sized>(registry: &TypeRegistry, rule: &R) -> Result<Self> {
        Self::resolve(registry, &rule.type_key())
    }
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_RULE_NAME.to_string(),
            description: DEFAULT_RULE_DESCRIPTION.to_string(),
            priority: DEFAULT_RULE_PRIORITY,
        }
    }
}

/// Engine level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub name: String,
    /// Rules with a priority above this are not fired
    pub rule_priority_threshold: i32,
    pub skip_on_first_applied_rule: bool,
    pub skip_on_first_failed_rule: bool,
    /// Mute the framework's loggers
    pub silent_mode: bool,
}

impl EngineSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        parse_json_object(json)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn priority_threshold(mut self, threshold: i32) -> Self {
        self.rule_priority_threshold = threshold;
        self
    }

    pub fn skip_on_first_applied_rule(mut self, skip: bool) -> Self {
        self.skip_on_first_applied_rule = skip;
        self
    }

    pub fn skip_on_first_failed_rule(mut self, skip: bool) -> Self {
        self.skip_on_first_failed_rule = skip;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent_mode = silent;
        self
    }

    /// Whether a rule with this priority is eligible to fire.
    pub fn accepts_priority(&self, priority: i32) -> bool {
        priority <= self.rule_priority_threshold
    }

    /// Mutes the framework loggers of `registry` when silent mode is on.
    pub fn apply_logging(&self, registry: &LoggerRegistry) {
        if self.silent_mode {
            mute_loggers(registry);
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_ENGINE_NAME.to_string(),
            rule_priority_threshold: DEFAULT_RULE_PRIORITY_THRESHOLD,
            skip_on_first_applied_rule: false,
            skip_on_first_failed_rule: false,
            silent_mode: false,
        }
    }
}
