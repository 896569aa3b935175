// Fallback values used by the engine when a rule or engine omits
// explicit configuration.

/// Default rule name.
pub const DEFAULT_RULE_NAME: &str = "rule";

/// Default engine name.
pub const DEFAULT_ENGINE_NAME: &str = "engine";

/// Default rule description.
pub const DEFAULT_RULE_DESCRIPTION: &str = "description";

/// Default rule priority (lowest precedence).
pub const DEFAULT_RULE_PRIORITY: i32 = i32::MAX - 1;

/// Default rule priority threshold (fire everything).
pub const DEFAULT_RULE_PRIORITY_THRESHOLD: i32 = i32::MAX;
