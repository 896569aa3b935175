// Declarative markers attached to registered types, and their resolution.
//
// A marker is a typed bag of attribute values. Marker types are themselves
// registered types, so a marker type can carry markers of its own
// (meta-markers). Resolution follows exactly one level of that indirection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::type_registry::{TypeKey, TypeRegistry};
use crate::validation::check_not_null;

/// A single marker attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<bool> for MarkerValue {
    fn from(value: bool) -> Self {
        MarkerValue::Bool(value)
    }
}

impl From<i64> for MarkerValue {
    fn from(value: i64) -> Self {
        MarkerValue::Int(value)
    }
}

impl From<i32> for MarkerValue {
    fn from(value: i32) -> Self {
        MarkerValue::Int(i64::from(value))
    }
}

impl From<&str> for MarkerValue {
    fn from(value: &str) -> Self {
        MarkerValue::Text(value.to_string())
    }
}

impl From<String> for MarkerValue {
    fn from(value: String) -> Self {
        MarkerValue::Text(value)
    }
}

impl std::fmt::Display for MarkerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerValue::Bool(b) => write!(f, "{}", b),
            MarkerValue::Int(i) => write!(f, "{}", i),
            MarkerValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Marker instance attached to a type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    marker_type: TypeKey,
    #[serde(default)]
    attributes: BTreeMap<String, MarkerValue>,
}

impl Marker {
    pub fn new(marker_type: impl Into<TypeKey>) -> Self {
        Self {
            marker_type: marker_type.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Sets an attribute value
    pub fn with(mut self, name: impl Into<String>, value: impl Into<MarkerValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn marker_type(&self) -> &TypeKey {
        &self.marker_type
    }

    pub fn attributes(&self) -> &BTreeMap<String, MarkerValue> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&MarkerValue> {
        self.attributes.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.attributes.get(name) {
            Some(MarkerValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.attributes.get(name) {
            Some(MarkerValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.attributes.get(name) {
            Some(MarkerValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

/// Resolves a marker of type `target` on `annotated`.
///
/// A marker attached directly to `annotated` wins. Otherwise the markers
/// attached to `annotated` are scanned in declaration order and the first
/// whose own type directly carries a `target` marker supplies the result.
/// Chains deeper than one meta-marker are not followed.
///
/// # Errors
/// `InvalidArgument` if either type is not registered.
pub fn find_marker<'a>(
    registry: &'a TypeRegistry,
    target: &TypeKey,
    annotated: &TypeKey,
) -> Result<Option<&'a Marker>> {
    let target = check_not_null(registry.get(target), "target marker")?.key();
    let annotated = check_not_null(registry.get(annotated), "annotated type")?;

    if let Some(marker) = annotated.direct_marker(target) {
        return Ok(Some(marker));
    }

    let meta = annotated
        .markers()
        .iter()
        .filter_map(|marker| registry.get(marker.marker_type()))
        .find_map(|marker_type| marker_type.direct_marker(target));

    Ok(meta)
}

/// Whether [`find_marker`] resolves anything.
pub fn is_marker_present(
    registry: &TypeRegistry,
    target: &TypeKey,
    annotated: &TypeKey,
) -> Result<bool> {
    Ok(find_marker(registry, target, annotated)?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;
    use crate::type_registry::TypeDescriptor;

    fn trigger_registry() -> TypeRegistry {
        TypeRegistry::new()
            .with(TypeDescriptor::marker("ActionTrigger"))
            .with(
                TypeDescriptor::marker("ConditionMarker")
                    .marked(Marker::new("ActionTrigger").with("phase", "after")),
            )
            .with(TypeDescriptor::class("MyRule").marked(Marker::new("ConditionMarker")))
    }

    #[test]
    fn direct_marker_is_returned_as_is() {
        let registry = TypeRegistry::new()
            .with(TypeDescriptor::marker("Priority"))
            .with(TypeDescriptor::class("R").marked(Marker::new("Priority").with("value", 1)));

        let found = find_marker(&registry, &"Priority".into(), &"R".into())
            .unwrap()
            .unwrap();
        let attached = &registry.get(&"R".into()).unwrap().markers()[0];
        assert!(std::ptr::eq(found, attached));
        assert_eq!(found.int("value"), Some(1));
    }

    #[test]
    fn meta_marker_is_resolved_through_marker_type() {
        let registry = trigger_registry();

        let found = find_marker(&registry, &"ActionTrigger".into(), &"MyRule".into())
            .unwrap()
            .unwrap();
        let on_condition = &registry.get(&"ConditionMarker".into()).unwrap().markers()[0];
        assert!(std::ptr::eq(found, on_condition));
        assert_eq!(found.text("phase"), Some("after"));
    }

    #[test]
    fn direct_marker_takes_precedence_over_meta_marker() {
        let registry = trigger_registry().with(
            TypeDescriptor::class("Both")
                .marked(Marker::new("ConditionMarker"))
                .marked(Marker::new("ActionTrigger").with("phase", "direct")),
        );

        let found = find_marker(&registry, &"ActionTrigger".into(), &"Both".into())
            .unwrap()
            .unwrap();
        assert_eq!(found.text("phase"), Some("direct"));
    }

    #[test]
    fn first_meta_marker_in_declaration_order_wins() {
        let registry = TypeRegistry::new()
            .with(TypeDescriptor::marker("Target"))
            .with(TypeDescriptor::marker("A").marked(Marker::new("Target").with("from", "a")))
            .with(TypeDescriptor::marker("B").marked(Marker::new("Target").with("from", "b")))
            .with(
                TypeDescriptor::class("R")
                    .marked(Marker::new("B"))
                    .marked(Marker::new("A")),
            );

        let found = find_marker(&registry, &"Target".into(), &"R".into())
            .unwrap()
            .unwrap();
        assert_eq!(found.text("from"), Some("b"));
    }

    #[test]
    fn only_one_level_of_indirection_is_followed() {
        let registry = TypeRegistry::new()
            .with(TypeDescriptor::marker("Deep"))
            .with(TypeDescriptor::marker("Middle").marked(Marker::new("Deep")))
            .with(TypeDescriptor::marker("Outer").marked(Marker::new("Middle")))
            .with(TypeDescriptor::class("R").marked(Marker::new("Outer")));

        assert!(is_marker_present(&registry, &"Middle".into(), &"R".into()).unwrap());
        assert!(!is_marker_present(&registry, &"Deep".into(), &"R".into()).unwrap());
    }

    #[test]
    fn absent_marker_resolves_to_none() {
        let registry = trigger_registry().with(TypeDescriptor::class("Plain"));

        assert!(find_marker(&registry, &"ActionTrigger".into(), &"Plain".into())
            .unwrap()
            .is_none());
        assert!(!is_marker_present(&registry, &"ActionTrigger".into(), &"Plain".into()).unwrap());
    }

    #[test]
    fn unregistered_marker_types_are_skipped_during_meta_scan() {
        let registry = trigger_registry().with(
            TypeDescriptor::class("Mixed")
                .marked(Marker::new("Unknown"))
                .marked(Marker::new("ConditionMarker")),
        );

        assert!(is_marker_present(&registry, &"ActionTrigger".into(), &"Mixed".into()).unwrap());
    }

    #[test]
    fn unregistered_arguments_are_rejected() {
        let registry = trigger_registry();

        let err = find_marker(&registry, &"Missing".into(), &"MyRule".into()).unwrap_err();
        assert!(matches!(err, RuleError::InvalidArgument(_)));
        assert_eq!(err.to_string(), "The target marker must not be null");

        let err = is_marker_present(&registry, &"ActionTrigger".into(), &"Missing".into())
            .unwrap_err();
        assert_eq!(err.to_string(), "The annotated type must not be null");
    }

    #[test]
    fn typed_attribute_accessors_check_variant() {
        let marker = Marker::new("Rule")
            .with("name", "r")
            .with("priority", 7)
            .with("enabled", true);

        assert_eq!(marker.text("name"), Some("r"));
        assert_eq!(marker.int("priority"), Some(7));
        assert_eq!(marker.bool("enabled"), Some(true));
        assert_eq!(marker.int("name"), None);
        assert_eq!(marker.attribute("priority").unwrap().to_string(), "7");
    }
}
