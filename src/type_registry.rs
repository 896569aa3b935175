// Self-describing type registry for rules, interfaces and markers.
//
// Rust has no runtime reflection over ancestor chains or attached
// annotations, so every rule type, capability interface and marker type
// registers a small descriptor here at initialization time. The interface
// collector and the marker resolver only ever read these descriptors.
//
// Architecture:
// - TypeKey: Stable name of a registered type
// - TypeDescriptor: Ancestor link, declared interfaces, attached markers
// - TypeRegistry: Key -> descriptor map, immutable once built
// - global(): Process-wide registry behind a RwLock

use std::collections::HashMap;
use std::sync::OnceLock;

use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};
use crate::marker::Marker;

// ============================================================================
// Type Keys
// ============================================================================

/// Unique name of a registered type.
///
/// Keys built with [`TypeKey::of`] use `std::any::type_name`, which is a
/// best-effort description and not guaranteed unique; types whose names may
/// clash should be registered under explicit string keys instead. Keys built
/// from strings also let marker types and interfaces exist without a backing
/// Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeKey(String);

impl TypeKey {
    /// Name of the terminal ancestor every class descends from.
    pub const ROOT: &'static str = "root";

    /// Name of the built-in marker carrying rule name, description and priority.
    pub const RULE_MARKER: &'static str = "Rule";

    pub fn new(name: impl Into<String>) -> Self {
        TypeKey(name.into())
    }

    /// Key derived from a Rust type.
    pub fn of<T: ?Sized>() -> Self {
        TypeKey(std::any::type_name::<T>().to_string())
    }

    pub fn root() -> Self {
        TypeKey::new(Self::ROOT)
    }

    pub fn rule_marker() -> Self {
        TypeKey::new(Self::RULE_MARKER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }
}

impl From<&str> for TypeKey {
    fn from(s: &str) -> Self {
        TypeKey(s.to_string())
    }
}

impl From<String> for TypeKey {
    fn from(s: String) -> Self {
        TypeKey(s)
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// What a registered type is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Concrete or base rule type, part of an ancestor chain
    Class,
    /// Capability interface a class may declare
    Interface,
    /// Marker type that can be attached to other types
    Marker,
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeKind::Class => write!(f, "class"),
            TypeKind::Interface => write!(f, "interface"),
            TypeKind::Marker => write!(f, "marker"),
        }
    }
}

/// Descriptor registered for a single type.
///
/// Interfaces and markers keep their declaration order; the resolver scans
/// markers in exactly this order, which makes meta-marker resolution
/// deterministic.
///
/// When deserialized, a class without an `ancestor` field extends the root,
/// like [`TypeDescriptor::class`]; only an explicit `"ancestor": null` makes
/// it a terminal type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DescriptorRecord")]
pub struct TypeDescriptor {
    key: TypeKey,
    kind: TypeKind,
    ancestor: Option<TypeKey>,
    interfaces: Vec<TypeKey>,
    markers: Vec<Marker>,
}

/// Wire form of a descriptor, keeping a missing ancestor apart from a null one.
#[derive(Deserialize)]
struct DescriptorRecord {
    key: TypeKey,
    kind: TypeKind,
    #[serde(default, deserialize_with = "present")]
    ancestor: Option<Option<TypeKey>>,
    #[serde(default)]
    interfaces: Vec<TypeKey>,
    #[serde(default)]
    markers: Vec<Marker>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<TypeKey>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<TypeKey>::deserialize(deserializer).map(Some)
}

impl From<DescriptorRecord> for TypeDescriptor {
    fn from(record: DescriptorRecord) -> Self {
        let ancestor = match record.ancestor {
            Some(explicit) => explicit,
            None if record.kind == TypeKind::Class && !record.key.is_root() => {
                Some(TypeKey::root())
            }
            None => None,
        };
        Self {
            key: record.key,
            kind: record.kind,
            ancestor,
            interfaces: record.interfaces,
            markers: record.markers,
        }
    }
}

impl TypeDescriptor {
    /// Class descriptor extending the root ancestor.
    pub fn class(key: impl Into<TypeKey>) -> Self {
        Self {
            key: key.into(),
            kind: TypeKind::Class,
            ancestor: Some(TypeKey::root()),
            interfaces: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Class descriptor keyed by a Rust type.
    pub fn of<T: ?Sized>() -> Self {
        Self::class(TypeKey::of::<T>())
    }

    /// Interface descriptor. Interfaces have no ancestor.
    pub fn interface(key: impl Into<TypeKey>) -> Self {
        Self {
            key: key.into(),
            kind: TypeKind::Interface,
            ancestor: None,
            interfaces: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Marker type descriptor. Marker types have no ancestor.
    pub fn marker(key: impl Into<TypeKey>) -> Self {
        Self {
            key: key.into(),
            kind: TypeKind::Marker,
            ancestor: None,
            interfaces: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// The terminal ancestor of every class.
    pub fn root() -> Self {
        Self::class(TypeKey::root()).without_ancestor()
    }

    /// Sets the immediate ancestor
    pub fn extends(mut self, ancestor: impl Into<TypeKey>) -> Self {
        self.ancestor = Some(ancestor.into());
        self
    }

    /// Makes this type a terminal ancestor
    pub fn without_ancestor(mut self) -> Self {
        self.ancestor = None;
        self
    }

    /// Declares a capability interface, appended after those already declared
    pub fn implements(mut self, interface: impl Into<TypeKey>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Attaches a marker, appended after those already attached
    pub fn marked(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn ancestor(&self) -> Option<&TypeKey> {
        self.ancestor.as_ref()
    }

    /// Interfaces declared directly on this type, in declared order.
    pub fn interfaces(&self) -> &[TypeKey] {
        &self.interfaces
    }

    /// Markers attached directly to this type, in declared order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// First marker of the given type attached directly to this type.
    pub fn direct_marker(&self, marker_type: &TypeKey) -> Option<&Marker> {
        self.markers
            .iter()
            .find(|marker| marker.marker_type() == marker_type)
    }

    pub fn has_direct_marker(&self, marker_type: &TypeKey) -> bool {
        self.direct_marker(marker_type).is_some()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Catalog of registered type descriptors.
///
/// A fresh registry already knows the root ancestor and the built-in rule
/// marker type.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    descriptors: HashMap<TypeKey, TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            descriptors: HashMap::new(),
        };
        registry.register(TypeDescriptor::root());
        registry.register(TypeDescriptor::marker(TypeKey::rule_marker()));
        registry
    }

    /// Registers a descriptor, returning the one it replaced if any.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Option<TypeDescriptor> {
        debug!(
            "Registering {} descriptor {} ({} interfaces, {} markers)",
            descriptor.kind(),
            descriptor.key(),
            descriptor.interfaces().len(),
            descriptor.markers().len()
        );
        self.descriptors.insert(descriptor.key.clone(), descriptor)
    }

    /// Chaining form of [`TypeRegistry::register`].
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn get(&self, key: &TypeKey) -> Option<&TypeDescriptor> {
        self.descriptors.get(key)
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.descriptors.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&TypeKey> {
        let mut keys: Vec<&TypeKey> = self.descriptors.keys().collect();
        keys.sort();
        keys
    }

    /// Builds a registry from a JSON array of descriptors.
    pub fn from_json(json: &str) -> Result<Self> {
        let descriptors: Vec<TypeDescriptor> =
            serde_json::from_str(json).map_err(|e| RuleError::ConfigParse(e.to_string()))?;
        Ok(descriptors
            .into_iter()
            .fold(Self::new(), |registry, descriptor| registry.with(descriptor)))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_TYPES: OnceLock<RwLock<TypeRegistry>> = OnceLock::new();

/// Process-wide registry. Created on first use and never torn down.
pub fn global() -> &'static RwLock<TypeRegistry> {
    GLOBAL_TYPES.get_or_init(|| RwLock::new(TypeRegistry::new()))
}

/// Registers a descriptor in the process-wide registry.
pub fn register_global(descriptor: TypeDescriptor) -> Option<TypeDescriptor> {
    global().write().register(descriptor)
}
