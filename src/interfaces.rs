// Capability interface discovery over a rule's ancestor chain.

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, warn};

use crate::type_registry::{TypeKey, TypeRegistry};

/// Implemented by rule objects so their registered descriptor can be found.
pub trait Introspect {
    /// Key of the concrete type's descriptor
    fn type_key(&self) -> TypeKey;
}

impl<T: Introspect + ?Sized> Introspect for &T {
    fn type_key(&self) -> TypeKey {
        (**self).type_key()
    }
}

impl<T: Introspect + ?Sized> Introspect for Box<T> {
    fn type_key(&self) -> TypeKey {
        (**self).type_key()
    }
}

impl<T: Introspect + ?Sized> Introspect for Arc<T> {
    fn type_key(&self) -> TypeKey {
        (**self).type_key()
    }
}

/// Collects every interface declared along the rule's ancestor chain.
///
/// Levels are visited from the concrete type upwards and each level
/// contributes its interfaces in declared order. The terminal ancestor (the
/// first type without an ancestor of its own) is not visited. Interfaces
/// declared at several levels appear once per level.
pub fn collect_interfaces<R: Introspect + ?Sized>(registry: &TypeRegistry, rule: &R) -> Vec<TypeKey> {
    let key = rule.type_key();
    let mut interfaces = Vec::new();

    let Some(mut current) = registry.get(&key) else {
        debug!("No descriptor registered for rule type {}", key);
        return interfaces;
    };

    let mut visited = HashSet::new();
    while let Some(ancestor) = current.ancestor() {
        if !visited.insert(current.key()) {
            warn!("Ancestor cycle detected at {} while walking {}", current.key(), key);
            break;
        }
        interfaces.extend(current.interfaces().iter().cloned());
        match registry.get(ancestor) {
            Some(next) => current = next,
            None => {
                debug!("Ancestor {} of {} is not registered", ancestor, current.key());
                break;
            }
        }
    }

    interfaces
}

/// Whether any level of the rule's ancestor chain declares `interface`.
pub fn implements<R: Introspect + ?Sized>(
    registry: &TypeRegistry,
    rule: &R,
    interface: &TypeKey,
) -> bool {
    collect_interfaces(registry, rule).contains(interface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_registry::TypeDescriptor;

    struct Base;
    struct R;

    impl Introspect for R {
        fn type_key(&self) -> TypeKey {
            TypeKey::of::<R>()
        }
    }

    struct Keyed(&'static str);

    impl Introspect for Keyed {
        fn type_key(&self) -> TypeKey {
            TypeKey::new(self.0)
        }
    }

    fn hierarchy() -> TypeRegistry {
        TypeRegistry::new()
            .with(TypeDescriptor::interface("Named"))
            .with(TypeDescriptor::interface("Priced"))
            .with(TypeDescriptor::of::<Base>().implements("Priced"))
            .with(
                TypeDescriptor::of::<R>()
                    .extends(TypeKey::of::<Base>())
                    .implements("Named"),
            )
    }

    #[test]
    fn collects_concrete_level_before_ancestors() {
        let registry = hierarchy();
        let interfaces = collect_interfaces(&registry, &R);
        assert_eq!(interfaces, vec![TypeKey::new("Named"), TypeKey::new("Priced")]);
    }

    #[test]
    fn terminal_ancestor_is_not_visited() {
        let registry = TypeRegistry::new()
            .with(TypeDescriptor::class("Top").without_ancestor().implements("Hidden"))
            .with(TypeDescriptor::class("Mid").extends("Top").implements("A").implements("B"))
            .with(TypeDescriptor::class("Leaf").extends("Mid").implements("C"));

        let interfaces = collect_interfaces(&registry, &Keyed("Leaf"));
        assert_eq!(
            interfaces,
            vec![TypeKey::new("C"), TypeKey::new("A"), TypeKey::new("B")]
        );
        assert!(collect_interfaces(&registry, &Keyed("Top")).is_empty());
    }

    #[test]
    fn repeated_interfaces_are_not_deduplicated() {
        let registry = TypeRegistry::new()
            .with(TypeDescriptor::class("Base").implements("Named"))
            .with(TypeDescriptor::class("Child").extends("Base").implements("Named"));

        let interfaces = collect_interfaces(&registry, &Keyed("Child"));
        assert_eq!(interfaces, vec![TypeKey::new("Named"), TypeKey::new("Named")]);
    }

    #[test]
    fn unregistered_rule_yields_nothing() {
        let registry = TypeRegistry::new();
        assert!(collect_interfaces(&registry, &Keyed("Ghost")).is_empty());
    }

    #[test]
    fn unregistered_ancestor_ends_the_walk() {
        let registry =
            TypeRegistry::new().with(TypeDescriptor::class("Orphan").extends("Missing").implements("A"));
        assert_eq!(collect_interfaces(&registry, &Keyed("Orphan")), vec![TypeKey::new("A")]);
    }

    #[test]
    fn ancestor_cycles_terminate() {
        let registry = TypeRegistry::new()
            .with(TypeDescriptor::class("X").extends("Y").implements("A"))
            .with(TypeDescriptor::class("Y").extends("X").implements("B"));

        let interfaces = collect_interfaces(&registry, &Keyed("X"));
        assert_eq!(interfaces, vec![TypeKey::new("A"), TypeKey::new("B")]);
    }

    #[test]
    fn works_through_trait_objects() {
        let registry = hierarchy();
        let rule: Box<dyn Introspect> = Box::new(R);
        assert!(implements(&registry, &rule, &TypeKey::new("Priced")));
        assert!(!implements(&registry, rule.as_ref(), &TypeKey::new("Unknown")));
    }
}
