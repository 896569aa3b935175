// Classifying and configuring rules the way an engine does at registration.

use rule_introspect::{
    collect_interfaces, find_marker, is_marker_present, Introspect, Marker, RuleSettings,
    TypeDescriptor, TypeKey, TypeRegistry,
};

struct Base;
struct R;

impl Introspect for R {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<R>()
    }
}

struct MyRule;

impl Introspect for MyRule {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<MyRule>()
    }
}

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(TypeDescriptor::interface("Named"))
        .with(TypeDescriptor::interface("Priced"))
        .with(TypeDescriptor::of::<Base>().implements("Priced"))
        .with(
            TypeDescriptor::of::<R>()
                .extends(TypeKey::of::<Base>())
                .implements("Named"),
        )
        .with(TypeDescriptor::marker("ActionTrigger"))
        .with(
            TypeDescriptor::marker("ConditionMarker")
                .marked(Marker::new("ActionTrigger").with("on", "condition"))
                .marked(Marker::new(TypeKey::rule_marker()).with("name", "conditional")),
        )
        .with(TypeDescriptor::of::<MyRule>().marked(Marker::new("ConditionMarker")))
}

#[test]
fn rule_hierarchy_interfaces_in_level_order() {
    let registry = registry();
    assert_eq!(
        collect_interfaces(&registry, &R),
        vec![TypeKey::new("Named"), TypeKey::new("Priced")]
    );
}

#[test]
fn meta_marked_rule_resolves_trigger_and_settings() {
    let registry = registry();
    let my_rule = MyRule.type_key();

    let trigger = find_marker(&registry, &"ActionTrigger".into(), &my_rule)
        .unwrap()
        .unwrap();
    assert_eq!(trigger.text("on"), Some("condition"));
    assert!(is_marker_present(&registry, &"ConditionMarker".into(), &my_rule).unwrap());

    let settings = RuleSettings::for_rule(&registry, &MyRule).unwrap();
    assert_eq!(settings.name, "conditional");
    assert_eq!(settings.priority, rule_introspect::DEFAULT_RULE_PRIORITY);
}
