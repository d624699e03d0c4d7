use std::collections::HashSet;

use super::*;

fn jump_event() -> Component {
    Component::event(
        "Jump",
        vec![
            Component::number("height", 2.5),
            Component::boolean("double", true),
            Component::string("sfx", "boing"),
            Component {
                name: "Shape".to_string(),
                kind: ComponentKind::Other { type_tag: 3 },
            },
        ],
    )
}

#[test]
fn property_bag_collects_typed_properties_and_skips_others() {
    let report = EventReport::from_component(&jump_event(), 0.25);
    let event = RiveEvent::from_report(&report);

    assert_eq!(event.name(), "Jump");
    assert_eq!(event.type_tag(), type_tag::EVENT);
    assert_eq!(event.delay_seconds(), 0.25);

    let props = event.properties();
    assert_eq!(props.len(), 3);
    assert_eq!(props.number("height"), Some(2.5));
    assert_eq!(props.bool("double"), Some(true));
    assert_eq!(props.string("sfx"), Some("boing"));
    assert_eq!(props.number("Shape"), None);
}

#[test]
fn repeated_property_name_keeps_last_value() {
    let bag = PropertyBag::from_components(&[
        Component::number("n", 1.0),
        Component::number("n", 7.0),
    ]);
    assert_eq!(bag.number("n"), Some(7.0));
    assert_eq!(bag.len(), 1);
}

#[test]
fn events_compare_and_hash_by_id() {
    let report = EventReport::from_component(&jump_event(), 0.0);
    let a = RiveEvent::from_report(&report);
    let b = RiveEvent::from_report(&report);
    assert_ne!(a, b);
    assert_eq!(a, a.clone());

    let mut set = HashSet::new();
    set.insert(a.clone());
    set.insert(a.clone());
    set.insert(b);
    assert_eq!(set.len(), 2);
}

#[test]
fn non_event_component_yields_bare_report() {
    let report = EventReport::from_component(&Component::number("x", 1.0), 0.0);
    assert_eq!(report.type_tag, type_tag::NUMBER_PROPERTY);
    assert!(report.properties.is_empty());
    assert!(RiveEvent::from_report(&report).properties().is_empty());
}

#[test]
fn component_kind_type_tags() {
    assert!(Component::string("s", "v").kind.is_property());
    assert!(!jump_event().kind.is_property());
    assert!(jump_event().is_event());
    assert_eq!(
        Component::boolean("b", false).kind.type_tag(),
        type_tag::BOOLEAN_PROPERTY
    );
}
