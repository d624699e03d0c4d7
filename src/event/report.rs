use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

use crate::event::component::{Component, ComponentKind};

#[derive(Clone, Debug, PartialEq)]
/// One event reported by a state machine during an advance.
pub struct EventReport {
    /// Event name.
    pub name: String,
    /// Native core type of the event.
    pub type_tag: u16,
    /// Seconds between the moment the event fired and the end of the advance.
    pub delay_seconds: f32,
    /// The event's child components.
    pub properties: Vec<Component>,
}

impl EventReport {
    /// Build a report for `event`. Non-event components produce a bare report.
    pub fn from_component(event: &Component, delay_seconds: f32) -> Self {
        let (type_tag, properties) = match &event.kind {
            ComponentKind::Event {
                type_tag,
                properties,
            } => (*type_tag, properties.clone()),
            other => (other.type_tag(), Vec::new()),
        };
        Self {
            name: event.name.clone(),
            type_tag,
            delay_seconds,
            properties,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
/// Named custom-property values attached to an event, split by type.
pub struct PropertyBag {
    /// Boolean properties.
    pub bools: BTreeMap<String, bool>,
    /// Number properties.
    pub numbers: BTreeMap<String, f32>,
    /// String properties.
    pub strings: BTreeMap<String, String>,
}

impl PropertyBag {
    /// Collect custom properties from `children`; other components are ignored.
    /// A repeated name keeps the last value.
    pub fn from_components(children: &[Component]) -> Self {
        let mut bag = Self::default();
        for child in children {
            match &child.kind {
                ComponentKind::BooleanProperty(v) => {
                    bag.bools.insert(child.name.clone(), *v);
                }
                ComponentKind::NumberProperty(v) => {
                    bag.numbers.insert(child.name.clone(), *v);
                }
                ComponentKind::StringProperty(v) => {
                    bag.strings.insert(child.name.clone(), v.clone());
                }
                ComponentKind::Event { .. } | ComponentKind::Other { .. } => {}
            }
        }
        bag
    }

    /// Boolean property `name`.
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.bools.get(name).copied()
    }

    /// Number property `name`.
    pub fn number(&self, name: &str) -> Option<f32> {
        self.numbers.get(name).copied()
    }

    /// String property `name`.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.strings.get(name).map(String::as_str)
    }

    /// Total number of properties.
    pub fn len(&self) -> usize {
        self.bools.len() + self.numbers.len() + self.strings.len()
    }

    /// `true` when no property is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, serde::Serialize)]
/// Host-facing event value, immutable once built.
///
/// Equality and hashing use [`RiveEvent::id`] only: two reports of the same native
/// event are distinct values.
pub struct RiveEvent {
    id: Uuid,
    name: String,
    type_tag: u16,
    delay_seconds: f32,
    properties: PropertyBag,
}

impl RiveEvent {
    /// Build from a native report with a fresh id.
    pub fn from_report(report: &EventReport) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: report.name.clone(),
            type_tag: report.type_tag,
            delay_seconds: report.delay_seconds,
            properties: PropertyBag::from_components(&report.properties),
        }
    }

    /// Unique id of this value.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Event name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native core type.
    pub fn type_tag(&self) -> u16 {
        self.type_tag
    }

    /// Seconds between firing and the end of the advance that reported it.
    pub fn delay_seconds(&self) -> f32 {
        self.delay_seconds
    }

    /// Custom-property payload.
    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }
}

impl PartialEq for RiveEvent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RiveEvent {}

impl Hash for RiveEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
