use std::collections::BTreeMap;

use crate::event::Component;
use crate::runtime::NativeArtboard;
use crate::state_machine::{InputType, StateMachineBridge};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
/// Names discovered once when an artboard is initialized, for UI and validation.
pub struct ArtboardCatalog {
    /// Artboard name.
    pub name: String,
    /// Every state machine on the artboard.
    pub state_machine_names: Vec<String>,
    /// Every event component, in tree order.
    pub event_names: Vec<String>,
    /// Boolean inputs of the bound state machine.
    pub bool_inputs: Vec<String>,
    /// Number inputs of the bound state machine.
    pub number_inputs: Vec<String>,
    /// Trigger inputs of the bound state machine.
    pub trigger_inputs: Vec<String>,
    #[serde(skip)]
    components: BTreeMap<String, Component>,
}

impl ArtboardCatalog {
    /// Walk the component tree of `native` once and collect names.
    ///
    /// When several components share a name, the first in tree order is kept.
    pub fn build(native: &dyn NativeArtboard, state_machine: Option<&StateMachineBridge>) -> Self {
        let mut catalog = Self {
            name: native.name().to_string(),
            state_machine_names: (0..native.state_machine_count())
                .filter_map(|i| native.state_machine_name(i))
                .collect(),
            ..Self::default()
        };

        for component in native.components() {
            if component.is_event() && !catalog.event_names.contains(&component.name) {
                catalog.event_names.push(component.name.clone());
            }
            catalog
                .components
                .entry(component.name.clone())
                .or_insert(component);
        }

        if let Some(sm) = state_machine {
            catalog.bool_inputs = sm.input_names(InputType::Bool);
            catalog.number_inputs = sm.input_names(InputType::Number);
            catalog.trigger_inputs = sm.input_names(InputType::Trigger);
        }
        catalog
    }

    /// Component called `name`.
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    /// Event component called `name`.
    pub fn event(&self, name: &str) -> Option<&Component> {
        self.component(name).filter(|c| c.is_event())
    }

    /// `true` when `name` is a known event.
    pub fn has_event(&self, name: &str) -> bool {
        self.event_names.iter().any(|n| n == name)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/artboard/catalog.rs"]
mod tests;
