use crate::event::{EventReport, RiveEvent};
use crate::runtime::{InputKind, NativeArtboard, NativeStateMachine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
/// Input kinds the bridge supports.
pub enum InputType {
    /// Boolean input.
    Bool,
    /// Number input.
    Number,
    /// Trigger input.
    Trigger,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
/// A typed input discovered when the state machine was bound.
pub struct StateMachineInput {
    /// Input name.
    pub name: String,
    /// Input type.
    pub ty: InputType,
}

/// Owns one native state machine bound to an artboard instance.
///
/// The bridge lives next to its artboard instance inside the renderer's instance
/// arena, so every call already runs under the renderer thread lock.
pub struct StateMachineBridge {
    native: Option<Box<dyn NativeStateMachine>>,
    name: String,
    inputs: Vec<StateMachineInput>,
    receiving_input: bool,
}

impl StateMachineBridge {
    /// Bind the state machine called `name`, or the default one when `name` is empty.
    ///
    /// An unknown name logs a warning and falls back to the default state machine.
    /// The result is not [`valid`](Self::is_valid) when the artboard has none.
    pub fn bind(artboard: &dyn NativeArtboard, name: &str) -> Self {
        let native = if name.is_empty() {
            artboard.default_state_machine()
        } else {
            artboard.state_machine_named(name).or_else(|| {
                tracing::warn!(
                    artboard = artboard.name(),
                    state_machine = name,
                    "state machine not found, using the default"
                );
                artboard.default_state_machine()
            })
        };

        let Some(native) = native else {
            tracing::debug!(artboard = artboard.name(), "artboard has no state machine");
            return Self::unbound();
        };

        let mut inputs = Vec::with_capacity(native.input_count());
        for i in 0..native.input_count() {
            let Some(desc) = native.input(i) else {
                continue;
            };
            let ty = match desc.kind {
                InputKind::Bool => InputType::Bool,
                InputKind::Number => InputType::Number,
                InputKind::Trigger => InputType::Trigger,
                InputKind::Unknown(tag) => {
                    tracing::warn!(
                        state_machine = native.name(),
                        input = %desc.name,
                        type_tag = tag,
                        "unsupported input type skipped"
                    );
                    continue;
                }
            };
            inputs.push(StateMachineInput {
                name: desc.name,
                ty,
            });
        }

        Self {
            name: native.name().to_string(),
            native: Some(native),
            inputs,
            receiving_input: false,
        }
    }

    /// A bridge with no native state machine.
    pub fn unbound() -> Self {
        Self {
            native: None,
            name: String::new(),
            inputs: Vec::new(),
            receiving_input: false,
        }
    }

    /// `true` iff a native state machine is bound.
    pub fn is_valid(&self) -> bool {
        self.native.is_some()
    }

    /// Bound state-machine name; empty when unbound.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Advance by `dt` seconds and apply to `artboard`.
    ///
    /// Skipped while receiving input. Returns `true` when the native machine advanced.
    pub fn advance(&mut self, artboard: &mut dyn NativeArtboard, dt: f32) -> bool {
        if self.receiving_input {
            return false;
        }
        match self.native.as_mut() {
            Some(native) => native.advance_and_apply(artboard, dt),
            None => false,
        }
    }

    /// Number of supported inputs.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Supported input at `index`.
    pub fn input(&self, index: usize) -> Option<&StateMachineInput> {
        self.inputs.get(index)
    }

    /// All supported inputs in native order.
    pub fn inputs(&self) -> &[StateMachineInput] {
        &self.inputs
    }

    /// Names of every input of type `ty`.
    pub fn input_names(&self, ty: InputType) -> Vec<String> {
        self.inputs
            .iter()
            .filter(|i| i.ty == ty)
            .map(|i| i.name.clone())
            .collect()
    }

    fn resolve(&self, name: &str, ty: InputType) -> bool {
        if self.native.is_none() {
            tracing::error!(input = name, "no state machine bound");
            return false;
        }
        match self.inputs.iter().find(|i| i.name == name) {
            Some(i) if i.ty == ty => true,
            Some(i) => {
                tracing::error!(
                    state_machine = %self.name,
                    input = name,
                    expected = ?ty,
                    actual = ?i.ty,
                    "input has a different type"
                );
                false
            }
            None => {
                tracing::error!(state_machine = %self.name, input = name, "input not found");
                false
            }
        }
    }

    /// Current value of boolean input `name`; `false` if unresolved.
    pub fn bool_value(&self, name: &str) -> bool {
        if !self.resolve(name, InputType::Bool) {
            return false;
        }
        self.native
            .as_ref()
            .and_then(|n| n.bool_value(name))
            .unwrap_or(false)
    }

    /// Current value of number input `name`; `0.0` if unresolved.
    pub fn number_value(&self, name: &str) -> f32 {
        if !self.resolve(name, InputType::Number) {
            return 0.0;
        }
        self.native
            .as_ref()
            .and_then(|n| n.number_value(name))
            .unwrap_or(0.0)
    }

    /// Set boolean input `name`. No-op if unresolved.
    pub fn set_bool(&mut self, name: &str, value: bool) {
        if self.resolve(name, InputType::Bool)
            && let Some(native) = self.native.as_mut()
        {
            native.set_bool(name, value);
        }
    }

    /// Set number input `name`. No-op if unresolved.
    pub fn set_number(&mut self, name: &str, value: f32) {
        if self.resolve(name, InputType::Number)
            && let Some(native) = self.native.as_mut()
        {
            native.set_number(name, value);
        }
    }

    /// Fire trigger `name`. No-op if unresolved.
    pub fn fire_trigger(&mut self, name: &str) {
        if self.resolve(name, InputType::Trigger)
            && let Some(native) = self.native.as_mut()
        {
            native.fire_trigger(name);
        }
    }

    /// Events reported since the last advance began.
    pub fn reported_event_count(&self) -> usize {
        self.native.as_ref().map_or(0, |n| n.reported_event_count())
    }

    /// Reported event at `index`.
    pub fn reported_event(&self, index: usize) -> Option<EventReport> {
        self.native.as_ref()?.reported_event(index)
    }

    /// `true` when at least one event is pending.
    pub fn has_any_reported_events(&self) -> bool {
        self.reported_event_count() > 0
    }

    /// Build host events for everything reported since the last advance began.
    ///
    /// The native list is cleared by the next advance.
    pub fn drain_reported_events(&self) -> Vec<RiveEvent> {
        (0..self.reported_event_count())
            .filter_map(|i| self.reported_event(i))
            .map(|r| RiveEvent::from_report(&r))
            .collect()
    }

    /// Append an externally triggered event. Returns `false` when unbound.
    pub fn report_event(&mut self, report: EventReport) -> bool {
        match self.native.as_mut() {
            Some(native) => {
                native.report_event(report);
                true
            }
            None => false,
        }
    }

    /// Suspend advancing while the host applies a batch of inputs.
    pub fn begin_input(&mut self) {
        self.receiving_input = true;
    }

    /// Resume advancing.
    pub fn end_input(&mut self) {
        self.receiving_input = false;
    }

    /// `true` between [`begin_input`](Self::begin_input) and
    /// [`end_input`](Self::end_input).
    pub fn is_receiving_input(&self) -> bool {
        self.receiving_input
    }
}

#[cfg(test)]
#[path = "../../tests/unit/state_machine/bridge.rs"]
mod tests;
