//! JSON scene runtime.
//!
//! A document describes artboards (size, origin, animations, component tree), state
//! machines (typed inputs and event-report rules) and asset references. It is a
//! scene description for hosts and tests, not the binary animation format.

use std::sync::Arc;

use crate::event::{Component, ComponentKind, EventReport, type_tag};
use crate::foundation::core::{Rect, Vec2};
use crate::runtime::{
    AssetKind, AssetLoader, Factory, FileAsset, FileImporter, FileVersion, ImportFailure,
    InputDescriptor, InputKind, NativeArtboard, NativeFile, NativeStateMachine,
};

/// Only documents with this major version are accepted.
pub const SUPPORTED_MAJOR_VERSION: u16 = 7;

const NODE_TYPE_TAG: u16 = 2;

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct FileDoc {
    version: FileVersion,
    #[serde(default)]
    assets: Vec<AssetDoc>,
    #[serde(default)]
    artboards: Vec<ArtboardDoc>,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct AssetDoc {
    id: u32,
    name: String,
    kind: AssetKind,
    #[serde(default)]
    cdn_uuid: Option<String>,
    #[serde(default)]
    bytes: Vec<u8>,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ArtboardDoc {
    name: String,
    width: f64,
    height: f64,
    #[serde(default)]
    origin: [f64; 2],
    #[serde(default)]
    animations: Vec<String>,
    #[serde(default)]
    components: Vec<ComponentDoc>,
    #[serde(default)]
    state_machines: Vec<StateMachineDoc>,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
enum ComponentDoc {
    Event {
        name: String,
        #[serde(default)]
        children: Vec<ComponentDoc>,
    },
    OpenUrlEvent {
        name: String,
        #[serde(default)]
        children: Vec<ComponentDoc>,
    },
    Boolean {
        name: String,
        value: bool,
    },
    Number {
        name: String,
        value: f32,
    },
    #[serde(rename = "string")]
    Text {
        name: String,
        value: String,
    },
    Node {
        name: String,
        #[serde(default = "default_node_tag")]
        type_tag: u16,
        #[serde(default)]
        children: Vec<ComponentDoc>,
    },
}

fn default_node_tag() -> u16 {
    NODE_TYPE_TAG
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct StateMachineDoc {
    name: String,
    #[serde(default)]
    inputs: Vec<InputDoc>,
    #[serde(default)]
    reports: Vec<ReportRuleDoc>,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
enum InputDoc {
    Boolean {
        name: String,
        #[serde(default)]
        value: bool,
    },
    Number {
        name: String,
        #[serde(default)]
        value: f32,
    },
    Trigger {
        name: String,
    },
    Unknown {
        name: String,
        type_tag: u16,
    },
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ReportRuleDoc {
    event: String,
    when: ReportWhen,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
enum ReportWhen {
    /// The named trigger fired since the last advance.
    Trigger(String),
    /// Every `n` seconds of state-machine time.
    EverySeconds(f32),
    /// The boolean input changed to `value`.
    BoolBecomes { input: String, value: bool },
    /// The number input rose above `threshold`.
    NumberAbove { input: String, threshold: f32 },
}

/// Flatten a component subtree depth-first into `out`, returning the converted root.
fn flatten(doc: &ComponentDoc, out: &mut Vec<Component>) -> Component {
    let (component, children) = match doc {
        ComponentDoc::Event { name, children } | ComponentDoc::OpenUrlEvent { name, children } => {
            let tag = if matches!(doc, ComponentDoc::OpenUrlEvent { .. }) {
                type_tag::OPEN_URL_EVENT
            } else {
                type_tag::EVENT
            };
            let mut nested = Vec::new();
            let properties = children.iter().map(|c| flatten(c, &mut nested)).collect();
            (
                Component {
                    name: name.clone(),
                    kind: ComponentKind::Event {
                        type_tag: tag,
                        properties,
                    },
                },
                nested,
            )
        }
        ComponentDoc::Boolean { name, value } => (Component::boolean(name, *value), Vec::new()),
        ComponentDoc::Number { name, value } => (Component::number(name, *value), Vec::new()),
        ComponentDoc::Text { name, value } => (Component::string(name, value), Vec::new()),
        ComponentDoc::Node {
            name,
            type_tag,
            children,
        } => {
            let mut nested = Vec::new();
            for c in children {
                flatten(c, &mut nested);
            }
            (
                Component {
                    name: name.clone(),
                    kind: ComponentKind::Other {
                        type_tag: *type_tag,
                    },
                },
                nested,
            )
        }
    };
    out.push(component.clone());
    out.extend(children);
    component
}

#[derive(Debug)]
struct ArtboardData {
    name: String,
    width: f64,
    height: f64,
    origin: [f64; 2],
    animation_count: usize,
    components: Vec<Component>,
    state_machines: Vec<Arc<StateMachineDoc>>,
}

impl ArtboardData {
    fn from_doc(doc: ArtboardDoc) -> Self {
        let mut components = Vec::new();
        for c in &doc.components {
            flatten(c, &mut components);
        }
        Self {
            name: doc.name,
            width: doc.width,
            height: doc.height,
            origin: doc.origin,
            animation_count: doc.animations.len(),
            components,
            state_machines: doc.state_machines.into_iter().map(Arc::new).collect(),
        }
    }

    fn report_for(&self, event: &str, delay_seconds: f32) -> EventReport {
        match self
            .components
            .iter()
            .find(|c| c.is_event() && c.name == event)
        {
            Some(c) => EventReport::from_component(c, delay_seconds),
            None => EventReport {
                name: event.to_string(),
                type_tag: type_tag::EVENT,
                delay_seconds,
                properties: Vec::new(),
            },
        }
    }
}

#[derive(Clone, Copy, Default)]
/// Importer for JSON scene documents.
pub struct DocumentImporter;

impl FileImporter for DocumentImporter {
    fn import(
        &self,
        bytes: &[u8],
        factory: &dyn Factory,
        loader: &mut dyn AssetLoader,
    ) -> Result<Arc<dyn NativeFile>, ImportFailure> {
        let doc: FileDoc = serde_json::from_slice(bytes).map_err(|e| {
            tracing::debug!(error = %e, "document does not parse");
            ImportFailure::Malformed
        })?;
        if doc.version.major != SUPPORTED_MAJOR_VERSION {
            return Err(ImportFailure::UnsupportedVersion);
        }
        if doc.artboards.is_empty() {
            return Err(ImportFailure::Malformed);
        }
        if doc
            .artboards
            .iter()
            .any(|a| a.width < 0.0 || a.height < 0.0)
        {
            return Err(ImportFailure::Malformed);
        }

        let mut assets = Vec::with_capacity(doc.assets.len());
        for a in doc.assets {
            let asset = FileAsset {
                id: a.id,
                name: a.name,
                kind: a.kind,
                cdn_uuid: a.cdn_uuid,
            };
            if !loader.load_contents(&asset, &a.bytes, factory) {
                tracing::debug!(asset = %asset.name, "asset left unresolved by loader");
            }
            assets.push(asset);
        }

        Ok(Arc::new(DocumentFile {
            version: doc.version,
            assets,
            artboards: doc
                .artboards
                .into_iter()
                .map(|a| Arc::new(ArtboardData::from_doc(a)))
                .collect(),
        }))
    }
}

/// Parsed JSON document.
pub struct DocumentFile {
    version: FileVersion,
    assets: Vec<FileAsset>,
    artboards: Vec<Arc<ArtboardData>>,
}

impl NativeFile for DocumentFile {
    fn version(&self) -> FileVersion {
        self.version
    }

    fn artboard_count(&self) -> usize {
        self.artboards.len()
    }

    fn artboard_name(&self, index: usize) -> Option<String> {
        self.artboards.get(index).map(|a| a.name.clone())
    }

    fn artboard_index(&self, name: &str) -> Option<usize> {
        self.artboards.iter().position(|a| a.name == name)
    }

    fn artboard_animation_count(&self, index: usize) -> usize {
        self.artboards.get(index).map_or(0, |a| a.animation_count)
    }

    fn instance_artboard(&self, index: usize) -> Option<Box<dyn NativeArtboard>> {
        let data = Arc::clone(self.artboards.get(index)?);
        Some(Box::new(DocumentArtboard { data, time: 0.0 }))
    }

    fn assets(&self) -> Vec<FileAsset> {
        self.assets.clone()
    }
}

/// Artboard instance; each instance keeps its own timeline position.
pub struct DocumentArtboard {
    data: Arc<ArtboardData>,
    time: f32,
}

impl DocumentArtboard {
    /// Seconds advanced so far.
    pub fn time(&self) -> f32 {
        self.time
    }
}

impl NativeArtboard for DocumentArtboard {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn bounds(&self) -> Rect {
        let (w, h) = (self.data.width, self.data.height);
        let x0 = -self.data.origin[0] * w;
        let y0 = -self.data.origin[1] * h;
        Rect::new(x0, y0, x0 + w, y0 + h)
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.data.width, self.data.height)
    }

    fn advance(&mut self, dt: f32) -> bool {
        self.time += dt.max(0.0);
        self.data.animation_count > 0
    }

    fn animation_count(&self) -> usize {
        self.data.animation_count
    }

    fn state_machine_count(&self) -> usize {
        self.data.state_machines.len()
    }

    fn state_machine_name(&self, index: usize) -> Option<String> {
        self.data.state_machines.get(index).map(|s| s.name.clone())
    }

    fn state_machine_named(&self, name: &str) -> Option<Box<dyn NativeStateMachine>> {
        let doc = self.data.state_machines.iter().find(|s| s.name == name)?;
        Some(Box::new(DocumentStateMachine::new(
            Arc::clone(doc),
            Arc::clone(&self.data),
        )))
    }

    fn default_state_machine(&self) -> Option<Box<dyn NativeStateMachine>> {
        let doc = self.data.state_machines.first()?;
        Some(Box::new(DocumentStateMachine::new(
            Arc::clone(doc),
            Arc::clone(&self.data),
        )))
    }

    fn components(&self) -> Vec<Component> {
        self.data.components.clone()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum InputValue {
    Bool(bool),
    Number(f32),
    Trigger(bool),
    Unknown(u16),
}

/// State-machine instance evaluating the document's report rules.
pub struct DocumentStateMachine {
    doc: Arc<StateMachineDoc>,
    artboard: Arc<ArtboardData>,
    names: Vec<String>,
    values: Vec<InputValue>,
    applied: Vec<InputValue>,
    time: f64,
    reported: Vec<EventReport>,
}

impl DocumentStateMachine {
    fn new(doc: Arc<StateMachineDoc>, artboard: Arc<ArtboardData>) -> Self {
        let (names, values): (Vec<_>, Vec<_>) = doc
            .inputs
            .iter()
            .map(|i| match i {
                InputDoc::Boolean { name, value } => (name.clone(), InputValue::Bool(*value)),
                InputDoc::Number { name, value } => (name.clone(), InputValue::Number(*value)),
                InputDoc::Trigger { name } => (name.clone(), InputValue::Trigger(false)),
                InputDoc::Unknown { name, type_tag } => {
                    (name.clone(), InputValue::Unknown(*type_tag))
                }
            })
            .unzip();
        Self {
            doc,
            artboard,
            names,
            applied: values.clone(),
            values,
            time: 0.0,
            reported: Vec::new(),
        }
    }

    fn slot(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn rule_fires(&self, when: &ReportWhen, t0: f64, t1: f64) -> Vec<f32> {
        match when {
            ReportWhen::Trigger(name) => match self.slot(name).map(|i| self.values[i]) {
                Some(InputValue::Trigger(true)) => vec![0.0],
                _ => Vec::new(),
            },
            ReportWhen::EverySeconds(interval) => interval_crossings(*interval, t0, t1),
            ReportWhen::BoolBecomes { input, value } => match self.slot(input) {
                Some(i) => match (self.applied[i], self.values[i]) {
                    (InputValue::Bool(before), InputValue::Bool(now))
                        if now == *value && before != *value =>
                    {
                        vec![0.0]
                    }
                    _ => Vec::new(),
                },
                None => Vec::new(),
            },
            ReportWhen::NumberAbove { input, threshold } => match self.slot(input) {
                Some(i) => match (self.applied[i], self.values[i]) {
                    (InputValue::Number(before), InputValue::Number(now))
                        if now > *threshold && before <= *threshold =>
                    {
                        vec![0.0]
                    }
                    _ => Vec::new(),
                },
                None => Vec::new(),
            },
        }
    }
}

impl NativeStateMachine for DocumentStateMachine {
    fn name(&self) -> &str {
        &self.doc.name
    }

    fn input_count(&self) -> usize {
        self.values.len()
    }

    fn input(&self, index: usize) -> Option<InputDescriptor> {
        let kind = match self.values.get(index)? {
            InputValue::Bool(_) => InputKind::Bool,
            InputValue::Number(_) => InputKind::Number,
            InputValue::Trigger(_) => InputKind::Trigger,
            InputValue::Unknown(tag) => InputKind::Unknown(*tag),
        };
        Some(InputDescriptor {
            name: self.names[index].clone(),
            kind,
        })
    }

    fn bool_value(&self, name: &str) -> Option<bool> {
        match self.values.get(self.slot(name)?)? {
            InputValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn number_value(&self, name: &str) -> Option<f32> {
        match self.values.get(self.slot(name)?)? {
            InputValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    fn set_bool(&mut self, name: &str, value: bool) -> bool {
        match self.slot(name).and_then(|i| self.values.get_mut(i)) {
            Some(InputValue::Bool(v)) => {
                *v = value;
                true
            }
            _ => false,
        }
    }

    fn set_number(&mut self, name: &str, value: f32) -> bool {
        match self.slot(name).and_then(|i| self.values.get_mut(i)) {
            Some(InputValue::Number(v)) => {
                *v = value;
                true
            }
            _ => false,
        }
    }

    fn fire_trigger(&mut self, name: &str) -> bool {
        match self.slot(name).and_then(|i| self.values.get_mut(i)) {
            Some(InputValue::Trigger(fired)) => {
                *fired = true;
                true
            }
            _ => false,
        }
    }

    fn advance_and_apply(&mut self, artboard: &mut dyn NativeArtboard, dt: f32) -> bool {
        self.reported.clear();
        let t0 = self.time;
        let t1 = t0 + f64::from(dt.max(0.0));
        self.time = t1;

        let doc = Arc::clone(&self.doc);
        for rule in &doc.reports {
            for delay in self.rule_fires(&rule.when, t0, t1) {
                let report = self.artboard.report_for(&rule.event, delay);
                self.reported.push(report);
            }
        }

        for v in &mut self.values {
            if let InputValue::Trigger(fired) = v {
                *fired = false;
            }
        }
        self.applied.clone_from(&self.values);

        artboard.advance(dt);
        true
    }

    fn reported_event_count(&self) -> usize {
        self.reported.len()
    }

    fn reported_event(&self, index: usize) -> Option<EventReport> {
        self.reported.get(index).cloned()
    }

    fn report_event(&mut self, report: EventReport) {
        self.reported.push(report);
    }
}

/// Delays, measured back from `t1`, of every multiple of `interval` in `(t0, t1]`.
fn interval_crossings(interval: f32, t0: f64, t1: f64) -> Vec<f32> {
    if interval <= 0.0 || !interval.is_finite() {
        return Vec::new();
    }
    let interval = f64::from(interval);
    let first = (t0 / interval).floor() as u64 + 1;
    let last = (t1 / interval).floor() as u64;
    (first..=last)
        .map(|k| (t1 - k as f64 * interval) as f32)
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/document.rs"]
mod tests;
