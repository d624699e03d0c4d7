//! Seam to the vector-animation runtime.
//!
//! The bridge never parses animation files or rasterizes shapes itself. It drives a
//! runtime through the traits below; [`document`] ships a JSON scene runtime that
//! implements all of them.

use std::sync::Arc;

use crate::event::{Component, EventReport};
use crate::foundation::core::{Rect, Vec2};

pub mod document;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// Outcome of importing animation-file bytes.
pub enum ImportResult {
    /// The file parsed and holds at least one artboard.
    Success,
    /// The bytes are not a usable animation file.
    Malformed,
    /// The file was written by an unsupported runtime major version.
    UnsupportedVersion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Reason an importer rejected the bytes.
pub enum ImportFailure {
    /// See [`ImportResult::Malformed`].
    Malformed,
    /// See [`ImportResult::UnsupportedVersion`].
    UnsupportedVersion,
}

impl From<ImportFailure> for ImportResult {
    fn from(f: ImportFailure) -> Self {
        match f {
            ImportFailure::Malformed => Self::Malformed,
            ImportFailure::UnsupportedVersion => Self::UnsupportedVersion,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Runtime format version stamped in a file.
pub struct FileVersion {
    /// Major version; files from another major are rejected.
    pub major: u16,
    /// Minor version.
    pub minor: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Native state-machine input kind.
pub enum InputKind {
    /// Boolean input.
    Bool,
    /// Number input.
    Number,
    /// Fire-and-forget trigger.
    Trigger,
    /// A kind this bridge does not understand, with its native type tag.
    Unknown(u16),
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Name and kind of one state-machine input.
pub struct InputDescriptor {
    /// Input name.
    pub name: String,
    /// Input kind.
    pub kind: InputKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
/// Opaque device-bindable resource produced by a [`Factory`].
pub struct ResourceHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Asset category referenced by a file.
pub enum AssetKind {
    /// Raster image.
    Image,
    /// Font face.
    Font,
    /// Audio clip.
    Audio,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
/// Asset reference discovered while importing a file.
pub struct FileAsset {
    /// File-unique asset id.
    pub id: u32,
    /// Asset name as authored.
    pub name: String,
    /// Asset category.
    pub kind: AssetKind,
    /// Identifier for out-of-band (hosted) contents, when the asset is not embedded.
    pub cdn_uuid: Option<String>,
}

/// Produces device-bindable resources from decoded bytes.
pub trait Factory: Send + Sync {
    /// Decode image bytes; `None` when they are not a supported image.
    fn decode_image(&self, bytes: &[u8]) -> Option<ResourceHandle>;
}

/// Resolves asset references reported by an importer.
pub trait AssetLoader {
    /// Load one asset. `inband` holds embedded bytes (empty for external assets).
    /// Returns `true` when the loader handled the asset.
    fn load_contents(&mut self, asset: &FileAsset, inband: &[u8], factory: &dyn Factory) -> bool;
}

/// Parses animation-file bytes into a [`NativeFile`].
pub trait FileImporter: Send + Sync {
    /// Import `bytes`, reporting every asset reference to `loader`.
    fn import(
        &self,
        bytes: &[u8],
        factory: &dyn Factory,
        loader: &mut dyn AssetLoader,
    ) -> Result<Arc<dyn NativeFile>, ImportFailure>;
}

/// A parsed animation file.
pub trait NativeFile: Send + Sync {
    /// Format version the file was written with.
    fn version(&self) -> FileVersion;
    /// Number of artboards.
    fn artboard_count(&self) -> usize;
    /// Name of the artboard at `index`.
    fn artboard_name(&self, index: usize) -> Option<String>;
    /// Index of the first artboard called `name`.
    fn artboard_index(&self, name: &str) -> Option<usize>;
    /// Number of linear animations on the artboard at `index`.
    fn artboard_animation_count(&self, index: usize) -> usize;
    /// Clone an independent instance of the artboard at `index`.
    fn instance_artboard(&self, index: usize) -> Option<Box<dyn NativeArtboard>>;
    /// Asset references in file order.
    fn assets(&self) -> Vec<FileAsset>;
}

/// An owned artboard instance.
pub trait NativeArtboard: Send {
    /// Artboard name.
    fn name(&self) -> &str;
    /// Axis-aligned bounds in artboard space.
    fn bounds(&self) -> Rect;
    /// Authored width and height.
    fn size(&self) -> Vec2;
    /// Advance timeline state by `dt` seconds. Returns `true` while still animating.
    fn advance(&mut self, dt: f32) -> bool;
    /// Number of linear animations.
    fn animation_count(&self) -> usize;
    /// Number of state machines.
    fn state_machine_count(&self) -> usize;
    /// Name of the state machine at `index`.
    fn state_machine_name(&self, index: usize) -> Option<String>;
    /// Instance the state machine called `name`.
    fn state_machine_named(&self, name: &str) -> Option<Box<dyn NativeStateMachine>>;
    /// Instance the default state machine, if the artboard has any.
    fn default_state_machine(&self) -> Option<Box<dyn NativeStateMachine>>;
    /// Flattened component tree, depth-first.
    fn components(&self) -> Vec<Component>;
}

/// A state-machine instance bound to one artboard instance.
pub trait NativeStateMachine: Send {
    /// State-machine name.
    fn name(&self) -> &str;
    /// Number of inputs, including unsupported kinds.
    fn input_count(&self) -> usize;
    /// Input descriptor at `index`.
    fn input(&self, index: usize) -> Option<InputDescriptor>;
    /// Current value of the boolean input `name`.
    fn bool_value(&self, name: &str) -> Option<bool>;
    /// Current value of the number input `name`.
    fn number_value(&self, name: &str) -> Option<f32>;
    /// Set the boolean input `name`. Returns `false` if no such boolean input exists.
    fn set_bool(&mut self, name: &str, value: bool) -> bool;
    /// Set the number input `name`. Returns `false` if no such number input exists.
    fn set_number(&mut self, name: &str, value: f32) -> bool;
    /// Fire the trigger `name`. Returns `false` if no such trigger exists.
    fn fire_trigger(&mut self, name: &str) -> bool;
    /// Advance by `dt` seconds and apply the result to `artboard`.
    ///
    /// Reported events from the previous advance are cleared first.
    fn advance_and_apply(&mut self, artboard: &mut dyn NativeArtboard, dt: f32) -> bool;
    /// Number of events reported since the last advance began.
    fn reported_event_count(&self) -> usize;
    /// Reported event at `index`.
    fn reported_event(&self, index: usize) -> Option<EventReport>;
    /// Append an externally triggered event to the reported list.
    fn report_event(&mut self, report: EventReport);
}
