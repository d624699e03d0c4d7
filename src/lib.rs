//! rive-bridge embeds vector animations in a real-time engine.
//!
//! A host imports an [`AnimationFile`], instances [`Artboard`]s from it, drives their
//! state machines once per frame, and draws them into [`RenderTargetBridge`]s whose
//! command queues are replayed on a submission context (inline or a dedicated
//! [`RenderThread`]).
//!
//! # Frame overview
//!
//! 1. **Tick**: [`Artboard::tick`] advances the bound state machine, dispatches the
//!    events it reported, and queues align/draw commands on the bound target.
//! 2. **Submit**: [`Renderer::submit_target`] replays the queue exactly once, in
//!    order, against the [`RenderDevice`], re-acquiring stale device targets first.
//!
//! Every artboard, state-machine and submit operation runs under the renderer-wide
//! [`ThreadLock`], so simulation and rendering may live on different threads.
//!
//! The native animation runtime is reached through the traits in [`runtime`]; the
//! bundled [`runtime::document`] runtime reads a JSON scene format and is what the
//! CLI and tests use.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod artboard;
mod event;
mod file;
mod foundation;
mod render;
mod state_machine;

/// Seam to the native animation runtime, plus the bundled JSON runtime.
pub mod runtime;

pub use artboard::{
    Artboard, ArtboardCatalog, ArtboardParams, EventsCallback, NamedEventCallback,
    RenderTickHook, StateMachineTickHook, SubscriptionId, compute_alignment,
    contained_extents, extents_to_target, target_to_artboard,
};
pub use event::{Component, ComponentKind, EventReport, PropertyBag, RiveEvent, type_tag};
pub use file::{
    AnimationFile, ArtboardHandle, ArtboardSelector, EmbeddedAsset, FileStats,
    RegistryAssetLoader,
};
pub use foundation::clock::{Clock, ManualClock, SystemClock};
pub use foundation::config::BridgeConfig;
pub use foundation::core::{Affine, Alignment, BezPath, Color, Extent, FitType, Point, Rect, Vec2};
pub use foundation::error::{BridgeError, BridgeResult};
pub use render::arena::{
    ArtboardId, ArtboardInstance, FileId, InstanceArena, Lifecycle, ThreadLock,
};
pub use render::command::{RenderCommand, RenderCommandType};
pub use render::device::{DeviceTarget, RenderDevice, TargetProvisioner, TextureHandle};
pub use render::headless::{DeviceCall, HeadlessFactory, HeadlessProvisioner, RecordingDevice};
pub use render::renderer::{Renderer, RendererServices};
pub use render::submission::{InlineSubmission, RenderThread, SubmissionContext, Work};
pub use render::target::{RenderTargetBridge, SubmitReport};
pub use runtime::ImportResult;
pub use state_machine::{InputType, StateMachineBridge, StateMachineInput};

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
mod test_support;
