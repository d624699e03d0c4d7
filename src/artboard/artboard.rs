use std::collections::BTreeMap;
use std::sync::Arc;

use crate::artboard::catalog::ArtboardCatalog;
use crate::artboard::layout;
use crate::event::{EventReport, RiveEvent};
use crate::file::{AnimationFile, ArtboardHandle, ArtboardSelector};
use crate::foundation::core::{Alignment, Extent, FitType, Rect, Vec2};
use crate::foundation::error::{BridgeError, BridgeResult};
use crate::render::arena::{ArtboardId, ArtboardInstance, InstanceArena, Lifecycle, ThreadLock};
use crate::render::renderer::Renderer;
use crate::render::target::RenderTargetBridge;
use crate::state_machine::StateMachineBridge;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Token returned by observer registration, used to unregister.
pub struct SubscriptionId(u64);

/// Callback for events matching a bound name.
pub type NamedEventCallback = Box<dyn FnMut(&RiveEvent) + Send>;
/// Callback receiving every non-empty batch of tick events.
pub type EventsCallback = Box<dyn FnMut(&[RiveEvent]) + Send>;
/// Replacement for the default state-machine step; returns events to dispatch.
pub type StateMachineTickHook = Box<dyn FnMut(&Artboard, f32) -> Vec<RiveEvent> + Send>;
/// Replacement for the default render step.
pub type RenderTickHook = Box<dyn FnMut(&Artboard, f32) + Send>;

#[derive(Clone, Debug, Default)]
/// Parameters of [`Artboard::initialize`].
pub struct ArtboardParams {
    /// Artboard to instance.
    pub selector: ArtboardSelector,
    /// State machine to bind; empty binds the default one.
    pub state_machine_name: String,
    /// Fit policy; `None` uses the renderer default.
    pub fit: Option<FitType>,
    /// Alignment; `None` uses the renderer default.
    pub alignment: Option<Alignment>,
}

/// Host-side handle to one artboard instance.
///
/// The native instance and its state machine live in the renderer's instance arena;
/// this handle owns the arena slot and the host-facing observers.
pub struct Artboard {
    id: ArtboardId,
    renderer: Arc<Renderer>,
    target: Option<Arc<RenderTargetBridge>>,
    fit: FitType,
    alignment: Vec2,
    next_subscription: u64,
    named_observers: BTreeMap<String, Vec<(SubscriptionId, NamedEventCallback)>>,
    events_observers: Vec<(SubscriptionId, EventsCallback)>,
    state_machine_hooks: Vec<StateMachineTickHook>,
    render_hooks: Vec<RenderTickHook>,
    last_tick_events: Vec<RiveEvent>,
}

impl Artboard {
    /// Reserve an uninitialized artboard on `renderer`.
    pub fn new(renderer: Arc<Renderer>) -> Self {
        let id = renderer.thread_lock().lock().allocate();
        let fit = renderer.config().default_fit;
        let alignment = renderer.config().default_alignment.to_vec2();
        Self {
            id,
            renderer,
            target: None,
            fit,
            alignment,
            next_subscription: 0,
            named_observers: BTreeMap::new(),
            events_observers: Vec::new(),
            state_machine_hooks: Vec::new(),
            render_hooks: Vec::new(),
            last_tick_events: Vec::new(),
        }
    }

    /// Arena handle of this artboard.
    pub fn id(&self) -> ArtboardId {
        self.id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InstanceArena> {
        self.renderer.thread_lock().lock()
    }

    /// Resolve `params.selector` in `file` now and build the instance on the
    /// submission context.
    ///
    /// Returns `false` when nothing could be resolved (no file imported). Completion
    /// is observable through [`is_initialized`](Self::is_initialized) or after
    /// [`Renderer::flush`]. A second call before the first completes replaces it
    /// once it runs.
    #[tracing::instrument(skip_all, fields(artboard = ?self.id))]
    pub fn initialize(&mut self, file: &AnimationFile, params: ArtboardParams) -> bool {
        let Some(handle) = file.get_artboard(&params.selector) else {
            return false;
        };
        let config = self.renderer.config();
        self.fit = params.fit.unwrap_or(config.default_fit);
        self.alignment = params
            .alignment
            .unwrap_or(config.default_alignment)
            .to_vec2();

        if !self.lock().begin_initialize(self.id) {
            return false;
        }

        let lock = self.renderer.thread_lock().clone();
        let id = self.id;
        let state_machine = params.state_machine_name;
        self.renderer.enqueue(Box::new(move || {
            build_instance(&lock, id, &handle, &state_machine);
        }));
        true
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lock().lifecycle(self.id)
    }

    /// `true` once initialization completed.
    pub fn is_initialized(&self) -> bool {
        self.lifecycle() == Lifecycle::Initialized
    }

    /// `Ok` once an instance is installed, otherwise [`BridgeError::NotInitialized`].
    pub fn require_initialized(&self) -> BridgeResult<()> {
        match self.lifecycle() {
            Lifecycle::Initialized => Ok(()),
            other => Err(BridgeError::not_initialized(format!(
                "artboard {:?} is {other:?}",
                self.id
            ))),
        }
    }

    /// Drop the native instance and its state machine.
    pub fn reset(&mut self) {
        self.lock().reset(self.id);
        self.named_observers.clear();
        self.last_tick_events.clear();
    }

    /// Draw into `target` from now on.
    pub fn bind_render_target(&mut self, target: Arc<RenderTargetBridge>) {
        if !target.thread_lock().same_as(self.renderer.thread_lock()) {
            tracing::warn!(artboard = ?self.id, render_target = target.name(), "render target belongs to another renderer");
        }
        self.target = Some(target);
    }

    /// Bound render target.
    pub fn render_target(&self) -> Option<&Arc<RenderTargetBridge>> {
        self.target.as_ref()
    }

    /// Fit policy used by the render step.
    pub fn fit(&self) -> FitType {
        self.fit
    }

    /// Change the fit policy.
    pub fn set_fit(&mut self, fit: FitType) {
        self.fit = fit;
    }

    /// Alignment vector used by the render step.
    pub fn alignment(&self) -> Vec2 {
        self.alignment
    }

    /// Change the alignment to a preset.
    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment.to_vec2();
    }

    /// Change the alignment to an arbitrary vector in `[-1, 1]`.
    pub fn set_alignment_vector(&mut self, alignment: Vec2) {
        self.alignment = alignment;
    }

    /// Advance one frame: state-machine step, event dispatch, then render step.
    ///
    /// No-op unless initialized and bound to a render target.
    pub fn tick(&mut self, dt: f32) {
        if self.target.is_none() || !self.is_initialized() {
            return;
        }

        let events = if self.state_machine_hooks.is_empty() {
            self.advance_state_machine(dt)
        } else {
            let mut hooks = std::mem::take(&mut self.state_machine_hooks);
            let mut events = Vec::new();
            for hook in &mut hooks {
                events.extend(hook(&*self, dt));
            }
            self.state_machine_hooks = hooks;
            events
        };
        self.dispatch(events);

        if self.render_hooks.is_empty() {
            self.issue_draw();
        } else {
            let mut hooks = std::mem::take(&mut self.render_hooks);
            for hook in &mut hooks {
                hook(&*self, dt);
            }
            self.render_hooks = hooks;
        }
    }

    /// Default state-machine step.
    ///
    /// Events reported by the previous advance are drained, then the machine advances
    /// by `dt`. With inline simulation the drained events are returned directly;
    /// otherwise the advance runs on the submission context and this returns the
    /// events it stashed on the previous tick.
    pub fn advance_state_machine(&self, dt: f32) -> Vec<RiveEvent> {
        if self.renderer.runs_simulation_inline() {
            return step_state_machine(&mut self.lock(), self.id, dt);
        }

        let stashed = self.lock().take_stashed_events(self.id);
        let lock = self.renderer.thread_lock().clone();
        let id = self.id;
        self.renderer.enqueue(Box::new(move || {
            let mut arena = lock.lock();
            let drained = step_state_machine(&mut arena, id, dt);
            arena.stash_events(id, drained);
        }));
        stashed
    }

    /// Default render step: align with the current fit and alignment, then draw.
    pub fn issue_draw(&self) {
        if let Some(target) = self.target.as_ref() {
            target.align(self.fit, self.alignment, self.id);
            target.draw_artboard(self.id);
        }
    }

    fn dispatch(&mut self, events: Vec<RiveEvent>) {
        if events.is_empty() {
            self.last_tick_events.clear();
            return;
        }
        for event in &events {
            if let Some(observers) = self.named_observers.get_mut(event.name()) {
                for (_, callback) in observers.iter_mut() {
                    callback(event);
                }
            }
        }
        for (_, callback) in &mut self.events_observers {
            callback(&events);
        }
        self.last_tick_events = events;
    }

    /// Events dispatched by the most recent tick.
    pub fn tick_reported_events(&self) -> &[RiveEvent] {
        &self.last_tick_events
    }

    /// Replace the default state-machine step. Hooks run in registration order.
    pub fn add_state_machine_tick_hook(&mut self, hook: StateMachineTickHook) {
        self.state_machine_hooks.push(hook);
    }

    /// Replace the default render step. Hooks run in registration order.
    pub fn add_render_tick_hook(&mut self, hook: RenderTickHook) {
        self.render_hooks.push(hook);
    }

    /// Restore the default tick steps.
    pub fn clear_tick_hooks(&mut self) {
        self.state_machine_hooks.clear();
        self.render_hooks.clear();
    }

    fn subscription(&mut self) -> SubscriptionId {
        self.next_subscription += 1;
        SubscriptionId(self.next_subscription)
    }

    /// Observe every non-empty batch of tick events.
    pub fn on_events(&mut self, callback: EventsCallback) -> SubscriptionId {
        let id = self.subscription();
        self.events_observers.push((id, callback));
        id
    }

    /// Remove an [`on_events`](Self::on_events) observer.
    pub fn remove_events_observer(&mut self, id: SubscriptionId) -> bool {
        let before = self.events_observers.len();
        self.events_observers.retain(|(sub, _)| *sub != id);
        self.events_observers.len() != before
    }

    /// Observe events called `name`. The name must be a cataloged event.
    pub fn bind_named_event(
        &mut self,
        name: &str,
        callback: NamedEventCallback,
    ) -> Option<SubscriptionId> {
        let known = self
            .lock()
            .instance(self.id)
            .is_some_and(|i| i.catalog.has_event(name));
        if !known {
            tracing::error!(artboard = ?self.id, event = name, "cannot bind unknown event");
            return None;
        }
        let id = self.subscription();
        self.named_observers
            .entry(name.to_string())
            .or_default()
            .push((id, callback));
        Some(id)
    }

    /// Remove a [`bind_named_event`](Self::bind_named_event) observer.
    pub fn unbind_named_event(&mut self, name: &str, id: SubscriptionId) -> bool {
        let Some(observers) = self.named_observers.get_mut(name) else {
            return false;
        };
        let before = observers.len();
        observers.retain(|(sub, _)| *sub != id);
        let removed = observers.len() != before;
        if observers.is_empty() {
            self.named_observers.remove(name);
        }
        removed
    }

    /// Report the cataloged event `name` through the state machine.
    ///
    /// Returns `false` (logged) without a state machine or when `name` is not an event.
    pub fn trigger_named_event(&self, name: &str, delay_seconds: f32) -> bool {
        let mut arena = self.lock();
        let Some(instance) = arena.instance_mut(self.id) else {
            tracing::error!(artboard = ?self.id, event = name, "artboard not initialized");
            return false;
        };
        let ArtboardInstance {
            state_machine,
            catalog,
            ..
        } = instance;
        let Some(state_machine) = state_machine.as_mut() else {
            tracing::error!(artboard = %catalog.name, event = name, "artboard has no state machine");
            return false;
        };
        let Some(event) = catalog.event(name) else {
            tracing::error!(artboard = %catalog.name, event = name, "no event with this name");
            return false;
        };
        state_machine.report_event(EventReport::from_component(event, delay_seconds))
    }

    fn with_state_machine<R>(
        &self,
        default: R,
        f: impl FnOnce(&mut StateMachineBridge) -> R,
    ) -> R {
        let mut arena = self.lock();
        match arena
            .instance_mut(self.id)
            .and_then(|i| i.state_machine.as_mut())
        {
            Some(sm) => f(sm),
            None => {
                tracing::error!(artboard = ?self.id, "no state machine available");
                default
            }
        }
    }

    /// Boolean input `name`; `false` if unavailable.
    pub fn bool_value(&self, name: &str) -> bool {
        self.with_state_machine(false, |sm| sm.bool_value(name))
    }

    /// Number input `name`; `0.0` if unavailable.
    pub fn number_value(&self, name: &str) -> f32 {
        self.with_state_machine(0.0, |sm| sm.number_value(name))
    }

    /// Set boolean input `name`.
    pub fn set_bool(&self, name: &str, value: bool) {
        self.with_state_machine((), |sm| sm.set_bool(name, value));
    }

    /// Set number input `name`.
    pub fn set_number(&self, name: &str, value: f32) {
        self.with_state_machine((), |sm| sm.set_number(name, value));
    }

    /// Fire trigger `name`.
    pub fn fire_trigger(&self, name: &str) {
        self.with_state_machine((), |sm| sm.fire_trigger(name));
    }

    /// Suspend state-machine advancing while inputs are applied.
    pub fn begin_input(&self) {
        self.with_state_machine((), StateMachineBridge::begin_input);
    }

    /// Resume state-machine advancing.
    pub fn end_input(&self) {
        self.with_state_machine((), StateMachineBridge::end_input);
    }

    /// Events reported by the state machine since its last advance began.
    pub fn reported_event_count(&self) -> usize {
        self.lock()
            .instance(self.id)
            .and_then(|i| i.state_machine.as_ref())
            .map_or(0, StateMachineBridge::reported_event_count)
    }

    /// Name of the bound state machine; empty without one.
    pub fn state_machine_name(&self) -> String {
        self.lock()
            .instance(self.id)
            .and_then(|i| i.state_machine.as_ref())
            .map(|sm| sm.name().to_string())
            .unwrap_or_default()
    }

    /// Artboard name; empty when uninitialized.
    pub fn name(&self) -> String {
        self.lock()
            .instance(self.id)
            .map(|i| i.native.name().to_string())
            .unwrap_or_default()
    }

    /// `true` when a state machine is bound.
    pub fn has_state_machine(&self) -> bool {
        self.lock()
            .instance(self.id)
            .is_some_and(|i| i.state_machine.is_some())
    }

    /// Artboard-space bounds; empty when uninitialized.
    pub fn bounds(&self) -> Rect {
        self.lock()
            .instance(self.id)
            .map_or(Rect::ZERO, |i| i.native.bounds())
    }

    /// Authored size; zero when uninitialized.
    pub fn size(&self) -> Vec2 {
        self.lock()
            .instance(self.id)
            .map_or(Vec2::ZERO, |i| i.native.size())
    }

    /// Catalog built at initialization.
    pub fn catalog(&self) -> Option<ArtboardCatalog> {
        self.lock().instance(self.id).map(|i| i.catalog.clone())
    }

    fn target_extent(&self) -> Extent {
        self.target
            .as_ref()
            .map_or(self.renderer.config().default_target_size, |t| t.extent())
    }

    /// Map a point from target-texture space into artboard space.
    ///
    /// Returns `Vec2::ZERO` when uninitialized.
    pub fn local_coordinates_in_target(&self, texture_position: Vec2) -> Vec2 {
        let Some(bounds) = self.lock().instance(self.id).map(|i| i.native.bounds()) else {
            return Vec2::ZERO;
        };
        layout::target_to_artboard(
            texture_position,
            self.fit,
            self.alignment,
            self.target_extent(),
            bounds,
        )
    }

    /// Map a point from a space where the target is drawn at `render_extents` into
    /// artboard space.
    pub fn local_coordinates(&self, position: Vec2, render_extents: Rect) -> Vec2 {
        let texture_position =
            layout::extents_to_target(position, render_extents, self.target_extent());
        self.local_coordinates_in_target(texture_position)
    }
}

impl Drop for Artboard {
    fn drop(&mut self) {
        self.lock().free(self.id);
    }
}

fn build_instance(lock: &ThreadLock, id: ArtboardId, handle: &ArtboardHandle, state_machine: &str) {
    let mut arena = lock.lock();
    if !arena.file_is_live(handle.file(), handle.generation()) {
        tracing::warn!(artboard = ?id, "file released before initialization ran");
        arena.reset(id);
        return;
    }
    let Some(mut native) = handle.native_file().instance_artboard(handle.index()) else {
        tracing::error!(artboard = ?id, index = handle.index(), "artboard could not be instanced");
        arena.reset(id);
        return;
    };
    native.advance(0.0);

    let bridge = StateMachineBridge::bind(native.as_ref(), state_machine);
    let bridge = bridge.is_valid().then_some(bridge);
    let catalog = ArtboardCatalog::build(native.as_ref(), bridge.as_ref());

    let installed = arena.install(
        id,
        ArtboardInstance {
            file: handle.file(),
            file_generation: handle.generation(),
            native,
            state_machine: bridge,
            catalog,
        },
    );
    if installed {
        tracing::debug!(artboard = ?id, name = handle.name(), "artboard initialized");
    }
}

fn step_state_machine(arena: &mut InstanceArena, id: ArtboardId, dt: f32) -> Vec<RiveEvent> {
    let Some(instance) = arena.instance_mut(id) else {
        return Vec::new();
    };
    let ArtboardInstance {
        native,
        state_machine,
        ..
    } = instance;
    let Some(sm) = state_machine.as_mut() else {
        native.advance(dt);
        return Vec::new();
    };
    if sm.is_receiving_input() {
        return Vec::new();
    }
    let events = sm.drain_reported_events();
    sm.advance(native.as_mut(), dt);
    events
}

#[cfg(test)]
#[path = "../../tests/unit/artboard/artboard.rs"]
mod tests;
