use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::artboard::layout::compute_alignment;
use crate::foundation::clock::Clock;
use crate::foundation::core::{Affine, BezPath, Color, Extent, FitType, Rect, Vec2};
use crate::foundation::error::{BridgeError, BridgeResult};
use crate::render::arena::{ArtboardId, InstanceArena, ThreadLock};
use crate::render::command::{RenderCommand, RenderCommandType};
use crate::render::device::{DeviceTarget, RenderDevice, TargetProvisioner, TextureHandle};

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
/// What one [`RenderTargetBridge::submit`] did.
pub struct SubmitReport {
    /// Commands that reached the device, in execution order.
    pub executed: Vec<RenderCommandType>,
    /// A device target was acquired before executing commands.
    pub acquired_target: bool,
    /// The acquisition replaced a cached target (watchdog or device rejection).
    pub recreated_target: bool,
    /// Commands skipped (stale artboard, unmatched restore).
    pub skipped: usize,
    /// Commands the device rejected.
    pub failed: usize,
    /// Saves left open and restored at end of frame.
    pub unbalanced_saves: usize,
}

impl SubmitReport {
    /// `true` when a frame was recorded.
    pub fn rendered(&self) -> bool {
        !self.executed.is_empty() || self.skipped > 0 || self.failed > 0
    }
}

struct TargetState {
    texture: TextureHandle,
    cached: Option<DeviceTarget>,
    last_touched: Instant,
    clear_color: Color,
}

/// Queued command list replayed against one render target on the submission context.
///
/// Issuing commands is a lock-free channel send and may happen from any thread;
/// [`submit`](Self::submit) drains the queue under the renderer thread lock.
pub struct RenderTargetBridge {
    name: String,
    tx: Sender<RenderCommand>,
    rx: Receiver<RenderCommand>,
    thread_lock: ThreadLock,
    provisioner: Arc<dyn TargetProvisioner>,
    clock: Arc<dyn Clock>,
    stale_window: Duration,
    state: Mutex<TargetState>,
}

impl RenderTargetBridge {
    pub(crate) fn new(
        name: impl Into<String>,
        texture: TextureHandle,
        clear_color: Color,
        stale_window: Duration,
        thread_lock: ThreadLock,
        provisioner: Arc<dyn TargetProvisioner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (tx, rx) = unbounded();
        let last_touched = clock.now();
        Self {
            name: name.into(),
            tx,
            rx,
            thread_lock,
            provisioner,
            clock,
            stale_window,
            state: Mutex::new(TargetState {
                texture,
                cached: None,
                last_touched,
                clear_color,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, TargetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, cmd: RenderCommand) {
        // The receiver lives in `self`, so the channel cannot be disconnected.
        let _ = self.tx.send(cmd);
    }

    /// Queue a state push.
    pub fn save(&self) {
        self.push(RenderCommand::Save);
    }

    /// Queue a state pop.
    pub fn restore(&self) {
        self.push(RenderCommand::Restore);
    }

    /// Queue a transform.
    pub fn transform(&self, affine: Affine) {
        self.push(RenderCommand::Transform(affine));
    }

    /// Queue an artboard draw.
    pub fn draw_artboard(&self, artboard: ArtboardId) {
        self.push(RenderCommand::DrawArtboard(artboard));
    }

    /// Queue a path fill.
    pub fn draw_path(&self, path: BezPath, color: Color) {
        self.push(RenderCommand::DrawPath { path, color });
    }

    /// Queue a clip.
    pub fn clip_path(&self, path: BezPath) {
        self.push(RenderCommand::ClipPath(path));
    }

    /// Queue the fit/alignment transform for `artboard`.
    pub fn align(&self, fit: FitType, alignment: Vec2, artboard: ArtboardId) {
        self.push(RenderCommand::AlignArtboard {
            fit,
            alignment,
            artboard,
        });
    }

    /// Number of queued commands.
    pub fn pending_len(&self) -> usize {
        self.rx.len()
    }

    /// Drop every queued command, returning how many were dropped.
    pub fn discard_pending(&self) -> usize {
        self.rx.try_iter().count()
    }

    /// Mark the texture as in use, postponing watchdog recreation.
    pub fn touch(&self) {
        let now = self.clock.now();
        self.state().last_touched = now;
    }

    /// Forget the cached device target; the next submit acquires a new one.
    pub fn invalidate_cached_target(&self) {
        self.state().cached = None;
    }

    /// Resize the texture through the provisioner and invalidate the cached target.
    pub fn resize(&self, width: u32, height: u32) -> BridgeResult<()> {
        let mut state = self.state();
        state.texture = self.provisioner.resize(state.texture, width, height)?;
        state.cached = None;
        Ok(())
    }

    /// Clear color for subsequent frames.
    pub fn set_clear_color(&self, color: Color) {
        self.state().clear_color = color;
    }

    /// Current clear color.
    pub fn clear_color(&self) -> Color {
        self.state().clear_color
    }

    /// Texture currently backing this target.
    pub fn texture(&self) -> TextureHandle {
        self.state().texture
    }

    /// Texture width in pixels.
    pub fn width(&self) -> u32 {
        self.texture().width
    }

    /// Texture height in pixels.
    pub fn height(&self) -> u32 {
        self.texture().height
    }

    /// Texture size.
    pub fn extent(&self) -> Extent {
        let t = self.texture();
        Extent::new(t.width, t.height)
    }

    /// Target name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renderer-wide lock serializing submits with artboard mutation.
    pub fn thread_lock(&self) -> &ThreadLock {
        &self.thread_lock
    }

    /// Drain and execute every queued command on `device`. Consumer context only.
    ///
    /// An empty queue records no frame. A target untouched for longer than the
    /// staleness window is recreated before any command runs.
    pub fn submit(&self, device: &mut dyn RenderDevice) -> BridgeResult<SubmitReport> {
        let arena = self.thread_lock.lock();
        let commands: Vec<RenderCommand> = self.rx.try_iter().collect();
        let mut report = SubmitReport::default();
        if commands.is_empty() {
            return Ok(report);
        }

        let dropped = |e: BridgeError| {
            tracing::warn!(
                render_target = %self.name,
                dropped = commands.len(),
                error = %e,
                "no device target, queued commands dropped"
            );
            e
        };

        let mut state = self.state();
        let now = self.clock.now();
        let expired = now.saturating_duration_since(state.last_touched) > self.stale_window;
        let cached = state.cached;
        let target = match cached {
            Some(cached) if !expired => cached,
            previous => {
                if previous.is_some() {
                    tracing::debug!(render_target = %self.name, "render target stale, recreating");
                    report.recreated_target = true;
                }
                let fresh = device.acquire_target(&state.texture).map_err(dropped)?;
                state.cached = Some(fresh);
                state.last_touched = now;
                report.acquired_target = true;
                fresh
            }
        };

        match device.begin_frame(&target, state.clear_color) {
            Ok(()) => {}
            Err(BridgeError::DeviceResourceStale(msg)) => {
                tracing::warn!(render_target = %self.name, reason = %msg, "device rejected cached target");
                let fresh = device.acquire_target(&state.texture).map_err(dropped)?;
                state.cached = Some(fresh);
                state.last_touched = now;
                report.acquired_target = true;
                report.recreated_target = true;
                device
                    .begin_frame(&fresh, state.clear_color)
                    .map_err(dropped)?;
            }
            Err(e) => return Err(dropped(e)),
        }

        let frame = Extent::new(state.texture.width, state.texture.height).to_rect();
        let mut depth = 0usize;
        for cmd in &commands {
            match self.execute(device, &arena, cmd, frame, &mut depth) {
                Ok(true) => report.executed.push(cmd.kind()),
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    tracing::error!(render_target = %self.name, command = ?cmd.kind(), error = %e, "render command failed");
                    report.failed += 1;
                }
            }
        }

        while depth > 0 {
            tracing::error!(render_target = %self.name, "save without matching restore, restoring at end of frame");
            device.restore()?;
            depth -= 1;
            report.unbalanced_saves += 1;
        }

        device.end_frame()?;
        tracing::debug!(
            render_target = %self.name,
            executed = report.executed.len(),
            skipped = report.skipped,
            "render target submitted"
        );
        Ok(report)
    }

    fn execute(
        &self,
        device: &mut dyn RenderDevice,
        arena: &InstanceArena,
        cmd: &RenderCommand,
        frame: Rect,
        depth: &mut usize,
    ) -> BridgeResult<bool> {
        match cmd {
            RenderCommand::Save => {
                device.save()?;
                *depth += 1;
            }
            RenderCommand::Restore => {
                if *depth == 0 {
                    tracing::error!(render_target = %self.name, "restore without matching save skipped");
                    return Ok(false);
                }
                device.restore()?;
                *depth -= 1;
            }
            RenderCommand::Transform(affine) => device.transform(*affine)?,
            RenderCommand::DrawArtboard(id) => {
                let Some(instance) = arena.instance(*id) else {
                    tracing::warn!(render_target = %self.name, artboard = ?id, "draw for released artboard skipped");
                    return Ok(false);
                };
                device.draw_artboard(instance.native.as_ref())?;
            }
            RenderCommand::DrawPath { path, color } => device.draw_path(path, *color)?,
            RenderCommand::ClipPath(path) => device.clip_path(path)?,
            RenderCommand::AlignArtboard {
                fit,
                alignment,
                artboard,
            } => {
                let Some(instance) = arena.instance(*artboard) else {
                    tracing::warn!(render_target = %self.name, artboard = ?artboard, "align for released artboard skipped");
                    return Ok(false);
                };
                let xf = compute_alignment(*fit, *alignment, frame, instance.native.bounds());
                device.transform(xf)?;
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/target.rs"]
mod tests;
