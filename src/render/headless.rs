//! In-memory stand-ins for the platform GPU backend.
//!
//! [`RecordingDevice`] records every call instead of drawing, [`HeadlessProvisioner`]
//! hands out texture ids and [`HeadlessFactory`] hands out image handles.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::foundation::core::{Affine, BezPath, Color};
use crate::foundation::error::{BridgeError, BridgeResult};
use crate::render::device::{DeviceTarget, RenderDevice, TargetProvisioner, TextureHandle};
use crate::runtime::{Factory, NativeArtboard, ResourceHandle};

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
/// One recorded device call.
#[allow(missing_docs)]
pub enum DeviceCall {
    AcquireTarget { texture: u64, serial: u64 },
    BeginFrame { texture: u64, clear: Color },
    Save,
    Restore,
    Transform { coeffs: [f64; 6] },
    DrawArtboard { name: String },
    DrawPath { color: Color },
    ClipPath,
    EndFrame,
}

#[derive(Default)]
struct DeviceState {
    calls: Vec<DeviceCall>,
    next_serial: u64,
    valid_from: u64,
    fail_draws: bool,
    fail_acquire: bool,
}

#[derive(Clone, Default)]
/// Device that records calls. Clones share the same log.
pub struct RecordingDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl RecordingDevice {
    /// New device with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of every recorded call.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state().calls.clone()
    }

    /// Take and clear the recorded calls.
    pub fn take_calls(&self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.state().calls)
    }

    /// Number of `acquire_target` calls so far.
    pub fn acquire_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::AcquireTarget { .. }))
            .count()
    }

    /// Make every target acquired so far stale, as after an external device reset.
    pub fn expire_targets(&self) {
        let mut s = self.state();
        s.valid_from = s.next_serial;
    }

    /// Make draw calls fail with a device error.
    pub fn set_fail_draws(&self, fail: bool) {
        self.state().fail_draws = fail;
    }

    /// Make target acquisition fail with a device error.
    pub fn set_fail_acquire(&self, fail: bool) {
        self.state().fail_acquire = fail;
    }
}

impl RenderDevice for RecordingDevice {
    fn acquire_target(&mut self, texture: &TextureHandle) -> BridgeResult<DeviceTarget> {
        let mut s = self.state();
        if s.fail_acquire {
            return Err(BridgeError::device("target acquisition rejected"));
        }
        let serial = s.next_serial;
        s.next_serial += 1;
        s.calls.push(DeviceCall::AcquireTarget {
            texture: texture.id,
            serial,
        });
        Ok(DeviceTarget {
            texture: *texture,
            serial,
        })
    }

    fn begin_frame(&mut self, target: &DeviceTarget, clear: Color) -> BridgeResult<()> {
        let mut s = self.state();
        if target.serial < s.valid_from {
            return Err(BridgeError::stale(format!(
                "target serial {} predates device reset",
                target.serial
            )));
        }
        s.calls.push(DeviceCall::BeginFrame {
            texture: target.texture.id,
            clear,
        });
        Ok(())
    }

    fn save(&mut self) -> BridgeResult<()> {
        self.state().calls.push(DeviceCall::Save);
        Ok(())
    }

    fn restore(&mut self) -> BridgeResult<()> {
        self.state().calls.push(DeviceCall::Restore);
        Ok(())
    }

    fn transform(&mut self, affine: Affine) -> BridgeResult<()> {
        self.state().calls.push(DeviceCall::Transform {
            coeffs: affine.as_coeffs(),
        });
        Ok(())
    }

    fn draw_artboard(&mut self, artboard: &dyn NativeArtboard) -> BridgeResult<()> {
        let mut s = self.state();
        if s.fail_draws {
            return Err(BridgeError::device("draw rejected"));
        }
        s.calls.push(DeviceCall::DrawArtboard {
            name: artboard.name().to_string(),
        });
        Ok(())
    }

    fn draw_path(&mut self, _path: &BezPath, color: Color) -> BridgeResult<()> {
        let mut s = self.state();
        if s.fail_draws {
            return Err(BridgeError::device("draw rejected"));
        }
        s.calls.push(DeviceCall::DrawPath { color });
        Ok(())
    }

    fn clip_path(&mut self, _path: &BezPath) -> BridgeResult<()> {
        self.state().calls.push(DeviceCall::ClipPath);
        Ok(())
    }

    fn end_frame(&mut self) -> BridgeResult<()> {
        self.state().calls.push(DeviceCall::EndFrame);
        Ok(())
    }
}

#[derive(Clone, Default)]
/// Provisioner handing out fresh texture ids. Clones share counters.
pub struct HeadlessProvisioner {
    next_id: Arc<AtomicU64>,
    created: Arc<AtomicUsize>,
}

impl HeadlessProvisioner {
    /// New provisioner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of textures created or recreated by resize.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    fn allocate(&self, width: u32, height: u32) -> BridgeResult<TextureHandle> {
        if width == 0 || height == 0 {
            return Err(BridgeError::provision(format!(
                "cannot allocate a {width}x{height} target"
            )));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(TextureHandle {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            width,
            height,
        })
    }
}

impl TargetProvisioner for HeadlessProvisioner {
    fn create_target(&self, width: u32, height: u32) -> BridgeResult<TextureHandle> {
        self.allocate(width, height)
    }

    fn resize(
        &self,
        _handle: TextureHandle,
        width: u32,
        height: u32,
    ) -> BridgeResult<TextureHandle> {
        self.allocate(width, height)
    }
}

#[derive(Default)]
/// Factory returning a fresh handle for any non-empty image bytes.
pub struct HeadlessFactory {
    next_id: AtomicU64,
}

impl Factory for HeadlessFactory {
    fn decode_image(&self, bytes: &[u8]) -> Option<ResourceHandle> {
        if bytes.is_empty() {
            return None;
        }
        Some(ResourceHandle(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/headless.rs"]
mod tests;
