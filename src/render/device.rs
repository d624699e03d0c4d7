use crate::foundation::core::{Affine, BezPath, Color};
use crate::foundation::error::BridgeResult;
use crate::runtime::NativeArtboard;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
/// Engine-side texture a render target draws into.
pub struct TextureHandle {
    /// Provisioner-assigned id.
    pub id: u64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Device-side render target bound to a texture, cached by the render-target bridge.
pub struct DeviceTarget {
    /// Texture the target was acquired for.
    pub texture: TextureHandle,
    /// Device-assigned serial; the device may reject old serials as stale.
    pub serial: u64,
}

/// Allocates and resizes engine textures. The bridge never allocates GPU memory.
pub trait TargetProvisioner: Send + Sync {
    /// Allocate a `width` x `height` texture.
    fn create_target(&self, width: u32, height: u32) -> BridgeResult<TextureHandle>;

    /// Resize `handle`, returning the handle to use from now on.
    fn resize(&self, handle: TextureHandle, width: u32, height: u32)
    -> BridgeResult<TextureHandle>;
}

/// GPU device executing render commands on the submission context.
///
/// `begin_frame` may fail with [`BridgeError::DeviceResourceStale`] when `target`
/// no longer matches the texture; the caller then re-acquires once.
///
/// [`BridgeError::DeviceResourceStale`]: crate::BridgeError::DeviceResourceStale
pub trait RenderDevice: Send {
    /// Resolve the device render target for `texture`.
    fn acquire_target(&mut self, texture: &TextureHandle) -> BridgeResult<DeviceTarget>;

    /// Start a frame on `target`, cleared to `clear`.
    fn begin_frame(&mut self, target: &DeviceTarget, clear: Color) -> BridgeResult<()>;

    /// Push transform and clip state.
    fn save(&mut self) -> BridgeResult<()>;

    /// Pop transform and clip state.
    fn restore(&mut self) -> BridgeResult<()>;

    /// Concatenate `affine` onto the current transform.
    fn transform(&mut self, affine: Affine) -> BridgeResult<()>;

    /// Draw an artboard with the current transform.
    fn draw_artboard(&mut self, artboard: &dyn NativeArtboard) -> BridgeResult<()>;

    /// Fill `path` with `color`.
    fn draw_path(&mut self, path: &BezPath, color: Color) -> BridgeResult<()>;

    /// Intersect the clip with `path`.
    fn clip_path(&mut self, path: &BezPath) -> BridgeResult<()>;

    /// Finish and flush the frame.
    fn end_frame(&mut self) -> BridgeResult<()>;
}
