use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::foundation::clock::{Clock, SystemClock};
use crate::foundation::config::BridgeConfig;
use crate::foundation::error::BridgeResult;
use crate::render::arena::ThreadLock;
use crate::render::device::{RenderDevice, TargetProvisioner};
use crate::render::submission::{SubmissionContext, Work};
use crate::render::target::{RenderTargetBridge, SubmitReport};

/// External services a [`Renderer`] drives.
pub struct RendererServices {
    /// GPU device, used only on the submission context.
    pub device: Box<dyn RenderDevice>,
    /// Texture allocation.
    pub provisioner: Arc<dyn TargetProvisioner>,
    /// Where submits and deferred initialization run.
    pub submission: Arc<dyn SubmissionContext>,
    /// Time source for the staleness watchdog.
    pub clock: Arc<dyn Clock>,
}

impl RendererServices {
    /// Services using the system clock.
    pub fn new(
        device: Box<dyn RenderDevice>,
        provisioner: Arc<dyn TargetProvisioner>,
        submission: Arc<dyn SubmissionContext>,
    ) -> Self {
        Self {
            device,
            provisioner,
            submission,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Renderer context passed explicitly to files, artboards and render targets.
pub struct Renderer {
    config: BridgeConfig,
    thread_lock: ThreadLock,
    device: Arc<Mutex<Box<dyn RenderDevice>>>,
    provisioner: Arc<dyn TargetProvisioner>,
    submission: Arc<dyn SubmissionContext>,
    clock: Arc<dyn Clock>,
}

impl Renderer {
    /// Validate `config` and build a renderer.
    pub fn new(config: BridgeConfig, services: RendererServices) -> BridgeResult<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(Self {
            config,
            thread_lock: ThreadLock::new(),
            device: Arc::new(Mutex::new(services.device)),
            provisioner: services.provisioner,
            submission: services.submission,
            clock: services.clock,
        }))
    }

    /// Active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Renderer-wide thread lock.
    pub fn thread_lock(&self) -> &ThreadLock {
        &self.thread_lock
    }

    /// `true` when simulation runs on the caller.
    pub fn runs_simulation_inline(&self) -> bool {
        self.config.run_simulation_inline
    }

    /// Queue work on the submission context.
    pub fn enqueue(&self, work: Work) {
        self.submission.enqueue(work);
    }

    /// Synchronization point: wait for all queued submission work.
    pub fn flush(&self) {
        self.submission.flush();
    }

    /// Allocate a texture and wrap it in a render-target bridge.
    #[tracing::instrument(skip(self))]
    pub fn create_texture_target(
        &self,
        name: &str,
        width: u32,
        height: u32,
    ) -> BridgeResult<Arc<RenderTargetBridge>> {
        let texture = self.provisioner.create_target(width, height)?;
        tracing::debug!(texture = texture.id, "render target created");
        Ok(Arc::new(RenderTargetBridge::new(
            name,
            texture,
            self.config.clear_color,
            self.config.stale_target_window(),
            self.thread_lock.clone(),
            Arc::clone(&self.provisioner),
            Arc::clone(&self.clock),
        )))
    }

    /// Render target at the configured default size.
    pub fn create_default_target(&self, name: &str) -> BridgeResult<Arc<RenderTargetBridge>> {
        let size = self.config.default_target_size;
        self.create_texture_target(name, size.width, size.height)
    }

    /// Queue a submit of `target` on the submission context.
    ///
    /// Device failures are logged there and never reach the caller.
    pub fn submit_target(&self, target: &Arc<RenderTargetBridge>) {
        let target = Arc::clone(target);
        let device = Arc::clone(&self.device);
        self.submission.enqueue(Box::new(move || {
            let mut device = lock_device(&device);
            if let Err(e) = target.submit(device.as_mut()) {
                tracing::error!(render_target = target.name(), error = %e, "submit failed");
            }
        }));
    }

    /// Submit `target` on the calling thread, which must be the submission context.
    pub fn submit_target_now(&self, target: &RenderTargetBridge) -> BridgeResult<SubmitReport> {
        let mut device = lock_device(&self.device);
        target.submit(device.as_mut())
    }
}

fn lock_device(
    device: &Mutex<Box<dyn RenderDevice>>,
) -> MutexGuard<'_, Box<dyn RenderDevice>> {
    device.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
