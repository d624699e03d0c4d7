#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rive_bridge::runtime::document::DocumentImporter;
use rive_bridge::{
    AnimationFile, BridgeConfig, HeadlessFactory, HeadlessProvisioner, ImportResult,
    InlineSubmission, ManualClock, RecordingDevice, Renderer, RendererServices,
    SubmissionContext,
};
use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};

pub const TWO_ARTBOARDS: &str = include_str!("../fixtures/two_artboards.json");

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogCounts {
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Clone, Default)]
struct LogCounter {
    errors: Arc<AtomicUsize>,
    warnings: Arc<AtomicUsize>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        match *event.metadata().level() {
            Level::ERROR => {
                self.errors.fetch_add(1, Ordering::SeqCst);
            }
            Level::WARN => {
                self.warnings.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
    }
}

/// Run `f` with a subscriber that counts warnings and errors on this thread.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, LogCounts) {
    let counter = LogCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    let out = tracing::subscriber::with_default(subscriber, f);
    (
        out,
        LogCounts {
            errors: counter.errors.load(Ordering::SeqCst),
            warnings: counter.warnings.load(Ordering::SeqCst),
        },
    )
}

pub struct Rig {
    pub renderer: Arc<Renderer>,
    pub device: RecordingDevice,
    pub clock: Arc<ManualClock>,
}

pub fn rig_with(config: BridgeConfig, submission: Arc<dyn SubmissionContext>) -> Rig {
    let device = RecordingDevice::new();
    let clock = Arc::new(ManualClock::new());
    let services = RendererServices::new(
        Box::new(device.clone()),
        Arc::new(HeadlessProvisioner::new()),
        submission,
    )
    .with_clock(clock.clone());
    Rig {
        renderer: Renderer::new(config, services).unwrap(),
        device,
        clock,
    }
}

pub fn rig() -> Rig {
    rig_with(BridgeConfig::default(), Arc::new(InlineSubmission))
}

pub fn load(renderer: &Arc<Renderer>, json: &str) -> AnimationFile {
    let mut file = AnimationFile::new(renderer.clone());
    let result = file.import(json.as_bytes(), &DocumentImporter, &HeadlessFactory::default());
    assert_eq!(result, ImportResult::Success);
    file
}
