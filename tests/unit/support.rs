use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};

use crate::runtime::document::DocumentImporter;
use crate::runtime::{
    AssetLoader, Factory, FileAsset, FileImporter, NativeFile, ResourceHandle,
};

pub(crate) struct NoFactory;

impl Factory for NoFactory {
    fn decode_image(&self, _bytes: &[u8]) -> Option<ResourceHandle> {
        None
    }
}

pub(crate) struct NullLoader;

impl AssetLoader for NullLoader {
    fn load_contents(&mut self, _a: &FileAsset, _b: &[u8], _f: &dyn Factory) -> bool {
        false
    }
}

pub(crate) fn native_file(json: &str) -> Arc<dyn NativeFile> {
    match DocumentImporter.import(json.as_bytes(), &NoFactory, &mut NullLoader) {
        Ok(file) => file,
        Err(e) => panic!("fixture failed to import: {e:?}"),
    }
}

pub(crate) const TWO_ARTBOARDS: &str = r#"{
  "version": { "major": 7, "minor": 0 },
  "artboards": [
    {
      "name": "First",
      "width": 100,
      "height": 50,
      "animations": ["idle"],
      "components": [
        { "kind": "event", "name": "Ping", "children": [
          { "kind": "string", "name": "who", "value": "first" }
        ] },
        { "kind": "node", "name": "Body" }
      ],
      "state_machines": [
        {
          "name": "Main",
          "inputs": [
            { "type": "boolean", "name": "hover" },
            { "type": "number", "name": "level", "value": 2.0 },
            { "type": "trigger", "name": "press" },
            { "type": "unknown", "name": "legacy", "type_tag": 57 }
          ],
          "reports": [
            { "event": "Ping", "when": { "trigger": "press" } },
            { "event": "Ping", "when": { "every_seconds": 1.0 } }
          ]
        },
        { "name": "Alt" }
      ]
    },
    {
      "name": "Second",
      "width": 200,
      "height": 100,
      "components": [ { "kind": "event", "name": "Lonely" } ]
    }
  ]
}"#;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct LogCounts {
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
pub(crate) fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, LogCounts) {
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

pub(crate) struct Headless {
    pub renderer: Arc<crate::render::renderer::Renderer>,
    pub device: crate::render::headless::RecordingDevice,
    pub provisioner: crate::render::headless::HeadlessProvisioner,
    pub clock: Arc<crate::foundation::clock::ManualClock>,
}

/// Inline-submission renderer over the recording device and a manual clock.
pub(crate) fn headless(config: crate::foundation::config::BridgeConfig) -> Headless {
    use crate::foundation::clock::ManualClock;
    use crate::render::headless::{HeadlessProvisioner, RecordingDevice};
    use crate::render::renderer::{Renderer, RendererServices};
    use crate::render::submission::InlineSubmission;

    let device = RecordingDevice::new();
    let provisioner = HeadlessProvisioner::new();
    let clock = Arc::new(ManualClock::new());
    let services = RendererServices::new(
        Box::new(device.clone()),
        Arc::new(provisioner.clone()),
        Arc::new(InlineSubmission),
    )
    .with_clock(clock.clone());
    let renderer = match Renderer::new(config, services) {
        Ok(r) => r,
        Err(e) => panic!("renderer: {e}"),
    };
    Headless {
        renderer,
        device,
        provisioner,
        clock,
    }
}
