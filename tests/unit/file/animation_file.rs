use super::*;
use crate::foundation::config::BridgeConfig;
use crate::render::headless::HeadlessFactory;
use crate::runtime::document::DocumentImporter;
use crate::test_support::{NullLoader, TWO_ARTBOARDS, capture_logs, headless};

const WITH_ASSETS: &str = r#"{
  "version": { "major": 7, "minor": 1 },
  "assets": [
    { "id": 4, "name": "hero.png", "kind": "image", "bytes": [137, 80, 78, 71] },
    { "id": 9, "name": "Inter", "kind": "font", "cdn_uuid": "abc-123" }
  ],
  "artboards": [ { "name": "Only", "width": 10, "height": 10, "animations": ["a", "b"] } ]
}"#;

fn imported(json: &str) -> (crate::test_support::Headless, AnimationFile) {
    let h = headless(BridgeConfig::default());
    let mut file = AnimationFile::new(h.renderer.clone());
    let result = file.import(json.as_bytes(), &DocumentImporter, &HeadlessFactory::default());
    assert_eq!(result, ImportResult::Success);
    (h, file)
}

#[test]
fn out_of_range_index_clamps_to_last_with_one_warning() {
    let (_h, file) = imported(TWO_ARTBOARDS);
    let last = file.get_artboard(&ArtboardSelector::Index(1)).unwrap();
    for i in [2usize, 5, 100] {
        let (handle, logs) = capture_logs(|| file.get_artboard(&i.into()).unwrap());
        assert_eq!(handle, last);
        assert_eq!(logs.warnings, 1);
        assert_eq!(logs.errors, 0);
    }
    assert_eq!(last.name(), "Second");
}

#[test]
fn unknown_name_falls_back_to_default_with_one_error() {
    let (_h, file) = imported(TWO_ARTBOARDS);
    let default = file.get_artboard(&ArtboardSelector::Index(0)).unwrap();
    for name in ["nope", "first", "Third"] {
        let (handle, logs) = capture_logs(|| file.get_artboard(&name.into()).unwrap());
        assert_eq!(handle, default);
        assert_eq!(logs.errors, 1);
    }
    assert_eq!(
        file.get_artboard(&"Second".into()).unwrap().index(),
        1
    );
    assert_eq!(file.get_artboard(&"".into()).unwrap(), default);
}

#[test]
fn lookup_without_import_is_none_and_logged() {
    let h = headless(BridgeConfig::default());
    let file = AnimationFile::new(h.renderer.clone());
    let (handle, logs) = capture_logs(|| file.get_artboard(&ArtboardSelector::default()));
    assert!(handle.is_none());
    assert_eq!(logs.errors, 1);
    assert_eq!(file.artboard_count(), 0);
    assert!(file.stats().is_none());
}

#[test]
fn failed_import_leaves_previous_state_untouched() {
    let (_h, mut file) = imported(TWO_ARTBOARDS);
    let before = file.get_artboard(&ArtboardSelector::Index(1)).unwrap();

    let bad = file.import(b"{ nope", &DocumentImporter, &HeadlessFactory::default());
    assert_eq!(bad, ImportResult::Malformed);
    let old = file.import(
        br#"{ "version": { "major": 5, "minor": 0 }, "artboards": [] }"#,
        &DocumentImporter,
        &HeadlessFactory::default(),
    );
    assert_eq!(old, ImportResult::UnsupportedVersion);

    assert_eq!(file.artboard_count(), 2);
    assert_eq!(file.get_artboard(&ArtboardSelector::Index(1)).unwrap(), before);
}

#[test]
fn successful_reimport_bumps_generation() {
    let (_h, mut file) = imported(TWO_ARTBOARDS);
    let g1 = file.get_artboard(&ArtboardSelector::Index(0)).unwrap();
    let result = file.import(WITH_ASSETS.as_bytes(), &DocumentImporter, &HeadlessFactory::default());
    assert_eq!(result, ImportResult::Success);
    let g2 = file.get_artboard(&ArtboardSelector::Index(0)).unwrap();
    assert_ne!(g1, g2);
    assert_eq!(g2.generation(), 2);
    assert_eq!(file.artboard_names(), vec!["Only".to_string()]);
}

#[test]
fn registry_records_assets_and_decodes_inband_images() {
    let (_h, file) = imported(WITH_ASSETS);
    assert_eq!(file.asset_count(), 2);
    let hero = &file.assets()[&4];
    assert!(hero.resource.is_some());
    assert_eq!(hero.inband_len, 4);
    let font = &file.assets()[&9];
    assert!(font.resource.is_none());
    assert_eq!(font.asset.cdn_uuid.as_deref(), Some("abc-123"));
}

#[test]
fn custom_loader_still_populates_registry() {
    let h = headless(BridgeConfig::default());
    let mut file = AnimationFile::new(h.renderer.clone());
    let result = file.import_with_loader(
        WITH_ASSETS.as_bytes(),
        &DocumentImporter,
        &HeadlessFactory::default(),
        &mut NullLoader,
    );
    assert_eq!(result, ImportResult::Success);
    assert_eq!(file.asset_count(), 2);
    assert!(file.assets().values().all(|a| a.resource.is_none()));
}

#[test]
fn stats_are_logged_after_import() {
    let h = headless(BridgeConfig::default());
    let mut file = AnimationFile::new(h.renderer.clone());
    file.import(WITH_ASSETS.as_bytes(), &DocumentImporter, &HeadlessFactory::default());
    let stats = file.stats().unwrap();
    assert_eq!(stats.version, FileVersion { major: 7, minor: 1 });
    assert_eq!(stats.artboards, 1);
    assert_eq!(stats.assets, 2);
    assert_eq!(stats.default_artboard_animations, 2);
    assert_eq!(file.default_artboard_animation_count(), 2);
}

#[test]
fn teardown_retires_the_file() {
    let (h, mut file) = imported(TWO_ARTBOARDS);
    let handle = file.get_artboard(&ArtboardSelector::Index(0)).unwrap();
    assert!(
        h.renderer
            .thread_lock()
            .lock()
            .file_is_live(handle.file(), handle.generation())
    );
    file.teardown();
    assert!(!file.is_imported());
    assert_eq!(file.asset_count(), 0);
    assert!(
        !h.renderer
            .thread_lock()
            .lock()
            .file_is_live(handle.file(), handle.generation())
    );
}
