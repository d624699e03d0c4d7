use std::time::Duration;

use super::*;
use crate::artboard::catalog::ArtboardCatalog;
use crate::foundation::config::BridgeConfig;
use crate::render::arena::{ArtboardInstance, FileId};
use crate::render::headless::DeviceCall;
use crate::test_support::{TWO_ARTBOARDS, capture_logs, headless, native_file};

fn install_artboard(lock: &ThreadLock) -> ArtboardId {
    let native = native_file(TWO_ARTBOARDS).instance_artboard(0).unwrap();
    let catalog = ArtboardCatalog::build(native.as_ref(), None);
    let mut arena = lock.lock();
    let id = arena.allocate();
    arena.install(
        id,
        ArtboardInstance {
            file: FileId(1),
            file_generation: 1,
            native,
            state_machine: None,
            catalog,
        },
    );
    id
}

#[test]
fn commands_execute_once_in_fifo_order() {
    let h = headless(BridgeConfig::default());
    let target = h.renderer.create_texture_target("t", 64, 32).unwrap();
    let id = install_artboard(target.thread_lock());

    target.save();
    target.transform(Affine::translate((5.0, 0.0)));
    target.draw_artboard(id);
    target.restore();
    assert_eq!(target.pending_len(), 4);

    let report = h.renderer.submit_target_now(&target).unwrap();
    assert_eq!(
        report.executed,
        vec![
            RenderCommandType::Save,
            RenderCommandType::Transform,
            RenderCommandType::DrawArtboard,
            RenderCommandType::Restore,
        ]
    );
    assert_eq!(target.pending_len(), 0);

    let calls = h.device.take_calls();
    let body: Vec<_> = calls
        .iter()
        .filter(|c| {
            !matches!(
                c,
                DeviceCall::AcquireTarget { .. } | DeviceCall::BeginFrame { .. }
            )
        })
        .cloned()
        .collect();
    assert_eq!(
        body,
        vec![
            DeviceCall::Save,
            DeviceCall::Transform {
                coeffs: [1.0, 0.0, 0.0, 1.0, 5.0, 0.0]
            },
            DeviceCall::DrawArtboard {
                name: "First".to_string()
            },
            DeviceCall::Restore,
            DeviceCall::EndFrame,
        ]
    );

    let again = h.renderer.submit_target_now(&target).unwrap();
    assert!(!again.rendered());
    assert!(h.device.calls().is_empty());
}

#[test]
fn empty_queue_records_no_frame() {
    let h = headless(BridgeConfig::default());
    let target = h.renderer.create_texture_target("t", 8, 8).unwrap();
    let report = h.renderer.submit_target_now(&target).unwrap();
    assert_eq!(report, SubmitReport::default());
    assert_eq!(h.device.acquire_count(), 0);
}

#[test]
fn watchdog_recreates_untouched_target_before_commands() {
    let h = headless(BridgeConfig::default());
    let target = h.renderer.create_texture_target("t", 8, 8).unwrap();

    target.save();
    target.restore();
    let first = h.renderer.submit_target_now(&target).unwrap();
    assert!(first.acquired_target);
    assert!(!first.recreated_target);

    h.clock.advance(Duration::from_secs(5));
    target.save();
    target.restore();
    let within = h.renderer.submit_target_now(&target).unwrap();
    assert!(!within.acquired_target);

    h.device.take_calls();
    h.clock.advance(Duration::from_secs(21));
    target.save();
    target.restore();
    let stale = h.renderer.submit_target_now(&target).unwrap();
    assert!(stale.recreated_target);
    let calls = h.device.calls();
    assert!(matches!(calls[0], DeviceCall::AcquireTarget { .. }));
    assert!(matches!(calls[1], DeviceCall::BeginFrame { .. }));
    assert_eq!(calls[2], DeviceCall::Save);
}

#[test]
fn touch_postpones_recreation() {
    let h = headless(BridgeConfig::default());
    let target = h.renderer.create_texture_target("t", 8, 8).unwrap();
    target.save();
    target.restore();
    h.renderer.submit_target_now(&target).unwrap();

    h.clock.advance(Duration::from_secs(15));
    target.touch();
    h.clock.advance(Duration::from_secs(15));
    target.save();
    target.restore();
    let report = h.renderer.submit_target_now(&target).unwrap();
    assert!(!report.acquired_target);
}

#[test]
fn device_rejection_reacquires_once() {
    let h = headless(BridgeConfig::default());
    let target = h.renderer.create_texture_target("t", 8, 8).unwrap();
    target.save();
    target.restore();
    h.renderer.submit_target_now(&target).unwrap();

    h.device.expire_targets();
    target.save();
    target.restore();
    let (report, logs) = capture_logs(|| h.renderer.submit_target_now(&target).unwrap());
    assert!(report.recreated_target);
    assert_eq!(report.executed.len(), 2);
    assert_eq!(logs.warnings, 1);
}

#[test]
fn failed_acquisition_reports_the_dropped_frame() {
    let h = headless(BridgeConfig::default());
    let target = h.renderer.create_texture_target("t", 8, 8).unwrap();
    h.device.set_fail_acquire(true);
    target.save();
    target.restore();

    let (result, logs) = capture_logs(|| h.renderer.submit_target_now(&target));
    assert!(matches!(result, Err(BridgeError::Device(_))));
    assert_eq!(target.pending_len(), 0);
    assert_eq!(logs.warnings, 1);

    h.device.set_fail_acquire(false);
    target.save();
    target.restore();
    let report = h.renderer.submit_target_now(&target).unwrap();
    assert!(report.acquired_target);
    assert_eq!(report.executed.len(), 2);
}

#[test]
fn imbalance_is_logged_and_rebalanced() {
    let h = headless(BridgeConfig::default());
    let target = h.renderer.create_texture_target("t", 8, 8).unwrap();
    target.restore();
    target.save();
    target.save();
    target.restore();

    let (report, logs) = capture_logs(|| h.renderer.submit_target_now(&target).unwrap());
    assert_eq!(report.skipped, 1);
    assert_eq!(report.unbalanced_saves, 1);
    assert_eq!(logs.errors, 2);

    let calls = h.device.calls();
    let saves = calls.iter().filter(|c| **c == DeviceCall::Save).count();
    let restores = calls.iter().filter(|c| **c == DeviceCall::Restore).count();
    assert_eq!(saves, restores);
}

#[test]
fn released_artboards_are_skipped_with_warning() {
    let h = headless(BridgeConfig::default());
    let target = h.renderer.create_texture_target("t", 8, 8).unwrap();
    let id = install_artboard(target.thread_lock());
    target.thread_lock().lock().free(id);

    target.align(FitType::Contain, Vec2::ZERO, id);
    target.draw_artboard(id);
    let (report, logs) = capture_logs(|| h.renderer.submit_target_now(&target).unwrap());
    assert_eq!(report.skipped, 2);
    assert!(report.executed.is_empty());
    assert_eq!(logs.warnings, 2);
}

#[test]
fn align_emits_fit_transform_for_target_frame() {
    let h = headless(BridgeConfig::default());
    let target = h.renderer.create_texture_target("t", 500, 500).unwrap();
    let id = install_artboard(target.thread_lock());
    target.align(FitType::Contain, Vec2::ZERO, id);
    h.renderer.submit_target_now(&target).unwrap();

    let expected = compute_alignment(
        FitType::Contain,
        Vec2::ZERO,
        Rect::new(0.0, 0.0, 500.0, 500.0),
        Rect::new(0.0, 0.0, 100.0, 50.0),
    );
    assert!(h.device.calls().contains(&DeviceCall::Transform {
        coeffs: expected.as_coeffs()
    }));
}

#[test]
fn failed_draw_is_contained_to_the_frame() {
    let h = headless(BridgeConfig::default());
    let target = h.renderer.create_texture_target("t", 8, 8).unwrap();
    h.device.set_fail_draws(true);
    target.draw_path(BezPath::new(), Color::TRANSPARENT);
    target.save();
    target.restore();
    let report = h.renderer.submit_target_now(&target).unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.executed.len(), 2);
    assert_eq!(h.device.calls().last(), Some(&DeviceCall::EndFrame));
}

#[test]
fn resize_and_invalidate_force_reacquire() {
    let h = headless(BridgeConfig::default());
    let target = h.renderer.create_texture_target("t", 8, 8).unwrap();
    target.save();
    target.restore();
    h.renderer.submit_target_now(&target).unwrap();

    target.resize(16, 4).unwrap();
    assert_eq!((target.width(), target.height()), (16, 4));
    assert_eq!(h.provisioner.created(), 2);
    target.save();
    target.restore();
    assert!(h.renderer.submit_target_now(&target).unwrap().acquired_target);

    target.invalidate_cached_target();
    target.save();
    target.restore();
    assert!(h.renderer.submit_target_now(&target).unwrap().acquired_target);
}

#[test]
fn discard_and_clear_color() {
    let h = headless(BridgeConfig::default());
    let target = h.renderer.create_texture_target("t", 8, 8).unwrap();
    target.save();
    target.clip_path(BezPath::new());
    assert_eq!(target.discard_pending(), 2);
    assert_eq!(target.pending_len(), 0);

    let red = Color::from_rgba8(255, 0, 0, 255);
    target.set_clear_color(red);
    target.save();
    target.restore();
    h.renderer.submit_target_now(&target).unwrap();
    assert!(h.device.calls().contains(&DeviceCall::BeginFrame {
        texture: target.texture().id,
        clear: red
    }));
    assert_eq!(target.name(), "t");
}
