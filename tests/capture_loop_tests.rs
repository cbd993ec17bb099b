//! Capture loop lifecycle tests


use pose_tryon::{
    app::{CaptureLoop, LoopState, StatsSnapshot},
    classifier::ViewLabel,
    config::Config,
    pipeline::TickSettings,
    render::SharedSurface,
    tint::Color,
    Error,
};
use std::{
    sync::{atomic::Ordering, Arc},
    time::Duration,
};
use test_helpers::*;
use tokio::{sync::watch, time::timeout};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

fn new_loop() -> CaptureLoop {
    CaptureLoop::new(Config::default(), SharedSurface::new())
}

#[tokio::test]
async fn test_runs_until_end_of_stream() {
    let capture = new_loop();
    let (_tx, rx) = watch::channel(TickSettings::default());

    capture
        .start(
            MockFrameSource::new(3),
            FixedLandmarkSource::new(front_pose()),
            Arc::new(solid_assets()),
            rx,
        )
        .await
        .unwrap();
    timeout(TEST_TIMEOUT, capture.wait()).await.unwrap().unwrap();

    assert_eq!(capture.state(), LoopState::Idle);
    let stats = capture.stats();
    assert_eq!(stats.ticks, 3);
    assert_eq!(stats.overlays, 3);
    assert_eq!(stats.discarded, 0);
    let frame = capture.surface().snapshot().unwrap();
    assert_eq!(frame.get_pixel(320, 300), &view_color(ViewLabel::Front));
}

#[tokio::test]
async fn test_open_failure_returns_to_idle() {
    let capture = new_loop();
    let (_tx, rx) = watch::channel(TickSettings::default());

    let result = capture
        .start(
            MockFrameSource::failing(),
            FixedLandmarkSource::new(front_pose()),
            Arc::new(solid_assets()),
            rx,
        )
        .await;

    assert!(matches!(result, Err(Error::FrameSource(_))));
    assert_eq!(capture.state(), LoopState::Idle);
    assert!(capture.last_error().unwrap().contains("Permission denied"));
    assert!(capture.surface().snapshot().is_none());
}

#[tokio::test]
async fn test_start_while_active_is_rejected() {
    let capture = new_loop();
    let source = GatedLandmarkSource::new(front_pose());
    let started = Arc::clone(&source.started);
    let release = Arc::clone(&source.release);
    let (_tx, rx) = watch::channel(TickSettings::default());

    capture
        .start(MockFrameSource::new(1), source, Arc::new(solid_assets()), rx.clone())
        .await
        .unwrap();
    timeout(TEST_TIMEOUT, started.notified()).await.unwrap();
    assert_eq!(capture.state(), LoopState::Active);

    let second = capture
        .start(
            MockFrameSource::new(1),
            FixedLandmarkSource::new(front_pose()),
            Arc::new(solid_assets()),
            rx,
        )
        .await;
    assert!(matches!(second, Err(Error::InvalidState(_))));

    release.notify_one();
    timeout(TEST_TIMEOUT, capture.wait()).await.unwrap().unwrap();
    assert_eq!(capture.stats().ticks, 1);
}

#[tokio::test]
async fn test_stop_discards_in_flight_result() {
    let capture = new_loop();
    let source = GatedLandmarkSource::new(front_pose());
    let started = Arc::clone(&source.started);
    let release = Arc::clone(&source.release);
    let (_tx, rx) = watch::channel(TickSettings::default());

    capture
        .start(MockFrameSource::new(5), source, Arc::new(solid_assets()), rx)
        .await
        .unwrap();

    // Inference for the first frame is in flight
    timeout(TEST_TIMEOUT, started.notified()).await.unwrap();
    capture.stop();
    assert_eq!(capture.state(), LoopState::Idle);

    // Let the late result arrive
    release.notify_one();
    timeout(TEST_TIMEOUT, capture.wait()).await.unwrap().unwrap();

    let stats = capture.stats();
    assert_eq!(stats.ticks, 0);
    assert_eq!(stats.discarded, 1);
    assert!(capture.surface().snapshot().is_none());
}

#[tokio::test]
async fn test_landmark_errors_render_background() {
    let capture = new_loop();
    let (_tx, rx) = watch::channel(TickSettings::default());

    capture
        .start(
            MockFrameSource::new(2),
            FixedLandmarkSource::failing(),
            Arc::new(solid_assets()),
            rx,
        )
        .await
        .unwrap();
    timeout(TEST_TIMEOUT, capture.wait()).await.unwrap().unwrap();

    let stats = capture.stats();
    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.skipped, 2);
    assert_eq!(capture.surface().snapshot().unwrap().as_raw(), background().as_raw());
}

#[tokio::test]
async fn test_detached_surface_makes_ticks_no_ops() {
    let capture = new_loop();
    let (_tx, rx) = watch::channel(TickSettings::default());
    let source = GatedLandmarkSource::new(front_pose());
    let started = Arc::clone(&source.started);
    let release = Arc::clone(&source.release);

    capture
        .start(MockFrameSource::new(2), source, Arc::new(solid_assets()), rx)
        .await
        .unwrap();
    timeout(TEST_TIMEOUT, started.notified()).await.unwrap();
    capture.surface().detach();
    release.notify_one();
    timeout(TEST_TIMEOUT, started.notified()).await.unwrap();
    release.notify_one();
    timeout(TEST_TIMEOUT, capture.wait()).await.unwrap().unwrap();

    assert_eq!(capture.stats().ticks, 0);
    assert!(capture.surface().snapshot().is_none());
}

#[tokio::test]
async fn test_color_change_applies_from_next_tick() {
    let capture = new_loop();
    let (tx, rx) = watch::channel(TickSettings::default());
    let source = GatedLandmarkSource::new(front_pose());
    let started = Arc::clone(&source.started);
    let release = Arc::clone(&source.release);

    capture
        .start(MockFrameSource::new(2), source, Arc::new(solid_assets()), rx)
        .await
        .unwrap();

    // First tick already took its settings snapshot
    timeout(TEST_TIMEOUT, started.notified()).await.unwrap();
    tx.send(TickSettings {
        color: Color::new(0, 0, 255),
        heading: None,
    })
    .unwrap();
    release.notify_one();

    // Second tick is in flight, so the first has rendered
    timeout(TEST_TIMEOUT, started.notified()).await.unwrap();
    let first = capture.surface().snapshot().unwrap();
    assert_eq!(first.get_pixel(320, 300), &view_color(ViewLabel::Front));

    release.notify_one();
    timeout(TEST_TIMEOUT, capture.wait()).await.unwrap().unwrap();
    let second = capture.surface().snapshot().unwrap();
    assert_eq!(second.get_pixel(320, 300).0, [80, 0, 153, 255]);
}

#[tokio::test]
async fn test_restart_after_stop() {
    let capture = new_loop();
    let (_tx, rx) = watch::channel(TickSettings::default());

    capture
        .start(
            MockFrameSource::new(1),
            FixedLandmarkSource::new(back_pose()),
            Arc::new(solid_assets()),
            rx.clone(),
        )
        .await
        .unwrap();
    timeout(TEST_TIMEOUT, capture.wait()).await.unwrap().unwrap();
    capture.stop();

    capture
        .start(
            MockFrameSource::new(2),
            FixedLandmarkSource::new(front_pose()),
            Arc::new(solid_assets()),
            rx,
        )
        .await
        .unwrap();
    timeout(TEST_TIMEOUT, capture.wait()).await.unwrap().unwrap();

    assert_eq!(capture.stats().ticks, 2);
    let frame = capture.surface().snapshot().unwrap();
    assert_eq!(frame.get_pixel(320, 300), &view_color(ViewLabel::Front));
}

#[tokio::test]
async fn test_stop_while_reading_skips_inference() {
    let capture = new_loop();
    let frames = GatedFrameSource::gated_reads(3);
    let read_started = Arc::clone(&frames.read_started);
    let read_release = Arc::clone(&frames.read_release);
    let landmarks = CountingLandmarkSource::new(front_pose());
    let calls = Arc::clone(&landmarks.calls);
    let (_tx, rx) = watch::channel(TickSettings::default());

    capture
        .start(frames, landmarks, Arc::new(solid_assets()), rx)
        .await
        .unwrap();

    // The first read is pending when stop lands
    timeout(TEST_TIMEOUT, read_started.notified()).await.unwrap();
    capture.stop();
    read_release.notify_one();
    timeout(TEST_TIMEOUT, capture.wait()).await.unwrap().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(capture.stats(), StatsSnapshot::default());
    assert_eq!(capture.state(), LoopState::Idle);
    assert!(capture.surface().snapshot().is_none());
}

#[tokio::test]
async fn test_stale_session_does_not_touch_new_stats() {
    let capture = new_loop();
    let (_tx, rx) = watch::channel(TickSettings::default());
    let stale = GatedLandmarkSource::new(front_pose());
    let started = Arc::clone(&stale.started);
    let release = Arc::clone(&stale.release);
    let dropped = Arc::clone(&stale.dropped);

    capture
        .start(MockFrameSource::new(5), stale, Arc::new(solid_assets()), rx.clone())
        .await
        .unwrap();
    timeout(TEST_TIMEOUT, started.notified()).await.unwrap();
    capture.stop();

    // New session runs to completion while the old inference is still pending
    capture
        .start(
            MockFrameSource::new(0),
            FixedLandmarkSource::new(front_pose()),
            Arc::new(solid_assets()),
            rx,
        )
        .await
        .unwrap();
    timeout(TEST_TIMEOUT, capture.wait()).await.unwrap().unwrap();

    // Old session wakes up, discards its result and exits
    release.notify_one();
    timeout(TEST_TIMEOUT, dropped.notified()).await.unwrap();

    assert_eq!(capture.stats(), StatsSnapshot::default());
    assert_eq!(capture.state(), LoopState::Idle);
}

#[tokio::test]
async fn test_stop_while_requesting_never_activates() {
    let capture = Arc::new(new_loop());
    let frames = GatedFrameSource::gated_open(3);
    let open_started = Arc::clone(&frames.open_started);
    let open_release = Arc::clone(&frames.open_release);
    let (_tx, rx) = watch::channel(TickSettings::default());

    let starter = {
        let capture = Arc::clone(&capture);
        tokio::spawn(async move {
            capture
                .start(
                    frames,
                    FixedLandmarkSource::new(front_pose()),
                    Arc::new(solid_assets()),
                    rx,
                )
                .await
        })
    };

    timeout(TEST_TIMEOUT, open_started.notified()).await.unwrap();
    assert_eq!(capture.state(), LoopState::Requesting);
    capture.stop();
    assert_eq!(capture.state(), LoopState::Idle);

    open_release.notify_one();
    let result = timeout(TEST_TIMEOUT, starter).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert_eq!(capture.state(), LoopState::Idle);
    assert!(capture.last_error().is_none());

    // No session was spawned
    timeout(TEST_TIMEOUT, capture.wait()).await.unwrap().unwrap();
    assert_eq!(capture.stats(), StatsSnapshot::default());
    assert!(capture.surface().snapshot().is_none());
}

#[tokio::test]
async fn test_repeated_frame_errors_end_session() {
    let capture = new_loop();
    let frames = BrokenFrameSource::default();
    let reads = Arc::clone(&frames.reads);
    let landmarks = CountingLandmarkSource::new(front_pose());
    let calls = Arc::clone(&landmarks.calls);
    let (_tx, rx) = watch::channel(TickSettings::default());

    capture
        .start(frames, landmarks, Arc::new(solid_assets()), rx)
        .await
        .unwrap();
    timeout(TEST_TIMEOUT, capture.wait()).await.unwrap().unwrap();

    assert_eq!(reads.load(Ordering::SeqCst), 30);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(capture.state(), LoopState::Idle);
    assert_eq!(capture.stats().ticks, 0);
}

#[tokio::test]
async fn test_pose_settings_reach_landmark_source() {
    let mut config = Config::default();
    config.pose.model_complexity = 2;
    config.pose.min_detection_confidence = 0.7;
    let capture = CaptureLoop::new(config, SharedSurface::new());
    let landmarks = CountingLandmarkSource::new(front_pose());
    let configured = Arc::clone(&landmarks.configured);
    let calls = Arc::clone(&landmarks.calls);
    let (_tx, rx) = watch::channel(TickSettings::default());

    capture
        .start(MockFrameSource::new(2), landmarks, Arc::new(solid_assets()), rx)
        .await
        .unwrap();
    timeout(TEST_TIMEOUT, capture.wait()).await.unwrap().unwrap();

    let pose = configured.lock().clone().unwrap();
    assert_eq!(pose.model_complexity, 2);
    assert!((pose.min_detection_confidence - 0.7).abs() < f32::EPSILON);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
