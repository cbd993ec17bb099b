//! Integration tests for the per-frame garment pipeline


use pose_tryon::{
    classifier::ViewLabel,
    config::{ClassifierMode, Config},
    landmarks::PoseFrame,
    pipeline::{Pipeline, SkipReason, TickSettings},
    render::SharedSurface,
    tint::Color,
};
use test_helpers::*;

fn run_tick(pipeline: &mut Pipeline, pose: &PoseFrame, settings: &TickSettings) -> (SharedSurface, pose_tryon::pipeline::TickOutcome) {
    let surface = SharedSurface::new();
    let outcome = pipeline.composite(&surface, &video_frame(0), pose, &solid_assets(), settings);
    (surface, outcome)
}

/// Square-on body with a visible nose selects the front art
#[test]
fn test_scenario_front() {
    let mut pipeline = Pipeline::default();
    let (surface, outcome) = run_tick(&mut pipeline, &front_pose(), &TickSettings::default());

    assert_eq!(outcome.view, Some(ViewLabel::Front));
    assert!(outcome.garment_drawn());
    let frame = surface.snapshot().unwrap();
    assert_eq!(frame.get_pixel(320, 300), &view_color(ViewLabel::Front));
}

/// Hidden nose selects the back art
#[test]
fn test_scenario_back() {
    let mut pipeline = Pipeline::default();
    let (surface, outcome) = run_tick(&mut pipeline, &back_pose(), &TickSettings::default());

    assert_eq!(outcome.view, Some(ViewLabel::Back));
    let frame = surface.snapshot().unwrap();
    assert_eq!(frame.get_pixel(320, 300), &view_color(ViewLabel::Back));
}

/// Narrow shoulders with depth ordering select a side view
#[test]
fn test_scenario_right_profile() {
    let mut pipeline = Pipeline::default();
    let (surface, outcome) = run_tick(&mut pipeline, &right_profile_pose(), &TickSettings::default());

    assert_eq!(outcome.view, Some(ViewLabel::Right));
    let placement = outcome.placement.unwrap();
    // Torso height 144 px scaled by the side factor
    assert!((placement.scale - 144.0 * 1.6).abs() < 1e-2);
    let frame = surface.snapshot().unwrap();
    assert_eq!(frame.get_pixel(320, 300), &view_color(ViewLabel::Right));
}

/// A low-visibility shoulder means no view and a bare background
#[test]
fn test_scenario_no_confident_view() {
    let mut pipeline = Pipeline::default();
    let (surface, outcome) = run_tick(&mut pipeline, &occluded_pose(), &TickSettings::default());

    assert_eq!(outcome.view, None);
    assert_eq!(outcome.skipped, Some(SkipReason::NoView));
    assert_eq!(surface.snapshot().unwrap().as_raw(), background().as_raw());
}

#[test]
fn test_overlay_does_not_leak_into_next_tick() {
    let mut pipeline = Pipeline::default();
    let surface = SharedSurface::new();
    let assets = solid_assets();
    let settings = TickSettings::default();

    pipeline.composite(&surface, &video_frame(0), &front_pose(), &assets, &settings);
    assert_ne!(surface.snapshot().unwrap().as_raw(), background().as_raw());

    pipeline.composite(&surface, &video_frame(1), &occluded_pose(), &assets, &settings);
    assert_eq!(surface.snapshot().unwrap().as_raw(), background().as_raw());
}

#[test]
fn test_tinted_overlay() {
    let mut pipeline = Pipeline::default();
    let settings = TickSettings {
        color: Color::new(0, 0, 255),
        heading: None,
    };
    let (surface, outcome) = run_tick(&mut pipeline, &front_pose(), &settings);
    assert!(outcome.garment_drawn());

    // 200*0.4 = 80 red, 255*0.6 = 153 blue, alpha kept
    let pixel = *surface.snapshot().unwrap().get_pixel(320, 300);
    assert_eq!(pixel.0, [80, 0, 153, 255]);
}

#[test]
fn test_heading_mode_selects_view_from_angle() {
    let mut config = Config::default();
    config.classifier.mode = ClassifierMode::Heading;
    let mut pipeline = Pipeline::new(&config);

    for (heading, expected) in [
        (0.0, ViewLabel::Front),
        (90.0, ViewLabel::Right),
        (180.0, ViewLabel::Back),
        (270.0, ViewLabel::Left),
        (-30.0, ViewLabel::Front),
    ] {
        let settings = TickSettings {
            color: Color::WHITE,
            heading: Some(heading),
        };
        let (_, outcome) = run_tick(&mut pipeline, &front_pose(), &settings);
        assert_eq!(outcome.view, Some(expected), "heading {heading}");
    }
}

#[test]
fn test_debounce_holds_view_through_flicker() {
    let mut config = Config::default();
    config.classifier.debounce_ticks = 3;
    let mut pipeline = Pipeline::new(&config);
    let settings = TickSettings::default();

    assert_eq!(run_tick(&mut pipeline, &front_pose(), &settings).1.view, Some(ViewLabel::Front));
    assert_eq!(run_tick(&mut pipeline, &back_pose(), &settings).1.view, Some(ViewLabel::Front));
    assert_eq!(run_tick(&mut pipeline, &front_pose(), &settings).1.view, Some(ViewLabel::Front));

    for _ in 0..2 {
        assert_eq!(run_tick(&mut pipeline, &back_pose(), &settings).1.view, Some(ViewLabel::Front));
    }
    assert_eq!(run_tick(&mut pipeline, &back_pose(), &settings).1.view, Some(ViewLabel::Back));
}

#[test]
fn test_snapshot_export() {
    let mut pipeline = Pipeline::default();
    let (surface, _) = run_tick(&mut pipeline, &front_pose(), &TickSettings::default());

    let path = std::env::temp_dir().join(format!("pose_tryon_snapshot_{}.png", std::process::id()));
    assert!(surface.save_snapshot(&path).unwrap());

    let saved = image::open(&path).unwrap().to_rgba8();
    assert_eq!(saved.dimensions(), (FRAME_WIDTH, FRAME_HEIGHT));
    assert_eq!(saved.get_pixel(320, 300), &view_color(ViewLabel::Front));
    std::fs::remove_file(&path).ok();
}
