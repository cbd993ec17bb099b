//! Tests for the command-line binary
//!
//! These run the built `pose-tryon` binary against generated frames,
//! recorded landmarks and garment assets in a temporary directory.


use pose_tryon::{classifier::ViewLabel, config::Config};
use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};
use test_helpers::*;

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pose-tryon"))
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pose_tryon_cli_{name}_{}", std::process::id()));
    std::fs::remove_dir_all(&dir).ok();
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Two frames, a front and a back pose, and all four assets
fn write_session(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let frames = dir.join("frames");
    let assets = dir.join("assets");
    std::fs::create_dir_all(&frames).unwrap();
    std::fs::create_dir_all(&assets).unwrap();

    background().save(frames.join("0000.png")).unwrap();
    background().save(frames.join("0001.png")).unwrap();

    for (view, file) in [
        (ViewLabel::Front, "front.png"),
        (ViewLabel::Back, "back.png"),
        (ViewLabel::Left, "left.png"),
        (ViewLabel::Right, "right.png"),
    ] {
        image::RgbaImage::from_pixel(20, 30, view_color(view))
            .save(assets.join(file))
            .unwrap();
    }

    let landmarks = dir.join("landmarks.json");
    let recording = serde_json::to_string(&vec![front_pose(), back_pose()]).unwrap();
    std::fs::write(&landmarks, recording).unwrap();

    (frames, landmarks, assets)
}

fn run(args: &[&str]) -> Output {
    binary().args(args).output().expect("Failed to run binary")
}

#[test]
fn test_help_lists_options() {
    let output = run(&["--help"]);
    assert!(output.status.success());

    let help = String::from_utf8_lossy(&output.stdout);
    for option in ["--frames", "--landmarks", "--assets", "--color", "--heading", "--pointer-x", "--output"] {
        assert!(help.contains(option), "help is missing {option}");
    }
}

#[test]
fn test_example_config_is_valid() {
    let output = run(&["--example-config"]);
    assert!(output.status.success());

    let config: Config = serde_yaml::from_slice(&output.stdout).unwrap();
    config.validate().unwrap();
}

#[test]
fn test_offline_session_writes_frames() {
    let dir = scratch_dir("session");
    let (frames, landmarks, assets) = write_session(&dir);
    let out = dir.join("out");

    let output = run(&[
        "--frames",
        frames.to_str().unwrap(),
        "--landmarks",
        landmarks.to_str().unwrap(),
        "--assets",
        assets.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let first = image::open(out.join("frame_00000.png")).unwrap().to_rgba8();
    assert_eq!(first.get_pixel(320, 300), &view_color(ViewLabel::Front));
    let second = image::open(out.join("frame_00001.png")).unwrap().to_rgba8();
    assert_eq!(second.get_pixel(320, 300), &view_color(ViewLabel::Back));

    let snapshot = image::open(out.join("snapshot.png")).unwrap().to_rgba8();
    assert_eq!(snapshot.as_raw(), second.as_raw());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_offline_session_with_color() {
    let dir = scratch_dir("color");
    let (frames, landmarks, assets) = write_session(&dir);
    let out = dir.join("out");

    let output = run(&[
        "--frames",
        frames.to_str().unwrap(),
        "--landmarks",
        landmarks.to_str().unwrap(),
        "--assets",
        assets.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
        "--color",
        "#0000FF",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let first = image::open(out.join("frame_00000.png")).unwrap().to_rgba8();
    assert_eq!(first.get_pixel(320, 300).0, [80, 0, 153, 255]);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_frame_source_fails() {
    let dir = scratch_dir("noframes");
    let (_, _, assets) = write_session(&dir);

    let output = run(&["--assets", assets.to_str().unwrap(), "--output", dir.join("out").to_str().unwrap()]);
    assert!(!output.status.success());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_invalid_color_fails() {
    let dir = scratch_dir("badcolor");
    let (frames, _, assets) = write_session(&dir);

    let output = run(&[
        "--frames",
        frames.to_str().unwrap(),
        "--assets",
        assets.to_str().unwrap(),
        "--output",
        dir.join("out").to_str().unwrap(),
        "--color",
        "purple",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("color"));

    std::fs::remove_dir_all(&dir).ok();
}
