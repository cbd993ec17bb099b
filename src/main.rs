//! Garment overlay application: composites a garment onto camera or recorded frames.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use pose_tryon::{
    app::CaptureLoop,
    assets::GarmentAssets,
    config::Config,
    frame::FrameSource,
    orientation::{HeadingSource, OrientationAdapter, OrientationPermission},
    pipeline::TickSettings,
    render::SharedSurface,
    replay::{DirectoryFrameSource, ReplayLandmarkSource},
    tint::Color,
};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of PNG frames to process
    #[arg(short, long)]
    frames: Option<PathBuf>,

    /// Camera index to use instead of recorded frames
    #[cfg(feature = "camera")]
    #[arg(long)]
    camera: Option<i32>,

    /// Recorded pose landmarks (JSON array of pose frames)
    #[arg(short, long)]
    landmarks: Option<PathBuf>,

    /// Directory holding front/back/left/right garment images
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Garment color as #RRGGBB (neutral color draws the garment as-is)
    #[arg(long)]
    color: Option<String>,

    /// Fixed body heading in degrees, as from a device sensor
    #[arg(long, allow_hyphen_values = true)]
    heading: Option<f32>,

    /// Pointer position as a fraction of the view width (0.0 to 1.0)
    #[arg(long)]
    pointer_x: Option<f32>,

    /// Directory for rendered frames and the final snapshot
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    example_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.example_config {
        print!("{}", pose_tryon::config::EXAMPLE_CONFIG);
        return Ok(());
    }

    info!("Pose-guided garment overlay");

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    // Command line overrides
    if let Some(assets) = &args.assets {
        config.assets.directory.clone_from(assets);
    }
    if let Some(output) = &args.output {
        config.output.directory.clone_from(output);
    }
    config.validate().context("Invalid configuration")?;

    let settings = TickSettings {
        color: resolve_color(&config, args.color.as_deref())?,
        heading: resolve_heading(config.orientation.source, args.heading, args.pointer_x),
    };
    info!("Garment color {}", settings.color);
    let (_settings_tx, settings_rx) = watch::channel(settings);

    let assets = Arc::new(
        GarmentAssets::load_dir_async(config.assets.clone())
            .await
            .context("Failed to load garment assets")?,
    );

    let landmarks = match &args.landmarks {
        Some(path) => ReplayLandmarkSource::from_file(path)
            .with_context(|| format!("Failed to read landmarks from {}", path.display()))?,
        None => {
            warn!("No landmark recording given, frames will show the background only");
            ReplayLandmarkSource::default()
        }
    };

    std::fs::create_dir_all(&config.output.directory)
        .with_context(|| format!("Cannot create {}", config.output.directory.display()))?;

    #[cfg(feature = "camera")]
    if let Some(index) = args.camera {
        let camera = pose_tryon::camera::OpenCvCamera::new(index);
        return run(config, camera, landmarks, assets, settings_rx).await;
    }

    let Some(frames) = args.frames else {
        bail!("No frame source: pass --frames <dir>");
    };
    run(config, DirectoryFrameSource::new(frames), landmarks, assets, settings_rx).await
}

/// Run one capture session to completion or Ctrl-C
async fn run<C: FrameSource + 'static>(
    config: Config,
    frames: C,
    landmarks: ReplayLandmarkSource,
    assets: Arc<GarmentAssets>,
    settings: watch::Receiver<TickSettings>,
) -> Result<()> {
    let output = config.output.clone();
    let mut capture = CaptureLoop::new(config, SharedSurface::new());
    if output.write_frames {
        capture = capture.with_frame_output(&output.directory);
    }
    let capture = Arc::new(capture);

    capture.start(frames, landmarks, assets, settings).await?;

    let stopper = Arc::clone(&capture);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Exit requested by user");
            stopper.stop();
        }
    });
    capture.wait().await?;

    let snapshot = output.directory.join("snapshot.png");
    if capture.surface().save_snapshot(&snapshot)? {
        info!("Saved snapshot to {}", snapshot.display());
    }
    info!("Application shutting down: {}", capture.stats());

    Ok(())
}

fn resolve_color(config: &Config, requested: Option<&str>) -> Result<Color> {
    let Some(requested) = requested else {
        return Ok(config.tint.neutral_color);
    };
    let color: Color = requested.parse()?;
    if !config.tint.palette.contains(&color) {
        warn!("Color {} is not in the configured palette", color);
    }
    Ok(color)
}

/// Heading from the preferred source, falling back to whichever one was given
fn resolve_heading(preferred: HeadingSource, heading: Option<f32>, pointer_x: Option<f32>) -> Option<f32> {
    let use_device = match (preferred, heading, pointer_x) {
        (_, None, None) => return None,
        (HeadingSource::Device, Some(_), _) | (_, Some(_), None) => true,
        _ => false,
    };

    let mut adapter = OrientationAdapter::new();
    let sample = if use_device {
        adapter.apply_permission(OrientationPermission::Granted);
        adapter.on_device_rotation(heading)
    } else {
        if preferred == HeadingSource::Device {
            adapter.apply_permission(OrientationPermission::Unsupported);
        }
        pointer_x.and_then(|x| adapter.on_pointer_move(x, 1.0))
    };
    sample.map(|s| s.heading_degrees)
}
