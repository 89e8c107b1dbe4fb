// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera session operations
//!
//! This module provides command-line functionality for:
//! - Listing capture devices
//! - Taking photos
//! - Recording videos
//! - Replaying accelerometer samples through the orientation tracker
//!
//! Every command runs a real [`SessionRuntime`] against simulated hardware.

use camera_session::app::{OrientationTracker, SessionRuntime};
use camera_session::backends::camera::{
    CameraPosition, CapturedMedia, DeviceKind, DeviceRegistry, OutputType,
};
use camera_session::backends::motion::Acceleration;
use camera_session::backends::simulated::SimulatedHardware;
use camera_session::backends::surface::UiRotation;
use camera_session::storage::MediaLibrary;
use camera_session::{Config, FilterType, Message, SessionPhase, SessionSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);
const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const PREVIEW_WIDTH: u32 = 640;
const PREVIEW_HEIGHT: u32 = 480;

/// Parse a filter name as given on the command line
pub fn parse_filter(name: &str) -> Result<FilterType, String> {
    let wanted = name.replace(['-', '_'], "").to_lowercase();
    FilterType::ALL
        .into_iter()
        .find(|filter| format!("{:?}", filter).to_lowercase() == wanted)
        .ok_or_else(|| {
            let names: Vec<String> = FilterType::ALL
                .iter()
                .map(|f| format!("{:?}", f).to_lowercase())
                .collect();
            format!("unknown filter '{}' (available: {})", name, names.join(", "))
        })
}

/// List all capture devices
pub fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    let hardware = SimulatedHardware::new();
    let registry = DeviceRegistry::new(hardware.camera.clone());
    let devices = registry.resolve_devices()?;

    println!("Capture devices:");
    println!();
    for device in [&devices.back, &devices.front, &devices.microphone]
        .into_iter()
        .flatten()
    {
        let kind = match device.info.kind {
            DeviceKind::Camera(position) => format!("{} camera", position),
            DeviceKind::Microphone => "microphone".to_string(),
        };
        println!("  {} ({}) [{}]", device.name(), device.id(), kind);

        if device.position().is_some() {
            let caps = &device.capabilities;
            let (min_zoom, max_zoom) = caps.zoom_range();
            println!("      Zoom: {:.1}x-{:.1}x", min_zoom, max_zoom);
            println!("      Frame rate: up to {}fps", caps.max_frame_rate());
            println!(
                "      ISO: {:.0}-{:.0}, bias {:+.1}..{:+.1} EV",
                caps.min_iso, caps.max_iso, caps.min_exposure_bias, caps.max_exposure_bias
            );
            println!(
                "      Flash: {}, torch: {}, HDR: {}, focus point: {}",
                yes_no(caps.has_flash),
                yes_no(caps.has_torch),
                yes_no(caps.supports_hdr),
                yes_no(caps.supports_focus_point)
            );
        }
        println!();
    }

    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Take a photo with the given camera and filter chain
pub fn take_photo(
    camera: CameraPosition,
    output: Option<PathBuf>,
    filters: Vec<FilterType>,
) -> Result<(), Box<dyn std::error::Error>> {
    let library = MediaLibrary::new();
    let hardware = SimulatedHardware::new().with_storage(library.clone());
    let config = Config {
        camera_position: camera,
        output_type: OutputType::Photo,
        filters,
        ..Config::load()
    };

    let rt = tokio::runtime::Runtime::new()?;
    let output_path = rt.block_on(capture_photo(config, hardware, library, output))?;

    println!("Photo saved: {}", output_path.display());
    Ok(())
}

async fn capture_photo(
    config: Config,
    hardware: SimulatedHardware,
    library: MediaLibrary,
    output: Option<PathBuf>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let camera = config.camera_position;
    let runtime = SessionRuntime::spawn(config, hardware.collaborators());
    let handle = runtime.handle();

    start_session(&handle, &hardware).await?;
    println!("Using camera: {}", camera);

    // Wait for the first preview frame so the capture has a current orientation
    handle
        .wait_for(STARTUP_TIMEOUT, |s| s.stats.submitted > 0)
        .await
        .ok_or("No preview frames received")?;

    println!("Capturing...");
    handle.send(Message::CaptureOutput);
    let snapshot = handle
        .wait_for(STARTUP_TIMEOUT, |s| {
            s.attributes.captured_media.is_some() || s.attributes.error.is_some()
        })
        .await
        .ok_or("Timed out waiting for the photo")?;

    hardware.camera.stop_frame_source();
    runtime.shutdown().await;

    let image = match snapshot.attributes.captured_media {
        Some(CapturedMedia::Image(image)) => image,
        _ => return Err(describe_failure(&snapshot).into()),
    };

    // The preview filter chain also applies to the saved photo
    let image = match camera_session::pipelines::filters::apply_chain(
        &image,
        &snapshot.attributes.filters,
    ) {
        Some(filtered) => Arc::new(filtered),
        None => image,
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            image.save_with_format(&path, image::ImageFormat::Png)?;
            Ok(path)
        }
        None => Ok(library.save_photo(image).await?),
    }
}

/// Record for `duration` seconds or until Ctrl+C
pub fn record_video(camera: CameraPosition, duration: u64) -> Result<(), Box<dyn std::error::Error>> {
    let hardware = SimulatedHardware::new().with_storage(MediaLibrary::new());
    let config = Config {
        camera_position: camera,
        output_type: OutputType::Video,
        ..Config::load()
    };

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let rt = tokio::runtime::Runtime::new()?;
    let video_path = rt.block_on(capture_video(config, hardware, duration, stop_flag))?;

    println!("Video finalized: {}", video_path.display());
    Ok(())
}

async fn capture_video(
    config: Config,
    hardware: SimulatedHardware,
    duration: u64,
    stop_flag: Arc<AtomicBool>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let camera = config.camera_position;
    let runtime = SessionRuntime::spawn(config, hardware.collaborators());
    let handle = runtime.handle();

    start_session(&handle, &hardware).await?;
    println!("Using camera: {}", camera);

    handle.send(Message::CaptureOutput);
    handle
        .wait_for(STARTUP_TIMEOUT, |s| {
            s.attributes.is_recording || s.attributes.error.is_some()
        })
        .await
        .filter(|s| s.attributes.is_recording)
        .ok_or("Recording did not start")?;

    println!();
    println!("Recording... (press Ctrl+C to stop early)");

    let start = Instant::now();
    let target_duration = Duration::from_secs(duration);
    while start.elapsed() < target_duration {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        let elapsed = handle.snapshot().attributes.recording_time.as_secs();
        print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
        std::io::Write::flush(&mut std::io::stdout())?;

        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    println!();

    handle.send(Message::CaptureOutput);
    let snapshot = handle
        .wait_for(STARTUP_TIMEOUT, |s| {
            matches!(s.attributes.captured_media, Some(CapturedMedia::Video(_)))
                || s.attributes.error.is_some()
        })
        .await
        .ok_or("Timed out waiting for the recording to finish")?;

    hardware.camera.stop_frame_source();
    runtime.shutdown().await;

    match snapshot.attributes.captured_media {
        Some(CapturedMedia::Video(path)) => Ok(path),
        _ => Err(describe_failure(&snapshot).into()),
    }
}

async fn start_session(
    handle: &camera_session::SessionHandle,
    hardware: &SimulatedHardware,
) -> Result<(), Box<dyn std::error::Error>> {
    hardware
        .camera
        .start_frame_source(FRAME_INTERVAL, PREVIEW_WIDTH, PREVIEW_HEIGHT);
    handle.send(Message::Setup);

    let snapshot = handle
        .wait_for(STARTUP_TIMEOUT, |s| {
            s.phase == SessionPhase::Running || s.attributes.error.is_some()
        })
        .await
        .ok_or("Timed out starting the capture session")?;

    if snapshot.phase != SessionPhase::Running {
        return Err(describe_failure(&snapshot).into());
    }
    Ok(())
}

fn describe_failure(snapshot: &SessionSnapshot) -> String {
    match &snapshot.attributes.error {
        Some(error) => error.to_string(),
        None => format!("Session ended in phase {:?}", snapshot.phase),
    }
}

/// Feed a scripted rotation through the orientation tracker
pub fn replay_orientation(camera: CameraPosition, mirror: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Device turned from portrait to landscape and back, passing the diagonals
    let samples = [
        (0.0, -1.0, UiRotation::Portrait),
        (0.5, -0.6, UiRotation::Portrait),
        (0.9, -0.2, UiRotation::Portrait),
        (1.0, 0.0, UiRotation::LandscapeRight),
        (0.0, 1.0, UiRotation::LandscapeRight),
        (0.0, 0.95, UiRotation::PortraitUpsideDown),
        (-1.0, 0.0, UiRotation::LandscapeLeft),
        (-0.3, -0.8, UiRotation::Portrait),
    ];

    let mut tracker = OrientationTracker::new();
    println!(
        "{:>6} {:>6}  {:<20} {:<20} {:<14} {}",
        "x", "y", "ui rotation", "logical", "frame tag", "blocked"
    );
    for (x, y, rotation) in samples {
        tracker.update_logical(&Acceleration::new(x, y, 0.0));
        let tag = tracker.update_frame_tag(camera, rotation, mirror);
        println!(
            "{:>6.2} {:>6.2}  {:<20} {:<20} {:<14} {}",
            x,
            y,
            format!("{:?}", rotation),
            format!("{:?}", tracker.logical()),
            format!("{:?}", tag),
            yes_no(tracker.user_blocked_rotation(rotation))
        );
    }
    Ok(())
}
