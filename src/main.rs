// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-session")]
#[command(about = "Drive a camera capture session against simulated hardware")]
#[command(version = camera_session::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List capture devices and their capabilities
    Devices,

    /// Take a photo
    Photo {
        /// Camera to use
        #[arg(short, long, value_enum, default_value_t = CameraArg::Back)]
        camera: CameraArg,

        /// Output file path (default: photos directory, IMG_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Filters applied in order (e.g. --filter mono --filter vignette)
        #[arg(short, long = "filter", value_parser = cli::parse_filter)]
        filters: Vec<camera_session::FilterType>,
    },

    /// Record a video
    Video {
        /// Camera to use
        #[arg(short, long, value_enum, default_value_t = CameraArg::Back)]
        camera: CameraArg,

        /// Recording duration in seconds
        #[arg(short, long, default_value = "3")]
        duration: u64,
    },

    /// Replay accelerometer samples and print the derived orientation
    Orientation {
        /// Camera whose frame tags are printed
        #[arg(short, long, value_enum, default_value_t = CameraArg::Back)]
        camera: CameraArg,

        /// Mirror the output
        #[arg(short, long)]
        mirror: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CameraArg {
    Back,
    Front,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camera_session=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Devices) => cli::list_devices(),
        Some(Commands::Photo {
            camera,
            output,
            filters,
        }) => cli::take_photo(camera.into(), output, filters),
        Some(Commands::Video { camera, duration }) => cli::record_video(camera.into(), duration),
        Some(Commands::Orientation { camera, mirror }) => {
            cli::replay_orientation(camera.into(), mirror)
        }
    }
}

impl From<CameraArg> for camera_session::backends::camera::CameraPosition {
    fn from(arg: CameraArg) -> Self {
        match arg {
            CameraArg::Back => Self::Back,
            CameraArg::Front => Self::Front,
        }
    }
}
