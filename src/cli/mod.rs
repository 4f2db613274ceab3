//! depthtrack CLI entrypoint.

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::thread;

use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::calib;
use crate::calib::io as calib_io;
use crate::config::TrackerConfig;
use crate::core::camera::{DepthCamera, ReplaySource};
use crate::core::matrix::Mat4;
use crate::net::sender::UdpSink;
use crate::pipeline::TrackerPipeline;

/// depthtrack command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "depthtrack", version, about = "Depth-camera target tracker")]
struct CliArgs {
    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the live tracking loop.
    Track {
        /// Raw depth recording to replay as the frame source.
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Path to TOML configuration file.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// UDP destination(s), host:port. Overrides the config.
        #[arg(long = "dest", value_name = "ADDR")]
        destinations: Vec<String>,
        /// Fuse a second camera through the calibrated extrinsic.
        #[arg(long)]
        two_cameras: bool,
        /// Fixed detector seed for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run the offline calibration procedure.
    Calibrate {
        /// Raw depth recording with the scan and marker frames in order.
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Where to write the calibration file. Defaults to the name the
        /// tracker reads for the chosen camera mode.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Calibrate two cameras (bounds + extrinsic) instead of one.
        #[arg(long)]
        two_cameras: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid destination address '{0}'")]
    BadDestination(String),
    #[error("no destination addresses configured")]
    NoDestinations,
    #[error("failed to open depth source {path}: {source}")]
    SourceOpen {
        path: PathBuf,
        source: crate::core::camera::AcquisitionError,
    },
    #[error("failed to bind UDP socket: {0}")]
    SocketBind(std::io::Error),
    #[error("calibration failed: {0}")]
    Calibration(#[from] calib::CalibrationError),
    #[error("failed to write calibration file {path}: {source}")]
    CalibrationWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("tracking loop failed: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::ConfigRead { .. }
            | CliError::ConfigParse { .. }
            | CliError::BadDestination(_)
            | CliError::NoDestinations => ExitCode::from(1),
            CliError::SourceOpen { .. }
            | CliError::SocketBind(_)
            | CliError::Calibration(_)
            | CliError::CalibrationWrite { .. }
            | CliError::Pipeline(_) => ExitCode::from(2),
        }
    }
}

pub fn run() -> ExitCode {
    let cli = CliArgs::parse();
    init_logger(&resolve_log_level(&cli));

    let result = match cli.command {
        Command::Track {
            input,
            config,
            destinations,
            two_cameras,
            seed,
        } => run_track(input, config, destinations, two_cameras, seed),
        Command::Calibrate {
            input,
            output,
            two_cameras,
        } => run_calibrate(input, output, two_cameras),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            err.exit_code()
        }
    }
}

fn resolve_log_level(cli: &CliArgs) -> String {
    if let Some(level) = cli.log_level {
        return level.as_str().to_string();
    }
    if let Ok(level) = std::env::var("RUST_LOG") {
        if !level.trim().is_empty() {
            return level;
        }
    }
    "info".to_string()
}

fn init_logger(level: &str) {
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.filter_level(log::LevelFilter::Info);
    builder.parse_filters(level);
    builder.format(|buf, record| {
        use std::io::Write;
        let module = record.module_path().unwrap_or(record.target());
        writeln!(
            buf,
            "{} [{}] {}: {}",
            buf.timestamp_millis(),
            record.level(),
            module,
            record.args()
        )
    });

    if let Err(err) = builder.try_init() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<TrackerConfig, CliError> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&content).map_err(|source| CliError::ConfigParse {
                path: path.clone(),
                source,
            })
        }
        None => Ok(TrackerConfig::default()),
    }
}

fn parse_destinations(raw: &[String]) -> Result<Vec<SocketAddr>, CliError> {
    if raw.is_empty() {
        return Err(CliError::NoDestinations);
    }
    raw.iter()
        .map(|addr| {
            addr.parse()
                .map_err(|_| CliError::BadDestination(addr.clone()))
        })
        .collect()
}

fn run_track(
    input: PathBuf,
    config_path: Option<PathBuf>,
    dest_override: Vec<String>,
    two_cameras_flag: bool,
    seed: Option<u64>,
) -> Result<(), CliError> {
    let mut config = load_config(config_path.as_ref())?;
    if !dest_override.is_empty() {
        debug!("CLI override: destinations = {:?}", dest_override);
        config.destinations = dest_override;
    }
    if two_cameras_flag {
        config.two_cameras = true;
    }
    let destinations = parse_destinations(&config.destinations)?;

    // Calibration is advisory at startup: a missing file means identity
    // transform and default bounds, with the operator warned.
    let calibration_file = config.calibration_path();
    let mut detector_config = config.detector;
    let mut extrinsic = Mat4::IDENTITY;
    if config.two_cameras {
        match calib_io::load_record(&calibration_file) {
            Ok(record) => {
                info!(
                    "calibration loaded: floor {} mm, ceiling {} mm",
                    record.z_floor, record.z_ceiling
                );
                detector_config = detector_config
                    .with_height_bounds(record.z_floor as f32, record.z_ceiling as f32);
                extrinsic = record.extrinsic;
            }
            Err(err) => warn!(
                "could not read calibration file {}: {}; using identity transform and default bounds",
                calibration_file.display(),
                err
            ),
        }
    } else {
        match calib_io::load_bounds(&calibration_file) {
            Ok(bounds) => {
                info!(
                    "calibration loaded: floor {} mm, ceiling {} mm",
                    bounds.floor, bounds.ceiling
                );
                detector_config = detector_config
                    .with_height_bounds(bounds.floor as f32, bounds.ceiling as f32);
            }
            Err(err) => warn!(
                "could not read calibration file {}: {}; using default bounds",
                calibration_file.display(),
                err
            ),
        }
    }

    let mut source = ReplaySource::open(&input).map_err(|source| CliError::SourceOpen {
        path: input.clone(),
        source,
    })?;
    let mut sink = UdpSink::new(destinations).map_err(CliError::SocketBind)?;

    let primary = DepthCamera::primary(0);
    let secondary = config
        .two_cameras
        .then(|| DepthCamera::secondary(1, extrinsic));
    let mut pipeline = match seed {
        Some(seed) => TrackerPipeline::from_seed(
            primary,
            secondary,
            detector_config,
            config.fusion_tolerance,
            seed,
        ),
        None => TrackerPipeline::new(primary, secondary, detector_config, config.fusion_tolerance),
    };

    spawn_cancel_watcher(&pipeline);
    pipeline.run(&mut source, &mut sink)?;
    Ok(())
}

/// Watches stdin from its own thread and flips the shared cancellation flag
/// once. It touches no other shared state and exits right after.
fn spawn_cancel_watcher(pipeline: &TrackerPipeline) {
    let cancel = pipeline.cancel_handle();
    thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        cancel.store(true, Ordering::Relaxed);
    });
}

fn run_calibrate(
    input: PathBuf,
    output: Option<PathBuf>,
    two_cameras: bool,
) -> Result<(), CliError> {
    let output = output.unwrap_or_else(|| {
        PathBuf::from(if two_cameras {
            calib_io::TWO_CAMERA_FILE
        } else {
            calib_io::SINGLE_CAMERA_FILE
        })
    });
    let mut source = ReplaySource::open(&input).map_err(|source| CliError::SourceOpen {
        path: input.clone(),
        source,
    })?;

    if two_cameras {
        let mut primary = DepthCamera::primary(0);
        let mut secondary = DepthCamera::primary(1);
        let record = calib::calibrate_two_cameras(&mut source, &mut primary, &mut secondary)?;
        calib_io::save_record(&output, &record).map_err(|source| CliError::CalibrationWrite {
            path: output.clone(),
            source,
        })?;
        info!("calibration data saved to {}", output.display());
    } else {
        let mut camera = DepthCamera::primary(0);
        let bounds = calib::calibrate_single_camera(&mut source, &mut camera)?;
        calib_io::save_bounds(&output, &bounds).map_err(|source| CliError::CalibrationWrite {
            path: output.clone(),
            source,
        })?;
        info!("calibration data saved to {}", output.display());
    }
    Ok(())
}
