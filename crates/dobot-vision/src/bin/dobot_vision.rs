use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use dobot_vision::core::sim::{CameraMount, SimObject, SimulatedQueue, SimulatedScene};
use dobot_vision::core::{
    offset_correction, CalibrationError, FrameSize, Pose, QueueWaiter, QueuedArm,
};
use dobot_vision::init_logging;
use dobot_vision::servo::ServoError;
use dobot_vision::task::{ApproachMode, ConfigIoError, SessionConfig, SessionConfigError, TaskError};
use nalgebra::Point2;
use serde::Serialize;

const DEFAULT_HOME: Pose = Pose {
    x: 200.0,
    y: 0.0,
    z: 50.0,
    r: 0.0,
    joints: None,
};

/// Vision-guided pick/place tools for a desktop arm.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines (needs the `tracing` feature).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a session config template.
    InitConfig {
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Map a pixel centroid to robot XY through the session calibration.
    Map {
        #[arg(long)]
        config: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        cx: f64,
        #[arg(long, allow_negative_numbers = true)]
        cy: f64,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Print the sensor offset correction for a base-joint angle.
    Offset {
        #[arg(long, allow_negative_numbers = true)]
        offset: f64,
        #[arg(long, allow_negative_numbers = true)]
        joint1: f64,
    },
    /// Run the servo loop against a simulated eye-in-hand camera.
    SimulateServo {
        #[arg(long)]
        config: PathBuf,
        /// Start pose XY; z and r come from the init pose.
        #[arg(long, allow_negative_numbers = true, default_value_t = 240.0)]
        start_x: f64,
        #[arg(long, allow_negative_numbers = true, default_value_t = 30.0)]
        start_y: f64,
        #[command(flatten)]
        scene: SceneArgs,
    },
    /// Run a full pick/place against the simulator.
    SimulatePick {
        #[arg(long)]
        config: PathBuf,
        /// Locate by servoing instead of the overhead calibration.
        #[arg(long)]
        servo: bool,
        #[command(flatten)]
        scene: SceneArgs,
    },
}

#[derive(Debug, Args)]
struct SceneArgs {
    #[arg(long, allow_negative_numbers = true, default_value_t = 230.0)]
    object_x: f64,
    #[arg(long, allow_negative_numbers = true, default_value_t = 0.0)]
    object_y: f64,
    /// Object orientation in the image, degrees.
    #[arg(long, allow_negative_numbers = true, default_value_t = 0.0)]
    object_angle: f64,
    #[arg(long, default_value_t = 320)]
    width: u32,
    #[arg(long, default_value_t = 240)]
    height: u32,
    /// Eye-in-hand magnification.
    #[arg(long, default_value_t = 1.0)]
    px_per_mm: f64,
    /// Also write the JSON report here.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl SceneArgs {
    fn object(&self) -> SimObject {
        SimObject::at(self.object_x, self.object_y).with_angle(self.object_angle)
    }

    fn frame(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    ConfigIo(#[from] ConfigIoError),
    #[error(transparent)]
    Session(#[from] SessionConfigError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Servo(#[from] ServoError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Logger(#[from] log::SetLoggerError),
    #[error("{} already exists (pass --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json)?;

    match cli.command {
        Command::InitConfig { path, force } => init_config(&path, force),
        Command::Map {
            config,
            cx,
            cy,
            width,
            height,
        } => {
            let cfg = SessionConfig::load_json(&config)?;
            let map = cfg.calibration_map()?;
            let point = map.map(Point2::new(cx, cy), FrameSize::new(width, height))?;
            print_json(&point, None)
        }
        Command::Offset { offset, joint1 } => {
            match offset_correction(offset, joint1) {
                Some(c) => print_json(&c, None)?,
                None => println!("none"),
            }
            Ok(())
        }
        Command::SimulateServo {
            config,
            start_x,
            start_y,
            scene,
        } => simulate_servo(&config, start_x, start_y, &scene),
        Command::SimulatePick {
            config,
            servo,
            scene,
        } => simulate_pick(&config, servo, &scene),
    }
}

fn init_config(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::AlreadyExists(path.to_path_buf()));
    }
    SessionConfig::template().write_json(path)?;
    log::info!("wrote session template to {}", path.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(out) = out {
        fs::write(out, &json)?;
        log::info!("report written to {}", out.display());
    }
    println!("{json}");
    Ok(())
}

fn home_pose(cfg: &SessionConfig) -> Pose {
    cfg.poses
        .init
        .map(|p| p.complete_with(&DEFAULT_HOME))
        .unwrap_or(DEFAULT_HOME)
}

#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip_all))]
fn simulate_servo(
    config: &Path,
    start_x: f64,
    start_y: f64,
    scene: &SceneArgs,
) -> Result<(), CliError> {
    let cfg = SessionConfig::load_json(config)?;
    let home = home_pose(&cfg);
    let queue = SimulatedQueue::new(Pose::new(start_x, start_y, home.z, home.r));
    let mut camera = SimulatedScene::new(
        queue.clone(),
        CameraMount::EyeInHand {
            px_per_mm: scene.px_per_mm,
        },
        scene.frame(),
        scene.object(),
    );
    let mut arm = QueuedArm::with_waiter(queue, QueueWaiter::immediate());
    let outcome = cfg.servo_loop().run(&mut arm, &mut camera)?;
    print_json(&outcome, scene.out.as_deref())
}

#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip_all))]
fn simulate_pick(config: &Path, servo: bool, scene: &SceneArgs) -> Result<(), CliError> {
    let cfg = SessionConfig::load_json(config)?;
    let mode = if servo {
        ApproachMode::Servo
    } else {
        cfg.approach
    };
    let task = cfg.build_task(Some(mode))?;
    let queue = SimulatedQueue::new(home_pose(&cfg));
    let mount = match mode {
        ApproachMode::Servo => CameraMount::EyeInHand {
            px_per_mm: scene.px_per_mm,
        },
        ApproachMode::Calibrated => CameraMount::Overhead {
            pair: cfg.calibration_map()?.pair,
        },
    };
    let mut camera = SimulatedScene::new(queue.clone(), mount, scene.frame(), scene.object());
    let mut arm = QueuedArm::with_waiter(queue.clone(), QueueWaiter::immediate());
    let report = task.run(&mut arm, &mut camera)?;
    log::info!("simulated arm received {} commands", queue.events().len());
    print_json(&report, scene.out.as_deref())
}
