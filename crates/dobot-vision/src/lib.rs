//! Facade crate for the `dobot-vision-*` workspace.
//!
//! Re-exports the layers under stable paths and ships the `dobot-vision`
//! command-line tool (feature `cli`, on by default).
//!
//! ## Quickstart
//!
//! ```no_run
//! use dobot_vision::core::sim::{CameraMount, SimObject, SimulatedQueue, SimulatedScene};
//! use dobot_vision::core::{FrameSize, Pose, QueueWaiter, QueuedArm};
//! use dobot_vision::task::SessionConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = SessionConfig::load_json("session.json")?;
//! let task = cfg.build_task(None)?;
//!
//! let queue = SimulatedQueue::new(Pose::new(200.0, 0.0, 50.0, 0.0));
//! let pair = cfg.calibration.ok_or("session has no calibration")?;
//! let mut scene = SimulatedScene::new(
//!     queue.clone(),
//!     CameraMount::Overhead { pair },
//!     FrameSize::new(320, 240),
//!     SimObject::at(230.0, 0.0),
//! );
//! let mut arm = QueuedArm::with_waiter(queue, QueueWaiter::immediate());
//! let report = task.run(&mut arm, &mut scene)?;
//! println!("picked at ({:.1}, {:.1})", report.target.x, report.target.y);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `dobot_vision::core`: poses, calibration, offset correction, arm and
//!   vision interfaces, reference locator, simulation.
//! - `dobot_vision::servo`: P/PI visual servo loop and background runner.
//! - `dobot_vision::task`: pick/place choreography and session config.

mod logging;

pub use dobot_vision_core as core;
pub use dobot_vision_servo as servo;
pub use dobot_vision_task as task;

pub use dobot_vision_core::{CalibrationMap, Pose, RobotPoint};
pub use dobot_vision_servo::VisualServoLoop;
pub use dobot_vision_task::{PickPlaceTask, SessionConfig};

pub use logging::{init_logging, level_for_verbosity};
