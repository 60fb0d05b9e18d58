//! Image-based visual servoing for a desktop arm.
//!
//! [`VisualServoLoop`] repeatedly samples a frame, measures the pixel error
//! between the object centroid and the frame center and moves the arm by a
//! P or PI correction until the error falls inside a deadband. Pixel columns
//! drive robot `y` and pixel rows drive robot `x`.
//!
//! ```no_run
//! use dobot_vision_core::sim::{CameraMount, SimObject, SimulatedQueue, SimulatedScene};
//! use dobot_vision_core::{FrameSize, Pose, QueueWaiter, QueuedArm};
//! use dobot_vision_servo::VisualServoLoop;
//!
//! let queue = SimulatedQueue::new(Pose::new(210.0, 8.0, 40.0, 0.0));
//! let mut scene = SimulatedScene::new(
//!     queue.clone(),
//!     CameraMount::EyeInHand { px_per_mm: 1.0 },
//!     FrameSize::new(320, 240),
//!     SimObject::at(200.0, 0.0),
//! );
//! let mut arm = QueuedArm::with_waiter(queue, QueueWaiter::immediate());
//! let outcome = VisualServoLoop::default().run(&mut arm, &mut scene)?;
//! println!("centered at ({:.1}, {:.1})", outcome.pose.x, outcome.pose.y);
//! # Ok::<(), dobot_vision_servo::ServoError>(())
//! ```

mod error;
mod law;
mod params;
mod runner;
mod servo_loop;

pub use error::ServoError;
pub use law::{ControlLaw, ControlState, ServoGains};
pub use params::ServoParams;
pub use runner::{ServoHandle, ServoReport, ServoRunner};
pub use servo_loop::{CancelToken, ServoOutcome, ServoStep, VisualServoLoop};
