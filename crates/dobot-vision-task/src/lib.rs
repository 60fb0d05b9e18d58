//! Vision-guided pick and place for a desktop arm.
//!
//! [`PickPlaceTask`] locates an object either through a fixed overhead
//! camera and the two-point calibration, or by visually servoing an
//! arm-mounted camera over it, then runs a fixed eleven-call grasp and
//! drop-off choreography. [`SessionConfig`] persists the taught poses and
//! tuning as JSON.

mod config;
mod error;
mod params;
mod task;

pub use config::{ApproachMode, ConfigIoError, SessionConfig, SessionConfigError};
pub use error::TaskError;
pub use params::{PickParams, TaughtPoses};
pub use task::{choreography, AngleSource, Approach, PickPlaceTask, PickReport, Step};
