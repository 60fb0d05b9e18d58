//! Core types and hardware interfaces for vision-guided control of a desktop
//! arm.
//!
//! This crate holds everything the control layers share: the pose model,
//! the two-point image-to-robot [`CalibrationMap`], the sensor
//! [`offset_correction`], the [`ArmController`] and [`VisionPipeline`]
//! collaborator traits, and a blocking adapter over the arm's command queue.
//! It also ships a reference thresholding locator and a simulated arm/scene
//! pair for running the control code without hardware.

mod arm;
mod calibration;
mod camera;
mod frame;
mod locator;
mod logger;
mod offset;
mod pose;
mod queue;
pub mod sim;
mod vision;

pub use arm::{ArmController, ArmError};
pub use calibration::{Axis, CalibrationError, CalibrationMap, CalibrationPair, FrameSize};
pub use camera::{
    Camera, CameraBackend, CameraRegistry, CameraSlot, CameraStatus, RegistryPipeline,
};
pub use frame::{Frame, GrayView};
pub use locator::{binarize, otsu_threshold, MomentsLocator};
pub use offset::offset_correction;
pub use pose::{GripperCommand, MotionMode, PartialPose, Pose, RobotPoint};
pub use queue::{CommandQueue, QueueWaiter, QueuedArm};
pub use vision::{
    AngleLabel, BinarizationParams, Centroid, Detection, ObjectLocator, PosePredictor,
    ThresholdMethod, VisionError, VisionPipeline,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
