use crate::{GripperCommand, MotionMode, Pose};

/// Errors reported by the arm controller.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ArmError {
    #[error("arm connection is occupied by another process")]
    ConnectionOccupied,
    #[error("arm not found")]
    NotFound,
    #[error("arm did not answer in time")]
    Timeout,
    #[error("motion command {index} did not complete in time (executed index {executed})")]
    MotionTimeout { index: u64, executed: u64 },
    #[error("refusing to move to non-finite pose {0:?}")]
    InvalidPose(Pose),
    #[error("arm command failed: {0}")]
    Command(String),
}

/// Blocking arm interface consumed by the servo loop and the pick task.
///
/// Every call returns only once the arm has finished executing it, so the
/// next command is never issued while the previous one is still running.
pub trait ArmController {
    fn get_pose(&mut self) -> Result<Pose, ArmError>;

    fn move_to(&mut self, pose: &Pose, mode: MotionMode) -> Result<(), ArmError>;

    fn set_gripper(&mut self, command: GripperCommand) -> Result<(), ArmError>;

    fn clear_alarms(&mut self) -> Result<(), ArmError>;
}

impl<A: ArmController + ?Sized> ArmController for &mut A {
    fn get_pose(&mut self) -> Result<Pose, ArmError> {
        (**self).get_pose()
    }

    fn move_to(&mut self, pose: &Pose, mode: MotionMode) -> Result<(), ArmError> {
        (**self).move_to(pose, mode)
    }

    fn set_gripper(&mut self, command: GripperCommand) -> Result<(), ArmError> {
        (**self).set_gripper(command)
    }

    fn clear_alarms(&mut self) -> Result<(), ArmError> {
        (**self).clear_alarms()
    }
}
