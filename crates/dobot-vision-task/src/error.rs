use dobot_vision_core::{ArmError, CalibrationError, VisionError};
use dobot_vision_servo::ServoError;

/// Terminal failure of a pick/place run.
///
/// Raised once from whichever step failed; earlier steps are not undone.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Vision(#[from] VisionError),
    #[error(transparent)]
    Servo(#[from] ServoError),
    #[error(transparent)]
    Arm(#[from] ArmError),
    #[error("retreat pose has not been taught")]
    MissingRetreatPose,
    #[error("init pose has not been taught")]
    MissingInitPose,
}
