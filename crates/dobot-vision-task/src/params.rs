use dobot_vision_core::{BinarizationParams, MotionMode, PartialPose, Pose};
use serde::{Deserialize, Serialize};

use crate::TaskError;

fn default_lift_z() -> f64 {
    20.0
}

/// Operator-taught poses the choreography moves between.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaughtPoses {
    /// Drop-off location.
    #[serde(default)]
    pub retreat: Option<PartialPose>,
    /// Resting pose the task returns to.
    #[serde(default)]
    pub init: Option<PartialPose>,
}

impl TaughtPoses {
    pub fn new(retreat: Pose, init: Pose) -> Self {
        Self {
            retreat: Some(retreat.into()),
            init: Some(init.into()),
        }
    }

    /// Complete both poses from `current`, failing if either was never taught.
    pub fn resolve(&self, current: &Pose) -> Result<(Pose, Pose), TaskError> {
        let retreat = self.retreat.ok_or(TaskError::MissingRetreatPose)?;
        let init = self.init.ok_or(TaskError::MissingInitPose)?;
        Ok((retreat.complete_with(current), init.complete_with(current)))
    }
}

/// Heights, orientation and motion settings for a pick/place run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PickParams {
    /// Travel height used above the object and above the drop-off.
    #[serde(default = "default_lift_z")]
    pub lift_z: f64,
    /// Grasp depth at the object. Defaults to the retreat pose height.
    #[serde(default)]
    pub grasp_z: Option<f64>,
    /// Rotate the end effector to `angle - 90` when an angle is available.
    #[serde(default)]
    pub orient: bool,
    /// Distance from the gripper center to an offset camera, millimetres.
    /// Only applied after a servo approach.
    #[serde(default)]
    pub sensor_offset: f64,
    #[serde(default)]
    pub motion_mode: MotionMode,
    #[serde(default)]
    pub binarization: BinarizationParams,
}

impl Default for PickParams {
    fn default() -> Self {
        Self {
            lift_z: default_lift_z(),
            grasp_z: None,
            orient: false,
            sensor_offset: 0.0,
            motion_mode: MotionMode::default(),
            binarization: BinarizationParams::default(),
        }
    }
}
