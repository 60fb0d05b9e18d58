use std::time::Duration;

use dobot_vision_core::{BinarizationParams, MotionMode};
use serde::{Deserialize, Serialize};

use crate::{ControlLaw, ServoGains};

fn default_deadband_px() -> f64 {
    10.0
}

fn default_max_iterations() -> Option<usize> {
    Some(200)
}

fn default_motion_mode() -> MotionMode {
    MotionMode::MoveL
}

/// Configuration for [`crate::VisualServoLoop`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServoParams {
    #[serde(default)]
    pub law: ControlLaw,
    #[serde(default)]
    pub gains: ServoGains,
    /// Converged when both pixel errors are within `±deadband_px`.
    #[serde(default = "default_deadband_px")]
    pub deadband_px: f64,
    /// Maximum number of correction moves. `None` runs until convergence or
    /// a collaborator failure.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: Option<usize>,
    /// Wall-clock limit for a run, in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_motion_mode")]
    pub motion_mode: MotionMode,
    #[serde(default)]
    pub binarization: BinarizationParams,
}

impl Default for ServoParams {
    fn default() -> Self {
        Self {
            law: ControlLaw::default(),
            gains: ServoGains::default(),
            deadband_px: default_deadband_px(),
            max_iterations: default_max_iterations(),
            timeout_ms: None,
            motion_mode: default_motion_mode(),
            binarization: BinarizationParams::default(),
        }
    }
}

impl ServoParams {
    /// Proportional-only law with gain `kp`.
    pub fn proportional(kp: f64) -> Self {
        Self {
            law: ControlLaw::P,
            gains: ServoGains { kp, ki: 0.0 },
            ..Self::default()
        }
    }

    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
