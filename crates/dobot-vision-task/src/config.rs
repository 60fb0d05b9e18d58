//! JSON session configuration.

use std::{fs, path::Path};

use dobot_vision_core::{
    BinarizationParams, CalibrationError, CalibrationMap, CalibrationPair, CameraSlot, Pose,
    RobotPoint, ThresholdMethod,
};
use dobot_vision_servo::{ServoParams, VisualServoLoop};
use serde::{Deserialize, Serialize};

use crate::{Approach, PickParams, PickPlaceTask, TaughtPoses};

#[derive(thiserror::Error, Debug)]
pub enum ConfigIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SessionConfigError {
    #[error("calibrated approach requested but no calibration pair is configured")]
    MissingCalibration,
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproachMode {
    #[default]
    Calibrated,
    Servo,
}

/// Everything an operator teaches or tunes for one work cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub calibration: Option<CalibrationPair>,
    #[serde(default)]
    pub poses: TaughtPoses,
    #[serde(default)]
    pub approach: ApproachMode,
    #[serde(default)]
    pub pick: PickParams,
    #[serde(default)]
    pub servo: ServoParams,
    /// Camera used for locating objects.
    #[serde(default)]
    pub camera_slot: CameraSlot,
}

impl SessionConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Starting point for a new work cell, with every section filled in.
    pub fn template() -> Self {
        Self {
            calibration: Some(CalibrationPair::new(
                RobotPoint::new(150.0, -100.0),
                RobotPoint::new(310.0, 100.0),
            )),
            poses: TaughtPoses::new(
                Pose::new(180.0, -150.0, -35.0, 0.0),
                Pose::new(200.0, 0.0, 50.0, 0.0),
            ),
            approach: ApproachMode::Calibrated,
            pick: PickParams {
                orient: true,
                binarization: BinarizationParams {
                    method: ThresholdMethod::Otsu,
                    ..BinarizationParams::default()
                },
                ..PickParams::default()
            },
            servo: ServoParams::default(),
            camera_slot: CameraSlot(0),
        }
    }

    /// Validated calibration map.
    pub fn calibration_map(&self) -> Result<CalibrationMap, SessionConfigError> {
        let pair = self
            .calibration
            .ok_or(SessionConfigError::MissingCalibration)?;
        pair.validate()?;
        Ok(CalibrationMap::new(pair))
    }

    pub fn servo_loop(&self) -> VisualServoLoop {
        VisualServoLoop::new(self.servo.clone())
    }

    /// Build a pick task using `mode`, or the configured approach if `None`.
    pub fn build_task(
        &self,
        mode: Option<ApproachMode>,
    ) -> Result<PickPlaceTask, SessionConfigError> {
        let approach = match mode.unwrap_or(self.approach) {
            ApproachMode::Calibrated => Approach::Calibrated(self.calibration_map()?),
            ApproachMode::Servo => Approach::Servo(self.servo_loop()),
        };
        Ok(PickPlaceTask::new(approach, self.poses, self.pick))
    }
}
