//! Pick an object and drop it at the taught retreat pose.

use dobot_vision_core::{
    offset_correction, ArmController, CalibrationMap, Centroid, Frame, GripperCommand, Pose,
    PosePredictor, RobotPoint, VisionError, VisionPipeline,
};
use dobot_vision_servo::VisualServoLoop;
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{PickParams, TaskError, TaughtPoses};

/// How the task finds the approach pose above the object.
#[derive(Clone, Debug, PartialEq)]
pub enum Approach {
    /// One frame from a fixed camera mapped through the two-point calibration.
    Calibrated(CalibrationMap),
    /// Center the object under an arm-mounted camera.
    Servo(VisualServoLoop),
}

/// One arm call in the fixed choreography.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    Move(Pose),
    Grip(GripperCommand),
}

/// Where the end-effector rotation came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleSource {
    /// Rotation left as read from the arm.
    #[default]
    Unchanged,
    Locator,
    Predictor,
}

/// Summary of a completed run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PickReport {
    /// Approach pose above the object.
    pub target: Pose,
    /// Centroid the target was computed from.
    pub centroid: Centroid,
    pub angle_source: AngleSource,
    /// Correction moves issued by the servo approach, if one ran.
    pub servo_moves: Option<usize>,
    /// Sensor offset correction added to the servo result.
    pub offset_correction: Option<RobotPoint>,
    /// Arm calls issued by the choreography.
    pub commands: usize,
}

/// Approach output before the choreography runs.
struct Located {
    xy: RobotPoint,
    current: Pose,
    centroid: Centroid,
    angle: Option<f64>,
    angle_source: AngleSource,
    servo_moves: Option<usize>,
    offset_correction: Option<RobotPoint>,
}

/// Vision-guided pick and place.
///
/// The run locates the object, then issues exactly eleven arm calls:
/// approach, open, descend to `grasp_z`, close, lift, travel to the retreat
/// pose at `lift_z`, descend, release, lift, close, return to the init pose.
/// Calls are strictly sequential. The first failing call ends the run and
/// nothing is retried or rolled back.
#[derive(Clone, Debug, PartialEq)]
pub struct PickPlaceTask {
    pub approach: Approach,
    pub poses: TaughtPoses,
    pub params: PickParams,
}

impl PickPlaceTask {
    pub fn new(approach: Approach, poses: TaughtPoses, params: PickParams) -> Self {
        Self {
            approach,
            poses,
            params,
        }
    }

    pub fn run<A, V>(&self, arm: &mut A, vision: &mut V) -> Result<PickReport, TaskError>
    where
        A: ArmController + ?Sized,
        V: VisionPipeline + ?Sized,
    {
        self.run_with_predictor(arm, vision, None)
    }

    /// Run with an orientation classifier whose label replaces the locator
    /// angle.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn run_with_predictor<A, V>(
        &self,
        arm: &mut A,
        vision: &mut V,
        predictor: Option<&mut dyn PosePredictor>,
    ) -> Result<PickReport, TaskError>
    where
        A: ArmController + ?Sized,
        V: VisionPipeline + ?Sized,
    {
        if self.poses.retreat.is_none() {
            return Err(TaskError::MissingRetreatPose);
        }
        if self.poses.init.is_none() {
            return Err(TaskError::MissingInitPose);
        }

        let located = match &self.approach {
            Approach::Calibrated(map) => self.locate_calibrated(map, arm, vision, predictor)?,
            Approach::Servo(servo) => self.locate_servo(servo, arm, vision, predictor)?,
        };

        let r = match (self.params.orient, located.angle) {
            (true, Some(angle)) => angle - 90.0,
            _ => located.current.r,
        };
        let angle_source = if self.params.orient && located.angle.is_some() {
            located.angle_source
        } else {
            AngleSource::Unchanged
        };
        let target = Pose::new(located.xy.x, located.xy.y, located.current.z, r);
        let (retreat, init) = self.poses.resolve(&located.current)?;
        log::info!(
            "picking at ({:.2}, {:.2}, r {:.1}) from centroid ({}, {})",
            target.x,
            target.y,
            target.r,
            located.centroid.x,
            located.centroid.y
        );

        let steps = choreography(&target, &retreat, &init, &self.params);
        let mut commands = 0;
        for step in steps {
            log::debug!("step {}: {step:?}", commands + 1);
            let issued = match step {
                Step::Move(pose) => arm.move_to(&pose, self.params.motion_mode),
                Step::Grip(command) => arm.set_gripper(command),
            };
            if let Err(err) = issued {
                log::error!("pick aborted at step {}: {err}", commands + 1);
                return Err(err.into());
            }
            commands += 1;
        }

        Ok(PickReport {
            target,
            centroid: located.centroid,
            angle_source,
            servo_moves: located.servo_moves,
            offset_correction: located.offset_correction,
            commands,
        })
    }

    fn locate_calibrated<A, V>(
        &self,
        map: &CalibrationMap,
        arm: &mut A,
        vision: &mut V,
        predictor: Option<&mut dyn PosePredictor>,
    ) -> Result<Located, TaskError>
    where
        A: ArmController + ?Sized,
        V: VisionPipeline + ?Sized,
    {
        map.pair.validate()?;
        let frame = vision.capture_frame()?;
        let detection = vision.binarize_and_locate(&frame, &self.params.binarization)?;
        let centroid = detection.centroid().ok_or(VisionError::NoCentroid)?;
        let current = arm.get_pose()?;
        let xy = map.map(centroid.position(), frame.size())?;
        let (angle, angle_source) = match predictor {
            Some(predictor) => (
                Some(predict(predictor, &frame, detection.mask.as_ref())?),
                AngleSource::Predictor,
            ),
            None => (centroid.angle, AngleSource::Locator),
        };
        Ok(Located {
            xy,
            current,
            centroid,
            angle,
            angle_source,
            servo_moves: None,
            offset_correction: None,
        })
    }

    fn locate_servo<A, V>(
        &self,
        servo: &VisualServoLoop,
        arm: &mut A,
        vision: &mut V,
        predictor: Option<&mut dyn PosePredictor>,
    ) -> Result<Located, TaskError>
    where
        A: ArmController + ?Sized,
        V: VisionPipeline + ?Sized,
    {
        let outcome = servo.run(arm, vision)?;
        let current = outcome.pose;
        let joint1 = current
            .joint1()
            .unwrap_or_else(|| current.y.atan2(current.x).to_degrees());
        let correction = offset_correction(self.params.sensor_offset, joint1);
        let xy = match correction {
            Some(c) => RobotPoint::new(current.x + c.x, current.y + c.y),
            None => current.xy(),
        };
        let (angle, angle_source) = match predictor {
            Some(predictor) => {
                // the servo keeps no frame; grab one at the converged pose
                let frame = vision.capture_frame()?;
                let detection = vision.binarize_and_locate(&frame, &self.params.binarization)?;
                (
                    Some(predict(predictor, &frame, detection.mask.as_ref())?),
                    AngleSource::Predictor,
                )
            }
            None => (outcome.centroid.angle, AngleSource::Locator),
        };
        Ok(Located {
            xy,
            current,
            centroid: outcome.centroid,
            angle,
            angle_source,
            servo_moves: Some(outcome.moves),
            offset_correction: correction,
        })
    }
}

fn predict(
    predictor: &mut dyn PosePredictor,
    frame: &Frame,
    mask: Option<&Frame>,
) -> Result<f64, VisionError> {
    let mask = mask.ok_or_else(|| VisionError::Predictor("locator returned no mask".into()))?;
    let label = predictor.predict(frame, mask)?;
    Ok(label.degrees())
}

/// The eleven arm calls of a pick/place run, in execution order.
pub fn choreography(target: &Pose, retreat: &Pose, init: &Pose, params: &PickParams) -> [Step; 11] {
    let grasp_z = params.grasp_z.unwrap_or(retreat.z);
    let lift_z = params.lift_z;
    [
        Step::Move(*target),
        Step::Grip(GripperCommand::OPEN),
        Step::Move(target.at_z(grasp_z)),
        Step::Grip(GripperCommand::CLOSE),
        Step::Move(target.at_z(lift_z)),
        Step::Move(retreat.at_z(lift_z)),
        Step::Move(retreat.at_z(retreat.z)),
        Step::Grip(GripperCommand::OPEN),
        Step::Move(retreat.at_z(lift_z)),
        Step::Grip(GripperCommand::CLOSE),
        Step::Move(*init),
    ]
}
