use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Cartesian end-effector pose in the robot base frame.
///
/// `x`, `y`, `z` are in millimetres, `r` is the end-effector rotation in
/// degrees. `joints` is populated only when the pose was read back from the
/// arm.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joints: Option<[f64; 4]>,
}

impl Pose {
    pub fn new(x: f64, y: f64, z: f64, r: f64) -> Self {
        Self {
            x,
            y,
            z,
            r,
            joints: None,
        }
    }

    /// Attach joint angles `[j1, j2, j3, j4]` in degrees.
    pub fn with_joints(mut self, joints: [f64; 4]) -> Self {
        self.joints = Some(joints);
        self
    }

    /// Same pose with `z` replaced. Joint readings are dropped because they no
    /// longer describe the new pose.
    #[inline]
    pub fn at_z(&self, z: f64) -> Self {
        Self::new(self.x, self.y, z, self.r)
    }

    /// Same pose with `r` replaced.
    #[inline]
    pub fn with_r(&self, r: f64) -> Self {
        Self::new(self.x, self.y, self.z, r)
    }

    /// Translate in the XY plane, keeping `z` and `r`.
    #[inline]
    pub fn translated(&self, delta: Vector2<f64>) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.z, self.r)
    }

    /// Base-joint angle in degrees, if joint readings are attached.
    #[inline]
    pub fn joint1(&self) -> Option<f64> {
        self.joints.map(|j| j[0])
    }

    #[inline]
    pub fn xy(&self) -> RobotPoint {
        RobotPoint::new(self.x, self.y)
    }

    /// All Cartesian fields are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.r.is_finite()
    }
}

/// A pose where some Cartesian fields may be missing.
///
/// Operator-entered targets are often partial; the missing fields are filled
/// from the arm's current pose before any move is issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialPose {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
    #[serde(default)]
    pub r: Option<f64>,
}

impl PartialPose {
    pub fn is_complete(&self) -> bool {
        self.x.is_some() && self.y.is_some() && self.z.is_some() && self.r.is_some()
    }

    /// Fill missing fields from `current`.
    pub fn complete_with(&self, current: &Pose) -> Pose {
        Pose::new(
            self.x.unwrap_or(current.x),
            self.y.unwrap_or(current.y),
            self.z.unwrap_or(current.z),
            self.r.unwrap_or(current.r),
        )
    }
}

impl From<Pose> for PartialPose {
    fn from(p: Pose) -> Self {
        Self {
            x: Some(p.x),
            y: Some(p.y),
            z: Some(p.z),
            r: Some(p.r),
        }
    }
}

/// A point in the robot base XY plane (millimetres).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotPoint {
    pub x: f64,
    pub y: f64,
}

impl RobotPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn to_point(self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    #[inline]
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<Point2<f64>> for RobotPoint {
    fn from(p: Point2<f64>) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<Vector2<f64>> for RobotPoint {
    fn from(v: Vector2<f64>) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Point-to-point interpolation mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionMode {
    /// Lift, travel, descend.
    Jump,
    /// Joint-interpolated move.
    #[default]
    MoveJ,
    /// Linear Cartesian move.
    MoveL,
}

/// End-effector gripper command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GripperCommand {
    pub motor_on: bool,
    pub closed: bool,
}

impl GripperCommand {
    pub const OPEN: GripperCommand = GripperCommand {
        motor_on: true,
        closed: false,
    };
    pub const CLOSE: GripperCommand = GripperCommand {
        motor_on: true,
        closed: true,
    };
    pub const RELAX: GripperCommand = GripperCommand {
        motor_on: false,
        closed: false,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_pose_takes_missing_fields_from_current() {
        let current = Pose::new(200.0, -10.0, 35.0, 12.0).with_joints([3.0, 0.0, 0.0, 0.0]);
        let partial = PartialPose {
            x: Some(180.0),
            z: Some(-20.0),
            ..PartialPose::default()
        };
        assert!(!partial.is_complete());
        let full = partial.complete_with(&current);
        assert_eq!(full, Pose::new(180.0, -10.0, -20.0, 12.0));
    }

    #[test]
    fn at_z_drops_joint_readings() {
        let p = Pose::new(1.0, 2.0, 3.0, 4.0).with_joints([10.0, 20.0, 30.0, 40.0]);
        assert_eq!(p.joint1(), Some(10.0));
        let lifted = p.at_z(20.0);
        assert_eq!(lifted.z, 20.0);
        assert!(lifted.joints.is_none());
    }

    #[test]
    fn non_finite_pose_is_detected() {
        assert!(Pose::new(0.0, 0.0, 0.0, 0.0).is_finite());
        assert!(!Pose::new(f64::NAN, 0.0, 0.0, 0.0).is_finite());
        assert!(!Pose::new(0.0, 0.0, f64::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn motion_mode_serializes_snake_case() {
        let s = serde_json::to_string(&MotionMode::MoveL).unwrap();
        assert_eq!(s, "\"move_l\"");
    }
}
