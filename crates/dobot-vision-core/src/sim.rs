//! Simulated arm and camera for running the control code without hardware.
//!
//! [`SimulatedQueue`] behaves like the firmware command queue: commands are
//! executed one per `polls_per_command` polls of the executed index.
//! [`SimulatedScene`] renders a bright rectangle where the object would
//! appear given the simulated arm pose, so frames go through the same
//! thresholding and moments code as real ones.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nalgebra::{Point2, Rotation2, Vector2};

use crate::{
    ArmError, BinarizationParams, Camera, CameraBackend, CalibrationPair, CommandQueue, Detection,
    Frame, FrameSize, GripperCommand, MomentsLocator, MotionMode, ObjectLocator, Pose, RobotPoint,
    VisionError, VisionPipeline,
};

/// One command as it reached the simulated arm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ArmEvent {
    Move { pose: Pose, mode: MotionMode },
    Gripper(GripperCommand),
}

#[derive(Debug)]
struct ArmState {
    pose: Pose,
    gripper: GripperCommand,
    next_index: u64,
    executed: u64,
    pending: VecDeque<(u64, ArmEvent)>,
    polls_since_last: usize,
    events: Vec<ArmEvent>,
    fail_at_command: Option<usize>,
    alarms_cleared: usize,
}

/// Shared handle to the simulated arm's state.
///
/// Cloning gives another view of the same arm; the scene uses one to know
/// where the camera is.
#[derive(Clone, Debug)]
pub struct SimulatedQueue {
    state: Arc<Mutex<ArmState>>,
    polls_per_command: usize,
}

impl SimulatedQueue {
    pub fn new(home: Pose) -> Self {
        Self {
            state: Arc::new(Mutex::new(ArmState {
                pose: Pose::new(home.x, home.y, home.z, home.r),
                gripper: GripperCommand::RELAX,
                next_index: 0,
                executed: 0,
                pending: VecDeque::new(),
                polls_since_last: 0,
                events: Vec::new(),
                fail_at_command: None,
                alarms_cleared: 0,
            })),
            polls_per_command: 1,
        }
    }

    /// Number of executed-index polls each command takes to finish.
    pub fn with_polls_per_command(mut self, polls: usize) -> Self {
        self.polls_per_command = polls.max(1);
        self
    }

    /// Make the `n`-th command (0-based, moves and gripper alike) fail.
    pub fn fail_at_command(&self, n: usize) {
        self.lock().fail_at_command = Some(n);
    }

    /// Every command received so far, in order.
    pub fn events(&self) -> Vec<ArmEvent> {
        self.lock().events.clone()
    }

    /// Only the move commands received so far.
    pub fn moves(&self) -> Vec<Pose> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                ArmEvent::Move { pose, .. } => Some(*pose),
                ArmEvent::Gripper(_) => None,
            })
            .collect()
    }

    /// Executed pose, without joint readings.
    pub fn pose(&self) -> Pose {
        self.lock().pose
    }

    pub fn gripper(&self) -> GripperCommand {
        self.lock().gripper
    }

    pub fn alarms_cleared(&self) -> usize {
        self.lock().alarms_cleared
    }

    fn lock(&self) -> MutexGuard<'_, ArmState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enqueue(&mut self, event: ArmEvent) -> Result<u64, ArmError> {
        let mut state = self.lock();
        if state.fail_at_command == Some(state.events.len()) {
            return Err(ArmError::Command(format!(
                "simulated failure at command {}",
                state.events.len()
            )));
        }
        state.events.push(event);
        state.next_index += 1;
        let index = state.next_index;
        state.pending.push_back((index, event));
        Ok(index)
    }
}

fn with_joints(pose: Pose) -> Pose {
    let j1 = pose.y.atan2(pose.x).to_degrees();
    pose.with_joints([j1, 0.0, 0.0, pose.r])
}

impl CommandQueue for SimulatedQueue {
    fn current_pose(&mut self) -> Result<Pose, ArmError> {
        Ok(with_joints(self.lock().pose))
    }

    fn enqueue_move(&mut self, pose: &Pose, mode: MotionMode) -> Result<u64, ArmError> {
        self.enqueue(ArmEvent::Move {
            pose: Pose::new(pose.x, pose.y, pose.z, pose.r),
            mode,
        })
    }

    fn enqueue_gripper(&mut self, command: GripperCommand) -> Result<u64, ArmError> {
        self.enqueue(ArmEvent::Gripper(command))
    }

    fn executed_index(&mut self) -> Result<u64, ArmError> {
        let polls_per_command = self.polls_per_command;
        let mut state = self.lock();
        if !state.pending.is_empty() {
            state.polls_since_last += 1;
            if state.polls_since_last >= polls_per_command {
                state.polls_since_last = 0;
                if let Some((index, event)) = state.pending.pop_front() {
                    match event {
                        ArmEvent::Move { pose, .. } => state.pose = pose,
                        ArmEvent::Gripper(cmd) => state.gripper = cmd,
                    }
                    state.executed = index;
                }
            }
        }
        Ok(state.executed)
    }

    fn clear_alarms(&mut self) -> Result<(), ArmError> {
        self.lock().alarms_cleared += 1;
        Ok(())
    }
}

/// How the simulated camera relates to the arm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraMount {
    /// Camera fixed above the table; pixels relate to robot XY through the
    /// two-point calibration.
    Overhead { pair: CalibrationPair },
    /// Camera carried by the arm. The object appears offset from the frame
    /// center by `px_per_mm` times the arm-to-object distance, row error
    /// following robot `x` and column error following robot `y`.
    EyeInHand { px_per_mm: f64 },
}

/// Rectangular object lying on the table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimObject {
    pub position: RobotPoint,
    /// In-image orientation of the long side, degrees.
    pub angle_deg: f64,
    /// Half extents in pixels (long, short).
    pub half_extent_px: (f64, f64),
}

impl SimObject {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: RobotPoint::new(x, y),
            angle_deg: 0.0,
            half_extent_px: (9.0, 5.0),
        }
    }

    pub fn with_angle(mut self, angle_deg: f64) -> Self {
        self.angle_deg = angle_deg;
        self
    }
}

/// Renders the object as seen from the simulated camera.
#[derive(Clone, Debug)]
pub struct SimulatedScene {
    arm: SimulatedQueue,
    mount: CameraMount,
    frame: FrameSize,
    object: Option<SimObject>,
    fail_capture: bool,
    captures: usize,
}

impl SimulatedScene {
    pub fn new(
        arm: SimulatedQueue,
        mount: CameraMount,
        frame: FrameSize,
        object: SimObject,
    ) -> Self {
        Self {
            arm,
            mount,
            frame,
            object: Some(object),
            fail_capture: false,
            captures: 0,
        }
    }

    /// Remove the object; frames come back empty.
    pub fn remove_object(&mut self) {
        self.object = None;
    }

    /// Make every subsequent capture fail.
    pub fn set_fail_capture(&mut self, fail: bool) {
        self.fail_capture = fail;
    }

    pub fn captures(&self) -> usize {
        self.captures
    }

    /// Pixel position of the object center for the current arm pose.
    pub fn object_pixel(&self) -> Option<Point2<f64>> {
        let object = self.object?;
        let p = object.position;
        let px = match self.mount {
            CameraMount::Overhead { pair } => {
                let span = pair.alignment_2.to_point() - pair.alignment_1.to_point();
                let row = (p.x - pair.alignment_1.x) * self.frame.height as f64 / span.x;
                let col = (p.y - pair.alignment_1.y) * self.frame.width as f64 / span.y;
                Point2::new(col, row)
            }
            CameraMount::EyeInHand { px_per_mm } => {
                let arm = self.arm.pose();
                let c = self.frame.center();
                Point2::new(
                    c.x + px_per_mm * (arm.y - p.y),
                    c.y + px_per_mm * (arm.x - p.x),
                )
            }
        };
        Some(px)
    }

    /// Render the current view as a grayscale frame.
    pub fn render(&self) -> Frame {
        let (w, h) = (self.frame.width as usize, self.frame.height as usize);
        let mut frame = Frame::filled(w, h, 30);
        let (Some(object), Some(center)) = (self.object, self.object_pixel()) else {
            return frame;
        };
        let rot = Rotation2::new(object.angle_deg.to_radians());
        let along = rot * Vector2::x();
        let across = rot * Vector2::y();
        let (a, b) = object.half_extent_px;
        let reach = a.max(b).ceil() as i64 + 1;
        let (cx, cy) = (center.x.round() as i64, center.y.round() as i64);
        for y in (cy - reach)..=(cy + reach) {
            for x in (cx - reach)..=(cx + reach) {
                let d = Vector2::new(x as f64 - center.x, y as f64 - center.y);
                if d.dot(&along).abs() <= a && d.dot(&across).abs() <= b {
                    frame.put(x, y, 220);
                }
            }
        }
        frame
    }
}

impl Camera for SimulatedScene {
    fn read_frame(&mut self) -> Result<Frame, VisionError> {
        self.captures += 1;
        if self.fail_capture {
            return Err(VisionError::Acquisition("simulated camera read failure".into()));
        }
        Ok(self.render())
    }
}

impl VisionPipeline for SimulatedScene {
    fn capture_frame(&mut self) -> Result<Frame, VisionError> {
        self.read_frame()
    }

    fn binarize_and_locate(
        &mut self,
        frame: &Frame,
        params: &BinarizationParams,
    ) -> Result<Detection, VisionError> {
        MomentsLocator.locate(frame, params)
    }
}

/// Camera backend serving simulated scenes by device index.
#[derive(Clone, Debug, Default)]
pub struct SimulatedCameras {
    pub scenes: Vec<SimulatedScene>,
}

impl CameraBackend for SimulatedCameras {
    type Camera = SimulatedScene;

    fn open(&mut self, device_index: u32) -> Option<SimulatedScene> {
        self.scenes.get(device_index as usize).cloned()
    }
}
