//! Closed-loop centering of the object in the camera frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dobot_vision_core::{ArmController, Centroid, Pose, VisionPipeline};
use nalgebra::Vector2;
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{ControlState, ServoError, ServoParams};

/// Shared flag that asks a running servo loop to stop at the next boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One sampled frame and the correction (if any) that followed it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ServoStep {
    pub centroid: Centroid,
    pub error_px: [f64; 2],
    /// Robot XY increment applied after this sample; `None` on the
    /// converging sample.
    pub increment_mm: Option<[f64; 2]>,
}

/// Result of a converged run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ServoOutcome {
    /// Arm pose read after convergence.
    pub pose: Pose,
    /// Centroid of the converging frame.
    pub centroid: Centroid,
    /// Number of frames sampled.
    pub iterations: usize,
    /// Number of correction moves issued.
    pub moves: usize,
    pub trace: Vec<ServoStep>,
}

/// Visual servo loop: sample, evaluate the pixel error against the frame
/// center, correct the arm, repeat until within the deadband.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisualServoLoop {
    pub params: ServoParams,
}

impl VisualServoLoop {
    pub fn new(params: ServoParams) -> Self {
        Self { params }
    }

    /// Run until converged or failed.
    pub fn run<A, V>(&self, arm: &mut A, vision: &mut V) -> Result<ServoOutcome, ServoError>
    where
        A: ArmController + ?Sized,
        V: VisionPipeline + ?Sized,
    {
        self.run_with_cancel(arm, vision, &CancelToken::new())
    }

    /// Same as [`VisualServoLoop::run`], checking `cancel` before each
    /// sample and each correction.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(law = ?self.params.law))
    )]
    pub fn run_with_cancel<A, V>(
        &self,
        arm: &mut A,
        vision: &mut V,
        cancel: &CancelToken,
    ) -> Result<ServoOutcome, ServoError>
    where
        A: ArmController + ?Sized,
        V: VisionPipeline + ?Sized,
    {
        let params = &self.params;
        let started = Instant::now();
        let deadline = params.timeout();
        let mut state = ControlState::default();
        let mut trace = Vec::new();
        let mut moves = 0usize;

        loop {
            // sampling
            if cancel.is_cancelled() {
                return Err(ServoError::Cancelled);
            }
            if let Some(limit) = deadline {
                let elapsed = started.elapsed();
                if elapsed >= limit {
                    return Err(ServoError::Timeout {
                        elapsed_ms: elapsed.as_millis() as u64,
                    });
                }
            }
            let frame = vision.capture_frame()?;
            let detection = vision.binarize_and_locate(&frame, &params.binarization)?;
            let centroid = detection.centroid().ok_or(ServoError::NoCentroid)?;

            // evaluating
            let center = frame.size().center();
            let error = centroid.position() - center;
            let iterations = trace.len() + 1;
            if error.x.abs() <= params.deadband_px && error.y.abs() <= params.deadband_px {
                trace.push(ServoStep {
                    centroid,
                    error_px: [error.x, error.y],
                    increment_mm: None,
                });
                let pose = arm.get_pose()?;
                log::info!(
                    "servo converged after {iterations} samples, {moves} moves at ({:.2}, {:.2})",
                    pose.x,
                    pose.y
                );
                return Ok(ServoOutcome {
                    pose,
                    centroid,
                    iterations,
                    moves,
                    trace,
                });
            }

            // correcting
            if let Some(max) = params.max_iterations {
                if moves >= max {
                    log::warn!(
                        "servo gave up after {moves} moves, error ({:.1}, {:.1}) px",
                        error.x,
                        error.y
                    );
                    return Err(ServoError::IterationLimit {
                        iterations: moves,
                        last_error_px: [error.x, error.y],
                    });
                }
            }
            if cancel.is_cancelled() {
                return Err(ServoError::Cancelled);
            }
            let delta = params.law.increment(&params.gains, error, &mut state);
            log::debug!(
                "servo #{iterations}: error ({:.1}, {:.1}) px -> step ({:.3}, {:.3}) mm",
                error.x,
                error.y,
                delta.x,
                delta.y
            );
            trace.push(ServoStep {
                centroid,
                error_px: [error.x, error.y],
                increment_mm: Some([delta.x, delta.y]),
            });
            step_arm(arm, delta, params)?;
            moves += 1;
        }
    }
}

fn step_arm<A: ArmController + ?Sized>(
    arm: &mut A,
    delta: Vector2<f64>,
    params: &ServoParams,
) -> Result<(), ServoError> {
    let target = arm.get_pose()?.translated(delta);
    arm.move_to(&target, params.motion_mode)?;
    Ok(())
}
