//! Two-point image-to-robot calibration.
//!
//! The operator teaches two correspondences by jogging the arm over the
//! top-left and bottom-right reference marks. Any other image point is then
//! linearly interpolated between them, one robot axis per image axis.
//!
//! The camera is mounted rotated relative to the base frame: the image row
//! (`cy`) drives robot `x` and the image column (`cx`) drives robot `y`.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::RobotPoint;

/// Errors produced while building or applying a calibration.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    /// Frame height or width is zero, so the interpolation ratio is undefined.
    #[error("calibration denominator is zero (frame {width}x{height})")]
    DenominatorZero { width: u32, height: u32 },
    /// Both taught points share the same coordinate on `axis`.
    #[error("calibration points coincide on the {axis} axis")]
    DegeneratePair { axis: Axis },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

/// Pixel dimensions of the frame a centroid was measured in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Frame center in pixel coordinates.
    #[inline]
    pub fn center(&self) -> Point2<f64> {
        Point2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

/// Operator-taught correspondences: `alignment_1` (top-left) and
/// `alignment_2` (bottom-right) robot positions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPair {
    pub alignment_1: RobotPoint,
    pub alignment_2: RobotPoint,
}

impl CalibrationPair {
    pub fn new(alignment_1: RobotPoint, alignment_2: RobotPoint) -> Self {
        Self {
            alignment_1,
            alignment_2,
        }
    }

    /// Reject pairs that would collapse an axis of the mapping.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.alignment_1.x == self.alignment_2.x {
            return Err(CalibrationError::DegeneratePair { axis: Axis::X });
        }
        if self.alignment_1.y == self.alignment_2.y {
            return Err(CalibrationError::DegeneratePair { axis: Axis::Y });
        }
        Ok(())
    }

    #[inline]
    fn span(&self) -> Vector2<f64> {
        self.alignment_2.to_point() - self.alignment_1.to_point()
    }
}

/// Separable-linear map from image pixels to robot XY.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationMap {
    pub pair: CalibrationPair,
}

impl CalibrationMap {
    pub fn new(pair: CalibrationPair) -> Self {
        Self { pair }
    }

    /// Map a centroid `(cx, cy)` measured in a frame of size `frame` to robot XY.
    ///
    /// ```text
    /// x = a1.x + cy * (a2.x - a1.x) / height
    /// y = a1.y + cx * (a2.y - a1.y) / width
    /// ```
    pub fn map(
        &self,
        centroid: Point2<f64>,
        frame: FrameSize,
    ) -> Result<RobotPoint, CalibrationError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(CalibrationError::DenominatorZero {
                width: frame.width,
                height: frame.height,
            });
        }
        let a1 = self.pair.alignment_1;
        let span = self.pair.span();
        let x = a1.x + centroid.y * span.x / frame.height as f64;
        let y = a1.y + centroid.x * span.y / frame.width as f64;
        Ok(RobotPoint::new(x, y))
    }

    /// Integer-pixel convenience wrapper around [`CalibrationMap::map`].
    pub fn map_pixel(
        &self,
        cx: i32,
        cy: i32,
        frame: FrameSize,
    ) -> Result<RobotPoint, CalibrationError> {
        self.map(Point2::new(cx as f64, cy as f64), frame)
    }
}
