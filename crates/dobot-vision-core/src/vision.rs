//! Vision collaborator interfaces and shared detection types.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::Frame;

/// Errors from frame acquisition and object location.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum VisionError {
    #[error("frame acquisition failed: {0}")]
    Acquisition(String),
    #[error("no object centroid found")]
    NoCentroid,
    #[error("invalid frame (width={width}, height={height}, channels={channels}, len={len})")]
    InvalidFrame {
        width: usize,
        height: usize,
        channels: usize,
        len: usize,
    },
    #[error("pose predictor failed: {0}")]
    Predictor(String),
}

/// Object center in pixel coordinates with optional in-plane orientation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub x: i32,
    pub y: i32,
    /// Orientation in degrees, when the locator computes one.
    #[serde(default)]
    pub angle: Option<f64>,
}

impl Centroid {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y, angle: None }
    }

    pub fn with_angle(mut self, angle: Option<f64>) -> Self {
        self.angle = angle;
        self
    }

    #[inline]
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x as f64, self.y as f64)
    }
}

/// Output of one locate call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Detection {
    pub centroid: Option<(i32, i32)>,
    pub angle: Option<f64>,
    /// Binary mask the centroid was computed from (255 = object).
    pub mask: Option<Frame>,
}

impl Detection {
    /// Nothing found.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn found(x: i32, y: i32, angle: Option<f64>) -> Self {
        Self {
            centroid: Some((x, y)),
            angle,
            mask: None,
        }
    }

    /// Combined centroid + angle, if an object was found.
    pub fn centroid(&self) -> Option<Centroid> {
        self.centroid
            .map(|(x, y)| Centroid::new(x, y).with_angle(self.angle))
    }
}

/// Binarization strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Fixed global threshold: `v > threshold` is foreground.
    Global { threshold: u8 },
    /// Global threshold picked by Otsu's method.
    #[default]
    Otsu,
    /// Local mean over a `block_size` window minus `c`.
    Adaptive { block_size: usize, c: f64 },
    /// In-band threshold: `low <= v <= high` is foreground.
    TwoThreshold { low: u8, high: u8 },
}

/// Parameters passed through to the object locator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinarizationParams {
    #[serde(default)]
    pub method: ThresholdMethod,
    /// Swap foreground and background (dark object on bright table).
    #[serde(default)]
    pub invert: bool,
    /// Masks with fewer foreground pixels are treated as empty.
    #[serde(default = "default_min_area")]
    pub min_area: usize,
    /// Compute an orientation angle along with the centroid.
    #[serde(default = "default_true")]
    pub compute_angle: bool,
}

fn default_min_area() -> usize {
    20
}

fn default_true() -> bool {
    true
}

impl Default for BinarizationParams {
    fn default() -> Self {
        Self {
            method: ThresholdMethod::default(),
            invert: false,
            min_area: default_min_area(),
            compute_angle: true,
        }
    }
}

/// Frame source plus object locator, as seen by the control loop.
pub trait VisionPipeline {
    /// Grab one frame from the bound camera.
    fn capture_frame(&mut self) -> Result<Frame, VisionError>;

    /// Binarize `frame` and locate the object.
    ///
    /// An empty mask is not an error: it returns a [`Detection`] without a
    /// centroid.
    fn binarize_and_locate(
        &mut self,
        frame: &Frame,
        params: &BinarizationParams,
    ) -> Result<Detection, VisionError>;
}

impl<V: VisionPipeline + ?Sized> VisionPipeline for &mut V {
    fn capture_frame(&mut self) -> Result<Frame, VisionError> {
        (**self).capture_frame()
    }

    fn binarize_and_locate(
        &mut self,
        frame: &Frame,
        params: &BinarizationParams,
    ) -> Result<Detection, VisionError> {
        (**self).binarize_and_locate(frame, params)
    }
}

/// Stateless locator over a single frame.
pub trait ObjectLocator {
    fn locate(&self, frame: &Frame, params: &BinarizationParams) -> Result<Detection, VisionError>;
}

/// Discrete orientation class reported by a classifier, in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AngleLabel(pub i32);

impl AngleLabel {
    #[inline]
    pub fn degrees(self) -> f64 {
        self.0 as f64
    }
}

/// Black-box orientation classifier fed with the color frame and its mask.
pub trait PosePredictor {
    fn predict(&mut self, frame: &Frame, mask: &Frame) -> Result<AngleLabel, VisionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_centroid_carries_angle() {
        let d = Detection::found(10, 20, Some(30.0));
        assert_eq!(d.centroid(), Some(Centroid::new(10, 20).with_angle(Some(30.0))));
        assert_eq!(Detection::empty().centroid(), None);
    }

    #[test]
    fn binarization_params_fill_defaults() {
        let p: BinarizationParams =
            serde_json::from_str(r#"{"method": {"kind": "global", "threshold": 90}}"#).unwrap();
        assert_eq!(p.method, ThresholdMethod::Global { threshold: 90 });
        assert_eq!(p.min_area, 20);
        assert!(p.compute_angle);
        assert!(!p.invert);
    }
}
