//! Reference object locator: threshold, then image moments.
//!
//! This is a plain CPU implementation used by the simulator and by hosts
//! without an OpenCV-backed locator. It does not try to match OpenCV's
//! thresholding numerics.

use crate::{
    BinarizationParams, Detection, Frame, GrayView, ObjectLocator, ThresholdMethod, VisionError,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Locates the object as the center of mass of the foreground mask.
#[derive(Clone, Copy, Debug, Default)]
pub struct MomentsLocator;

impl ObjectLocator for MomentsLocator {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(w = frame.width, h = frame.height))
    )]
    fn locate(&self, frame: &Frame, params: &BinarizationParams) -> Result<Detection, VisionError> {
        frame.validate()?;
        let gray = frame.to_gray();
        let view = gray.as_gray().ok_or(VisionError::InvalidFrame {
            width: frame.width,
            height: frame.height,
            channels: frame.channels,
            len: frame.data.len(),
        })?;
        let mask = binarize(&view, params);
        let mask_view = mask.as_gray().ok_or(VisionError::NoCentroid)?;

        let Some(m) = Moments::of_mask(&mask_view) else {
            return Ok(Detection {
                mask: Some(mask),
                ..Detection::empty()
            });
        };
        if (m.m00 as usize) < params.min_area.max(1) {
            log::debug!("mask area {} below min_area {}", m.m00, params.min_area);
            return Ok(Detection {
                mask: Some(mask),
                ..Detection::empty()
            });
        }

        let (cx, cy) = m.centroid();
        let angle = params.compute_angle.then(|| m.orientation_deg());
        Ok(Detection {
            centroid: Some((cx.round() as i32, cy.round() as i32)),
            angle,
            mask: Some(mask),
        })
    }
}

/// Produce a 0/255 mask according to `params`.
pub fn binarize(src: &GrayView<'_>, params: &BinarizationParams) -> Frame {
    let mut out = Frame::filled(src.width, src.height, 0);
    match params.method {
        ThresholdMethod::Global { threshold } => {
            fill_mask(&mut out, src, params.invert, |_, _, v| v > threshold);
        }
        ThresholdMethod::Otsu => {
            let t = otsu_threshold(src.data);
            fill_mask(&mut out, src, params.invert, |_, _, v| v > t);
        }
        ThresholdMethod::TwoThreshold { low, high } => {
            fill_mask(&mut out, src, params.invert, |_, _, v| v >= low && v <= high);
        }
        ThresholdMethod::Adaptive { block_size, c } => {
            let integral = IntegralImage::new(src);
            let half = (block_size.max(3) | 1) / 2;
            fill_mask(&mut out, src, params.invert, |x, y, v| {
                (v as f64) > integral.window_mean(x, y, half) - c
            });
        }
    }
    out
}

fn fill_mask<F>(out: &mut Frame, src: &GrayView<'_>, invert: bool, mut is_fg: F)
where
    F: FnMut(usize, usize, u8) -> bool,
{
    for y in 0..src.height {
        for x in 0..src.width {
            let fg = is_fg(x, y, src.get(x, y)) != invert;
            if fg {
                out.data[y * src.width + x] = 255;
            }
        }
    }
}

/// Compute Otsu threshold from a set of sample intensities.
///
/// Same histogram search as the per-cell Otsu in `calib-targets-aruco`'s
/// `threshold.rs`, applied here to a whole frame.
pub fn otsu_threshold(samples: &[u8]) -> u8 {
    if samples.is_empty() {
        return 127;
    }

    let mut min_v = 255u8;
    let mut max_v = 0u8;
    let mut hist = [0u32; 256];
    for &v in samples {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
        hist[v as usize] += 1;
    }
    if min_v == max_v {
        return min_v;
    }
    if hist.iter().filter(|&&h| h > 0).count() <= 2 {
        return ((min_v as u16 + max_v as u16) / 2) as u8;
    }

    let total = samples.len() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}

/// Summed-area table for box means.
struct IntegralImage {
    width: usize,
    height: usize,
    sums: Vec<u64>, // (w+1) x (h+1)
}

impl IntegralImage {
    fn new(src: &GrayView<'_>) -> Self {
        let stride = src.width + 1;
        let mut sums = vec![0u64; stride * (src.height + 1)];
        for y in 0..src.height {
            let mut row = 0u64;
            for x in 0..src.width {
                row += src.get(x, y) as u64;
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row;
            }
        }
        Self {
            width: src.width,
            height: src.height,
            sums,
        }
    }

    fn window_mean(&self, x: usize, y: usize, half: usize) -> f64 {
        let x0 = x.saturating_sub(half);
        let y0 = y.saturating_sub(half);
        let x1 = (x + half + 1).min(self.width);
        let y1 = (y + half + 1).min(self.height);
        let stride = self.width + 1;
        let s = self.sums[y1 * stride + x1] + self.sums[y0 * stride + x0]
            - self.sums[y0 * stride + x1]
            - self.sums[y1 * stride + x0];
        s as f64 / ((x1 - x0) * (y1 - y0)) as f64
    }
}

/// Raw and central moments of a binary mask, up to second order.
#[derive(Clone, Copy, Debug)]
struct Moments {
    m00: f64,
    m10: f64,
    m01: f64,
    mu20: f64,
    mu02: f64,
    mu11: f64,
}

impl Moments {
    fn of_mask(mask: &GrayView<'_>) -> Option<Self> {
        let (mut m00, mut m10, mut m01) = (0f64, 0f64, 0f64);
        let (mut m20, mut m02, mut m11) = (0f64, 0f64, 0f64);
        for y in 0..mask.height {
            for x in 0..mask.width {
                if mask.get(x, y) == 0 {
                    continue;
                }
                let (xf, yf) = (x as f64, y as f64);
                m00 += 1.0;
                m10 += xf;
                m01 += yf;
                m20 += xf * xf;
                m02 += yf * yf;
                m11 += xf * yf;
            }
        }
        if m00 == 0.0 {
            return None;
        }
        let cx = m10 / m00;
        let cy = m01 / m00;
        Some(Self {
            m00,
            m10,
            m01,
            mu20: m20 / m00 - cx * cx,
            mu02: m02 / m00 - cy * cy,
            mu11: m11 / m00 - cx * cy,
        })
    }

    fn centroid(&self) -> (f64, f64) {
        (self.m10 / self.m00, self.m01 / self.m00)
    }

    /// Major-axis direction in degrees, in `[0, 180)`.
    fn orientation_deg(&self) -> f64 {
        let theta = 0.5 * (2.0 * self.mu11).atan2(self.mu20 - self.mu02);
        theta.to_degrees().rem_euclid(180.0)
    }
}
