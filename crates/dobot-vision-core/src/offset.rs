use nalgebra::{Rotation2, Vector2};

use crate::RobotPoint;

/// XY correction for a sensor mounted `offset` millimetres from the gripper
/// center along the arm's radial direction.
///
/// The correction rotates with the base joint. Returns `None` when
/// `offset <= 0`, meaning no correction applies.
pub fn offset_correction(offset: f64, joint1_deg: f64) -> Option<RobotPoint> {
    if offset.is_nan() || offset <= 0.0 {
        return None;
    }
    let radial = Rotation2::new(joint1_deg.to_radians()) * Vector2::new(offset, 0.0);
    Some(radial.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn non_positive_offset_gives_no_correction() {
        assert_eq!(offset_correction(0.0, 30.0), None);
        assert_eq!(offset_correction(-5.0, 30.0), None);
        assert_eq!(offset_correction(f64::NAN, 30.0), None);
    }

    #[test]
    fn correction_follows_base_angle() {
        let c = offset_correction(43.0, 0.0).unwrap();
        assert_abs_diff_eq!(c.x, 43.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.y, 0.0, epsilon = 1e-6);

        let c = offset_correction(43.0, 90.0).unwrap();
        assert_abs_diff_eq!(c.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.y, 43.0, epsilon = 1e-6);

        let c = offset_correction(10.0, -45.0).unwrap();
        assert_abs_diff_eq!(c.x, 10.0 * std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-9);
        assert_abs_diff_eq!(c.y, -10.0 * std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-9);
    }
}
