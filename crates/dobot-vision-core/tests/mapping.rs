use approx::assert_abs_diff_eq;
use dobot_vision_core::{
    offset_correction, CalibrationError, CalibrationMap, CalibrationPair, FrameSize, RobotPoint,
};

fn map(a1: (f64, f64), a2: (f64, f64)) -> CalibrationMap {
    CalibrationMap::new(CalibrationPair::new(
        RobotPoint::new(a1.0, a1.1),
        RobotPoint::new(a2.0, a2.1),
    ))
}

#[test]
fn frame_center_maps_to_midpoint_of_taught_points() {
    let p = map((0.0, 0.0), (10.0, 20.0))
        .map_pixel(50, 50, FrameSize::new(100, 100))
        .expect("valid frame");
    assert_abs_diff_eq!(p.x, 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(p.y, 10.0, epsilon = 1e-12);
}

#[test]
fn zero_height_fails_instead_of_producing_nan() {
    for (cx, cy) in [(0, 0), (50, 50), (-3, 7)] {
        let res = map((0.0, 0.0), (10.0, 20.0)).map_pixel(cx, cy, FrameSize::new(100, 0));
        assert!(matches!(res, Err(CalibrationError::DenominatorZero { .. })));
    }
}

#[test]
fn mapping_is_linear_along_each_axis() {
    let m = map((120.0, -60.0), (280.0, 60.0));
    let frame = FrameSize::new(320, 240);
    let a = m.map_pixel(40, 30, frame).unwrap();
    let b = m.map_pixel(80, 60, frame).unwrap();
    let c = m.map_pixel(120, 90, frame).unwrap();
    assert_abs_diff_eq!(b.x - a.x, c.x - b.x, epsilon = 1e-9);
    assert_abs_diff_eq!(b.y - a.y, c.y - b.y, epsilon = 1e-9);
}

#[test]
fn offset_correction_cases() {
    assert!(offset_correction(0.0, 0.0).is_none());
    assert!(offset_correction(-5.0, 0.0).is_none());

    let c = offset_correction(43.0, 0.0).expect("positive offset");
    assert_abs_diff_eq!(c.x, 43.0, epsilon = 1e-6);
    assert_abs_diff_eq!(c.y, 0.0, epsilon = 1e-6);

    let c = offset_correction(43.0, 90.0).expect("positive offset");
    assert_abs_diff_eq!(c.x, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(c.y, 43.0, epsilon = 1e-6);
}
