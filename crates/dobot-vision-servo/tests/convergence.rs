use std::time::Duration;

use dobot_vision_core::sim::{CameraMount, SimObject, SimulatedQueue, SimulatedScene};
use dobot_vision_core::{FrameSize, Pose, QueueWaiter, QueuedArm};
use dobot_vision_servo::{ControlLaw, ServoError, ServoParams, ServoRunner, VisualServoLoop};

const FRAME: FrameSize = FrameSize::new(320, 240);

fn rig(
    start: Pose,
    px_per_mm: f64,
) -> (SimulatedQueue, QueuedArm<SimulatedQueue>, SimulatedScene) {
    let queue = SimulatedQueue::new(start);
    let scene = SimulatedScene::new(
        queue.clone(),
        CameraMount::EyeInHand { px_per_mm },
        FRAME,
        SimObject::at(200.0, 0.0),
    );
    let arm = QueuedArm::with_waiter(queue.clone(), QueueWaiter::immediate());
    (queue, arm, scene)
}

#[test]
fn pi_loop_centers_the_object() {
    let (queue, mut arm, mut scene) = rig(Pose::new(240.0, 30.0, 45.0, 12.0), 1.0);
    let out = VisualServoLoop::default().run(&mut arm, &mut scene).unwrap();

    assert!(out.moves > 0);
    assert_eq!(out.iterations, out.moves + 1);
    assert_eq!(out.trace.len(), out.iterations);
    let [ex, ey] = out.trace.last().unwrap().error_px;
    assert!(ex.abs() <= 10.0 && ey.abs() <= 10.0);
    assert!((out.pose.x - 200.0).abs() <= 10.5, "x {}", out.pose.x);
    assert!(out.pose.y.abs() <= 10.5, "y {}", out.pose.y);
    // z and r are never touched by the servo
    assert!(queue.moves().iter().all(|p| p.z == 45.0 && p.r == 12.0));
    assert_eq!(queue.moves().len(), out.moves);
}

#[test]
fn p_loop_converges_without_integral() {
    let (_, mut arm, mut scene) = rig(Pose::new(170.0, -25.0, 45.0, 0.0), 2.0);
    let params = ServoParams {
        law: ControlLaw::P,
        ..ServoParams::default()
    };
    let out = VisualServoLoop::new(params).run(&mut arm, &mut scene).unwrap();
    let [ex, ey] = out.trace.last().unwrap().error_px;
    assert!(ex.abs() <= 10.0 && ey.abs() <= 10.0);
}

#[test]
fn p_loop_converges_from_every_corner_within_200_iterations() {
    // 1 px/mm puts the object 100 px off center on both axes.
    for (sx, sy) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
        let start = Pose::new(200.0 + 100.0 * sx, 100.0 * sy, 45.0, 0.0);
        let (_, mut arm, mut scene) = rig(start, 1.0);
        let first = scene.object_pixel().unwrap();
        assert_eq!((first.x - 160.0).abs(), 100.0);
        assert_eq!((first.y - 120.0).abs(), 100.0);

        let params = ServoParams {
            max_iterations: None,
            ..ServoParams::proportional(0.05)
        };
        let out = VisualServoLoop::new(params)
            .run(&mut arm, &mut scene)
            .unwrap();
        assert!(out.iterations <= 200, "{} iterations from ({sx}, {sy})", out.iterations);
        let [ex, ey] = out.trace.last().unwrap().error_px;
        assert!(ex.abs() <= 10.0 && ey.abs() <= 10.0);
    }
}

#[test]
fn already_centered_issues_no_moves() {
    let (queue, mut arm, mut scene) = rig(Pose::new(205.0, -4.0, 45.0, 0.0), 1.0);
    let out = VisualServoLoop::default().run(&mut arm, &mut scene).unwrap();
    assert_eq!(out.moves, 0);
    assert!(queue.events().is_empty());
    assert_eq!((out.pose.x, out.pose.y), (205.0, -4.0));
}

#[test]
fn missing_object_fails_without_moving() {
    let (queue, mut arm, mut scene) = rig(Pose::new(240.0, 30.0, 45.0, 0.0), 1.0);
    scene.remove_object();
    let err = VisualServoLoop::default()
        .run(&mut arm, &mut scene)
        .unwrap_err();
    assert_eq!(err, ServoError::NoCentroid);
    assert!(queue.events().is_empty());
}

#[test]
fn camera_failure_is_an_acquisition_error() {
    let (_, mut arm, mut scene) = rig(Pose::new(240.0, 30.0, 45.0, 0.0), 1.0);
    scene.set_fail_capture(true);
    let err = VisualServoLoop::default()
        .run(&mut arm, &mut scene)
        .unwrap_err();
    assert!(matches!(err, ServoError::FrameAcquisition(_)));
}

#[test]
fn iteration_limit_stops_the_loop() {
    let (queue, mut arm, mut scene) = rig(Pose::new(240.0, 30.0, 45.0, 0.0), 1.0);
    let params = ServoParams {
        max_iterations: Some(3),
        ..ServoParams::default()
    };
    let err = VisualServoLoop::new(params)
        .run(&mut arm, &mut scene)
        .unwrap_err();
    assert!(matches!(err, ServoError::IterationLimit { iterations: 3, .. }));
    assert_eq!(queue.moves().len(), 3);
}

#[test]
fn zero_timeout_fails_before_sampling() {
    let (_, mut arm, mut scene) = rig(Pose::new(240.0, 30.0, 45.0, 0.0), 1.0);
    let params = ServoParams {
        timeout_ms: Some(0),
        ..ServoParams::default()
    };
    let err = VisualServoLoop::new(params)
        .run(&mut arm, &mut scene)
        .unwrap_err();
    assert!(matches!(err, ServoError::Timeout { .. }));
    assert_eq!(scene.captures(), 0);
}

#[test]
fn arm_failure_propagates() {
    let (queue, mut arm, mut scene) = rig(Pose::new(240.0, 30.0, 45.0, 0.0), 1.0);
    queue.fail_at_command(2);
    let err = VisualServoLoop::default()
        .run(&mut arm, &mut scene)
        .unwrap_err();
    assert!(matches!(err, ServoError::Arm(_)));
    assert_eq!(queue.moves().len(), 2);
}

#[test]
fn runner_hands_back_collaborators() {
    let (queue, arm, scene) = rig(Pose::new(240.0, 30.0, 45.0, 0.0), 1.0);
    let handle = ServoRunner::spawn(VisualServoLoop::default(), arm, scene);
    let report = handle.wait().unwrap();
    let outcome = report.result.unwrap();
    assert!(report.vision.captures() >= outcome.iterations);
    assert_eq!(report.arm.queue().moves().len(), queue.moves().len());
}

#[test]
fn runner_can_be_polled() {
    let (_, arm, scene) = rig(Pose::new(240.0, 30.0, 45.0, 0.0), 1.0);
    let mut handle = ServoRunner::spawn(VisualServoLoop::default(), arm, scene);
    let report = loop {
        if let Some(report) = handle.try_result().unwrap() {
            break report;
        }
        std::thread::sleep(Duration::from_millis(1));
    };
    assert!(report.result.is_ok());
}

#[test]
fn runner_cancellation() {
    let queue = SimulatedQueue::new(Pose::new(240.0, 30.0, 45.0, 0.0)).with_polls_per_command(20);
    let scene = SimulatedScene::new(
        queue.clone(),
        CameraMount::EyeInHand { px_per_mm: 1.0 },
        FRAME,
        SimObject::at(200.0, 0.0),
    );
    let arm = QueuedArm::new(queue);
    let handle = ServoRunner::spawn(VisualServoLoop::default(), arm, scene);
    handle.cancel();
    let report = handle.wait().unwrap();
    assert_eq!(report.result.unwrap_err(), ServoError::Cancelled);
}
