use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn bin() -> Command {
    Command::cargo_bin("dobot-vision").unwrap()
}

fn write_template(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("session.json");
    bin().arg("init-config").arg(&path).assert().success();
    path
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).unwrap()
}

#[test]
fn init_config_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_template(&dir);
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"calibration\""));
    assert!(raw.contains("\"lift_z\": 20.0"));

    bin()
        .arg("init-config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    bin()
        .args(["init-config", "--force"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn map_midpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pair.json");
    std::fs::write(
        &path,
        r#"{"calibration": {
            "alignment_1": {"x": 0.0, "y": 0.0},
            "alignment_2": {"x": 10.0, "y": 20.0}
        }}"#,
    )
    .unwrap();
    let out = bin()
        .arg("map")
        .arg("--config")
        .arg(&path)
        .args(["--cx", "50", "--cy", "50", "--width", "100", "--height", "100"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&out);
    assert_eq!(v["x"].as_f64(), Some(5.0));
    assert_eq!(v["y"].as_f64(), Some(10.0));
}

#[test]
fn map_zero_height_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_template(&dir);
    bin()
        .arg("map")
        .arg("--config")
        .arg(&path)
        .args(["--cx", "10", "--cy", "10", "--width", "320", "--height", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("denominator is zero"));
}

#[test]
fn offset_prints_none_for_non_positive() {
    bin()
        .args(["offset", "--offset", "-5", "--joint1", "30"])
        .assert()
        .success()
        .stdout(predicate::str::diff("none\n"));
    let out = bin()
        .args(["offset", "--offset", "43", "--joint1", "0"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&out);
    assert!((v["x"].as_f64().unwrap() - 43.0).abs() < 1e-6);
    assert!(v["y"].as_f64().unwrap().abs() < 1e-6);
}

#[test]
fn simulate_servo_converges_and_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_template(&dir);
    let report = dir.path().join("servo.json");
    bin()
        .arg("simulate-servo")
        .arg("--config")
        .arg(&path)
        .args(["--object-x", "200", "--object-y", "0"])
        .arg("--out")
        .arg(&report)
        .assert()
        .success();
    let v: Value = serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert!(v["moves"].as_u64().unwrap() > 0);
    assert!((v["pose"]["x"].as_f64().unwrap() - 200.0).abs() <= 10.5);
}

#[test]
fn simulate_pick_calibrated_and_servo() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_template(&dir);

    let out = bin()
        .arg("simulate-pick")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&out);
    assert_eq!(v["commands"].as_u64(), Some(11));
    assert!((v["target"]["x"].as_f64().unwrap() - 230.0).abs() < 1.0);

    let out = bin()
        .arg("-v")
        .arg("simulate-pick")
        .arg("--config")
        .arg(&path)
        .arg("--servo")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = stdout_json(&out);
    assert_eq!(v["commands"].as_u64(), Some(11));
    assert!(v["servo_moves"].as_u64().unwrap() > 0);
}

#[test]
fn missing_config_is_reported() {
    bin()
        .args(["simulate-pick", "--config", "/nonexistent/session.json"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error:"));
}
