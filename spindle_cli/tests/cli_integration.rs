use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn spindle() -> Command {
    Command::cargo_bin("spindle").expect("binary built")
}

#[test]
fn convert_rpm_to_rcf() {
    spindle()
        .args(["convert", "--rpm", "903"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RPM 903 = RCF 100.3"));
}

#[test]
fn convert_rcf_to_rpm() {
    spindle()
        .args(["convert", "--rcf", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RPM 901 = RCF 100.0"));
}

#[test]
fn convert_json_shape() {
    let out = spindle()
        .args(["--json", "convert", "--rpm", "2000"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).expect("utf8");
    let line = text
        .lines()
        .find(|l| l.trim_start().starts_with('{') && l.contains("\"rpm\""))
        .expect("json line");
    let v: serde_json::Value = serde_json::from_str(line).expect("valid json");
    assert_eq!(v["rpm"], 2000);
    assert!((v["rcf"].as_f64().expect("rcf") - 491.92).abs() < 0.1);
}

#[test]
fn convert_requires_exactly_one_domain() {
    spindle().arg("convert").assert().failure();
}

#[test]
fn check_accepts_valid_config() {
    let mut file = tempfile::NamedTempFile::new().expect("tmp");
    writeln!(file, "[sampler]\nwindow_ms = 250\n").expect("write");
    spindle()
        .args(["--config"])
        .arg(file.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("config OK"));
}

#[test]
fn check_rejects_bad_config() {
    let mut file = tempfile::NamedTempFile::new().expect("tmp");
    writeln!(file, "[rotor]\nradius_cm = -3.0\n").expect("write");
    spindle()
        .args(["--config"])
        .arg(file.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("radius_cm"));
}

#[test]
fn check_requires_existing_file() {
    spindle()
        .args(["--config", "definitely/not/here.toml", "check"])
        .assert()
        .failure();
}

#[test]
fn check_validates_rotor_presets() {
    let mut cfg = tempfile::NamedTempFile::new().expect("tmp");
    writeln!(cfg, "[sampler]\nwindow_ms = 500\n").expect("write");
    let mut rotors = tempfile::NamedTempFile::new().expect("tmp");
    writeln!(rotors, "name,radius_cm\nswing-4x50,16.5").expect("write");

    spindle()
        .args(["--config"])
        .arg(cfg.path())
        .arg("--rotors")
        .arg(rotors.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("rotor presets OK"));

    let mut bad = tempfile::NamedTempFile::new().expect("tmp");
    writeln!(bad, "radius_cm,name\n16.5,swing").expect("write");
    spindle()
        .args(["--config"])
        .arg(cfg.path())
        .arg("--rotors")
        .arg(bad.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("headers"));
}

#[test]
fn unknown_rotor_preset_is_an_error() {
    let mut rotors = tempfile::NamedTempFile::new().expect("tmp");
    writeln!(rotors, "name,radius_cm\nswing-4x50,16.5").expect("write");
    spindle()
        .args(["--rotors"])
        .arg(rotors.path())
        .args(["spin", "--rpm", "1000", "--rotor", "nope", "--fast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown rotor preset"));
}

#[test]
fn simulated_spin_completes_a_short_cycle() {
    let mut cfg = tempfile::NamedTempFile::new().expect("tmp");
    writeln!(cfg, "[sampler]\nwindow_ms = 100\n").expect("write");

    spindle()
        .args(["--config"])
        .arg(cfg.path())
        .args([
            "--json",
            "--log-level",
            "error",
            "spin",
            "--rpm",
            "1000",
            "--secs",
            "1",
            "--fast",
            "--max-ticks",
            "300",
        ])
        .timeout(std::time::Duration::from_secs(60))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"final_rpm\""));
}
