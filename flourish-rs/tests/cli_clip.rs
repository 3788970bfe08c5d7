//! CLI integration tests for the clip commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CLIP: &str = r#"{
    "Name": "Lunge",
    "Length": 1.0,
    "ExportTimeUTC": "2024-03-01T12:30:00Z",
    "Parts": [
        {
            "ID": 1,
            "Path": "Body",
            "TexturePath": "Things/Body",
            "Curves": {
                "Transform.m_LocalPosition.x": { "Keyframes": [
                    { "time": 0, "value": 0, "outTangent": 2 },
                    { "time": 1, "value": 2, "inTangent": 2 }
                ] },
                "GameObject.m_IsActive": { "Keyframes": [
                    { "time": 0, "value": 1, "inTangent": 0, "outTangent": "Infinity" },
                    { "time": 1, "value": 1, "inTangent": "Infinity", "outTangent": 0 }
                ] }
            }
        },
        {
            "ID": 2,
            "Path": "Body/Sword",
            "CustomName": "Sword",
            "ParentID": 1,
            "DefaultValues": { "Transform.m_LocalPosition.z": 1 }
        }
    ],
    "Events": [
        { "Time": 0.25, "Data": "PuntPawn;1;True" },
        { "Time": 0.75, "Data": "CamShakeEvent;3" }
    ]
}"#;

fn flourish() -> Command {
    Command::cargo_bin("flourish-rs").unwrap()
}

fn write_clip(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_info() {
    let dir = TempDir::new().unwrap();
    let clip = write_clip(&dir, "lunge.json", CLIP);

    flourish()
        .args(["clip", "info"])
        .arg(&clip)
        .assert()
        .success()
        .stdout(predicate::str::contains("Name: Lunge"))
        .stdout(predicate::str::contains("Parts: 2 (1 roots)"))
        .stdout(predicate::str::contains("Events: 2"))
        .stdout(predicate::str::contains("2024-03-01 12:30:00 UTC"));
}

#[test]
fn test_tree() {
    let dir = TempDir::new().unwrap();
    let clip = write_clip(&dir, "lunge.json", CLIP);

    flourish()
        .args(["clip", "tree", "--no-color"])
        .arg(&clip)
        .assert()
        .success()
        .stdout(predicate::str::contains("Lunge"))
        .stdout(predicate::str::contains("└── 📁 Sword"))
        .stdout(predicate::str::contains("Things/Body"));
}

#[test]
fn test_events_window() {
    let dir = TempDir::new().unwrap();
    let clip = write_clip(&dir, "lunge.json", CLIP);

    flourish()
        .args(["clip", "events", "--end", "0.5"])
        .arg(&clip)
        .assert()
        .success()
        .stdout(predicate::str::contains("PuntPawn;1;True"))
        .stdout(predicate::str::contains("CamShakeEvent").not());
}

#[test]
fn test_sample_json() {
    let dir = TempDir::new().unwrap();
    let clip = write_clip(&dir, "lunge.json", CLIP);

    let output = flourish()
        .args(["clip", "sample", "--time", "0.5", "--json"])
        .arg(&clip)
        .arg("Sword")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let world = value["world_position"].as_array().unwrap();
    assert!((world[0].as_f64().unwrap() - 1.0).abs() < 1e-4);
    assert!((world[2].as_f64().unwrap() - 1.0).abs() < 1e-4);
    assert_eq!(value["active"], true);
}

#[test]
fn test_sample_mirrored_text() {
    let dir = TempDir::new().unwrap();
    let clip = write_clip(&dir, "lunge.json", CLIP);

    flourish()
        .args(["clip", "sample", "--time", "1", "--mirror-x"])
        .arg(&clip)
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("World position: (-2.000, 0.000, 1.000)"))
        .stderr(predicate::str::contains("Failed to find part").not());
}

#[test]
fn test_sample_by_path_is_quiet() {
    let dir = TempDir::new().unwrap();
    let clip = write_clip(&dir, "lunge.json", CLIP);

    flourish()
        .args(["clip", "sample", "--time", "1"])
        .arg(&clip)
        .arg("Body/Sword")
        .assert()
        .success()
        .stdout(predicate::str::contains("World position: (2.000, 0.000, 1.000)"))
        .stderr(predicate::str::contains("Failed to find part").not());
}

#[test]
fn test_sample_unknown_part() {
    let dir = TempDir::new().unwrap();
    let clip = write_clip(&dir, "lunge.json", CLIP);

    flourish()
        .args(["clip", "sample", "--time", "0"])
        .arg(&clip)
        .arg("Shield")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No part 'Shield'"));
}

#[test]
fn test_validate_reports_failures() {
    let dir = TempDir::new().unwrap();
    write_clip(&dir, "good.json", CLIP);
    write_clip(&dir, "bad.json", &CLIP.replace("\"ParentID\": 1", "\"ParentID\": 7"));
    let pattern = dir.path().join("*.json");

    flourish()
        .args(["clip", "validate"])
        .arg(pattern.to_str().unwrap())
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 of 2 clips valid"));
}

#[test]
fn test_capture_appends_sweep_path() {
    let dir = TempDir::new().unwrap();
    let clip = write_clip(&dir, "lunge.json", CLIP);
    let out = dir.path().join("captured.json");

    flourish()
        .args(["clip", "capture", "--params", r#"{"target_distance": 0.25}"#, "--output"])
        .arg(&out)
        .arg(&clip)
        .arg("Sword")
        .assert()
        .success()
        .stdout(predicate::str::contains("Appended sweep path of 'Sword'"));

    // Stepped tangents survive the rewrite
    let written = fs::read_to_string(&out).unwrap();
    assert!(written.contains(r#""outTangent": "Infinity""#));
    assert!(written.contains(r#""inTangent": "Infinity""#));

    flourish()
        .args(["clip", "info"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sweep paths: 1 on 1 parts"));
}

#[test]
fn test_completions() {
    flourish()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flourish-rs"));
}
