use assert_cmd::Command;

fn wodrun(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("wodrun").unwrap();
    cmd.env("HOME", home).env_remove("WODRUN_USER");
    cmd
}

#[test]
fn list_prints_bundled_workouts() {
    let home = tempfile::tempdir().unwrap();
    let output = wodrun(home.path()).arg("list").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("engine-builder"), "{stdout}");
    assert!(stdout.contains("mobility-flow"), "{stdout}");
}

#[test]
fn unknown_workout_fails_before_tty_check() {
    let home = tempfile::tempdir().unwrap();
    let output = wodrun(home.path())
        .args(["run", "--workout", "nope"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "{stderr}");
}

#[test]
fn empty_workout_file_is_refused() {
    let home = tempfile::tempdir().unwrap();
    let wod = home.path().join("empty.json");
    std::fs::write(&wod, r#"{"id": "empty", "title": "Empty"}"#).unwrap();

    let output = wodrun(home.path())
        .arg("--file")
        .arg(&wod)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no exercises"), "{stderr}");
}

#[test]
fn history_and_export_on_empty_database() {
    let home = tempfile::tempdir().unwrap();
    let history = wodrun(home.path()).arg("history").output().unwrap();
    assert!(history.status.success());
    assert!(String::from_utf8_lossy(&history.stdout).contains("no recorded sessions"));

    let csv = home.path().join("out.csv");
    let export = wodrun(home.path())
        .arg("export")
        .arg(&csv)
        .output()
        .unwrap();
    assert!(export.status.success());
    assert!(String::from_utf8_lossy(&export.stdout).contains("exported 0 sessions"));
}
