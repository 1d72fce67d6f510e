use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

#[allow(deprecated)]
fn cli() -> Command {
    let mut cmd = Command::cargo_bin("context-compile").expect("binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn setup_project() -> TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write(root, "README.md", "# demo");
    write(root, "src/app/main.py", "print('hi')");
    write(root, "src/utils/strings.ts", "export {}");
    write(root, "lib/core.py", "");
    write(root, "tests/test_core.py", "");
    write(
        root,
        ".context/instructions.json",
        r#"[
            {"name": "tone", "file_path": ".context/tone.md", "content": "Write clearly."},
            {"name": "ts", "file_path": ".context/ts.md", "applyTo": "src/utils/*.ts", "content": "Use strict mode."}
        ]"#,
    );
    temp
}

#[test]
fn compiles_default_manifest() {
    let temp = setup_project();
    let root = temp.path();

    cli()
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("written     AGENTS.md"))
        .stdout(predicate::str::contains("written     src/utils/AGENTS.md"));

    let utils = fs::read_to_string(root.join("src/utils/AGENTS.md")).unwrap();
    assert!(utils.contains("Use strict mode."));
    assert!(utils.contains("<!-- Source: local .context/ts.md -->"));
    assert!(!utils.contains("__BUILD_ID__"));
}

#[test]
fn second_run_reports_unchanged() {
    let temp = setup_project();
    let root = temp.path();

    cli().arg("--root").arg(root).assert().success();
    cli()
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged   AGENTS.md"));
}

#[test]
fn dry_run_json_report_writes_nothing() {
    let temp = setup_project();
    let root = temp.path();

    let output = cli()
        .arg("--root")
        .arg(root)
        .arg("--dry-run")
        .arg("--json")
        .output()
        .expect("command run");

    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body["dry_run"], true);
    assert_eq!(body["files"].as_array().unwrap().len(), 2);
    assert_eq!(body["stats"]["files_generated"], 2);
    assert_eq!(body["decisions"][1]["strategy"], "single_point");
    assert!(!root.join("AGENTS.md").exists());
}

#[test]
fn no_attribution_flag_drops_source_comments() {
    let temp = setup_project();
    let root = temp.path();

    cli()
        .arg("--root")
        .arg(root)
        .arg("--no-attribution")
        .assert()
        .success();

    let top = fs::read_to_string(root.join("AGENTS.md")).unwrap();
    assert!(top.contains("Write clearly."));
    assert!(!top.contains("<!-- Source:"));
}

#[test]
fn config_file_supplies_defaults() {
    let temp = setup_project();
    let root = temp.path();
    write(root, "context-compile.toml", "[compile]\ndry_run = true\n");

    cli()
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("(dry run)"));

    assert!(!root.join("AGENTS.md").exists());
}

#[test]
fn clean_removes_orphaned_output() {
    let temp = setup_project();
    let root = temp.path();
    cli().arg("--root").arg(root).assert().success();
    assert!(root.join("src/utils/AGENTS.md").exists());

    write(
        root,
        ".context/instructions.json",
        r#"[{"name": "tone", "file_path": ".context/tone.md", "content": "Write clearly."}]"#,
    );

    cli()
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Orphaned AGENTS.md found: src/utils/AGENTS.md"));
    assert!(root.join("src/utils/AGENTS.md").exists());

    cli()
        .arg("--root")
        .arg(root)
        .arg("--clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("removed     src/utils/AGENTS.md"));
    assert!(!root.join("src/utils/AGENTS.md").exists());
}

#[test]
fn explicit_manifest_must_exist() {
    let temp = setup_project();

    cli()
        .arg("--root")
        .arg(temp.path())
        .arg("--manifest")
        .arg(temp.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read manifest"));
}

#[test]
fn missing_root_fails() {
    let temp = tempdir().unwrap();

    cli()
        .arg("--root")
        .arg(temp.path().join("absent"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn zero_min_instructions_fails() {
    let temp = setup_project();

    cli()
        .arg("--root")
        .arg(temp.path())
        .arg("--min-instructions")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("min_instructions_per_file"));
}

#[test]
fn write_failure_exits_non_zero() {
    let temp = setup_project();
    let root = temp.path();
    fs::create_dir_all(root.join("src/utils/AGENTS.md")).unwrap();

    cli()
        .arg("--root")
        .arg(root)
        .assert()
        .failure()
        .stdout(predicate::str::contains("error: Failed to write src/utils/AGENTS.md"))
        .stdout(predicate::str::contains("failed      src/utils/AGENTS.md"));

    assert!(root.join("AGENTS.md").is_file());
}
