//! CLI behavior tests: exit codes, output formats, init, check-rubric, serve.

use assert_cmd::Command;
use predicates::prelude::*;
use podium::config::RubricConfig;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const INTRO: &str = "Good morning everyone. My name is Asha and I am 13 years old. \
    I study in class eight at Green Valley School. I live with my family, my parents \
    and my little brother. My hobby is painting and I love to read. Thank you.";

const RAMBLE: &str = "um so like um you know uh i mean um like so yeah";

fn podium_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_podium"));
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG").env_remove("PODIUM_LOG");
    cmd
}

/// The built-in rubric as JSON, edited by `edit`
fn rubric_json(edit: impl FnOnce(&mut serde_json::Value)) -> String {
    let mut rubric = serde_json::to_value(RubricConfig::default()).unwrap();
    edit(&mut rubric);
    rubric.to_string()
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn no_args_returns_error_not_panic() {
    let mut cmd = podium_cmd();
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("required"));
}

#[test]
fn console_report_lists_criteria() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "intro.txt", INTRO);
    let mut cmd = podium_cmd();
    cmd.arg(&file).arg("--duration").arg("30");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Speech Evaluation"))
        .stdout(predicate::str::contains("Content & Structure"))
        .stdout(predicate::str::contains("Speech Rate"));
}

#[test]
fn json_output_valid() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "intro.txt", INTRO);
    let mut cmd = podium_cmd();
    cmd.arg(&file).arg("--json").arg("--duration").arg("30");
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let s = String::from_utf8_lossy(&output.stdout);
    let v: serde_json::Value = serde_json::from_str(s.trim()).expect("valid JSON");
    assert!(v["finalScore"].is_number());
    assert_eq!(v["criteria"].as_array().unwrap().len(), 6);
    assert_eq!(v["durationSeconds"], 30.0);
}

#[test]
fn below_threshold_exit_1() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "ramble.txt", RAMBLE);
    let mut cmd = podium_cmd();
    cmd.arg(&file).arg("--threshold").arg("90");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("below threshold 90"));
}

#[test]
fn above_threshold_exit_0() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "intro.txt", INTRO);
    let mut cmd = podium_cmd();
    cmd.arg(&file).arg("--threshold").arg("10");
    cmd.assert().success();
}

#[test]
fn file_not_found_exit_2() {
    let mut cmd = podium_cmd();
    cmd.arg("no-such-transcript.txt");
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("no-such-transcript.txt"));
}

#[test]
fn binary_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blob.txt");
    fs::write(&path, [0x66u8, 0x6f, 0xff, 0x00, 0xfe]).unwrap();
    let mut cmd = podium_cmd();
    cmd.arg(&path);
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("not valid UTF-8"));
}

#[test]
fn directory_scores_txt_files_with_summary() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", INTRO);
    write(dir.path(), "b.txt", RAMBLE);
    write(dir.path(), "notes.md", "not a transcript");
    let mut cmd = podium_cmd();
    cmd.arg(dir.path()).arg("--json");
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let v: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(v["summary"]["transcriptsScored"], 2);
    let results = v["results"].as_array().unwrap();
    assert!(results[0]["source"].as_str().unwrap().ends_with("a.txt"));
    assert!(results[1]["source"].as_str().unwrap().ends_with("b.txt"));
}

#[test]
fn parallel_flag_gives_same_scores() {
    let dir = TempDir::new().unwrap();
    for i in 0..4 {
        write(dir.path(), &format!("t{}.txt", i), &format!("{} Take {}.", INTRO, i));
    }
    let run = |parallel: bool| {
        let mut cmd = podium_cmd();
        cmd.arg(dir.path()).arg("--json").arg("--duration").arg("40");
        if parallel {
            cmd.arg("--parallel").arg("--jobs").arg("2");
        }
        let output = cmd.output().unwrap();
        assert!(output.status.success());
        let v: serde_json::Value =
            serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
        v["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["finalScore"].as_f64().unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(false), run(true));
}

#[test]
fn stdin_quiet_mode() {
    let mut cmd = podium_cmd();
    cmd.arg("-").arg("--quiet").write_stdin(INTRO);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("<stdin>: "));
}

#[test]
fn rubric_discovered_in_parent_dirs() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        ".podiumrc.json",
        &rubric_json(|r| r["threshold"] = json!(99)),
    );
    let nested = dir.path().join("talks").join("week1");
    fs::create_dir_all(&nested).unwrap();
    let file = write(&nested, "intro.txt", RAMBLE);
    let mut cmd = podium_cmd();
    cmd.arg(&file);
    cmd.assert().failure().code(1);
}

#[test]
fn explicit_rubric_must_exist() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "intro.txt", INTRO);
    let mut cmd = podium_cmd();
    cmd.arg(&file).arg("--rubric").arg(dir.path().join("missing.json"));
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("rubric not found"));
}

#[test]
fn invalid_rubric_exit_2() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "intro.txt", INTRO);
    let rubric = write(
        dir.path(),
        "bad.json",
        &rubric_json(|r| r["totalWeight"] = json!(50)),
    );
    let mut cmd = podium_cmd();
    cmd.arg(&file).arg("--rubric").arg(&rubric);
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("weights sum to 100"));
}

#[test]
fn init_creates_rubric() {
    let dir = TempDir::new().unwrap();
    let rubric_path = dir.path().join(".podiumrc.json");
    let mut cmd = podium_cmd();
    cmd.arg("init").arg("--dir").arg(dir.path()).arg("--threshold").arg("65");
    cmd.assert().success();
    assert!(rubric_path.exists(), ".podiumrc.json should be created");
    let content = fs::read_to_string(&rubric_path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(v["threshold"], 65);
    assert_eq!(v["criteria"]["contentAndStructure"]["weight"], 40.0);
    assert!(v["fillers"].as_array().unwrap().len() > 5);

    let mut check = podium_cmd();
    check.arg("check-rubric").arg(&rubric_path);
    check.assert().success();
}

#[test]
fn init_does_not_overwrite() {
    let dir = TempDir::new().unwrap();
    let rubric_path = write(dir.path(), ".podiumrc.json", r#"{ "threshold": 50 }"#);
    let mut cmd = podium_cmd();
    cmd.arg("init").arg("--dir").arg(dir.path());
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(
        fs::read_to_string(&rubric_path).unwrap(),
        r#"{ "threshold": 50 }"#
    );
}

#[test]
fn check_rubric_prints_weight_table() {
    let dir = TempDir::new().unwrap();
    let rubric = write(
        dir.path(),
        "rubric.json",
        &rubric_json(|r| {
            r["criteria"]["speechRate"]["weight"] = json!(0);
            r["criteria"]["grammar"]["weight"] = json!(20);
        }),
    );
    let mut cmd = podium_cmd();
    cmd.arg("check-rubric").arg(&rubric);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Valid rubric"))
        .stdout(predicate::str::contains("Grammar"))
        .stdout(predicate::str::contains("Skip policy: redistribute"));
}

#[test]
fn rubric_extends_base() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "base.json", &rubric_json(|_| {}));
    let child = write(
        dir.path(),
        "strict.json",
        r#"{ "extends": "./base.json", "threshold": 99, "fillers": ["anyway"] }"#,
    );
    let file = write(dir.path(), "intro.txt", INTRO);

    let mut check = podium_cmd();
    check.arg("check-rubric").arg(&child);
    check
        .assert()
        .success()
        .stdout(predicate::str::contains("Threshold: 99"));

    let mut cmd = podium_cmd();
    cmd.arg(&file).arg("--rubric").arg(&child);
    cmd.assert().failure().code(1);
}

#[test]
fn check_rubric_rejects_invalid() {
    let dir = TempDir::new().unwrap();
    let rubric = write(
        dir.path(),
        "rubric.json",
        &rubric_json(|r| r["criteria"]["grammar"]["penaltyPerIssue"] = json!(-1)),
    );
    let mut cmd = podium_cmd();
    cmd.arg("check-rubric").arg(&rubric);
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("penaltyPerIssue"));
}

#[test]
fn serve_answers_each_line() {
    let mut cmd = podium_cmd();
    cmd.arg("serve").write_stdin(
        "{\"id\":\"a\",\"transcript\":\"Hello everyone. Thank you.\",\"durationSeconds\":4}\n\
         {\"id\":\"b\",\"transcript\":7}\n",
    );
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["id"], "a");
    assert!(lines[0]["report"]["finalScore"].is_number());
    assert_eq!(lines[1]["id"], "b");
    assert_eq!(lines[1]["error"]["kind"], "invalidInput");
}

#[test]
fn verbose_logs_go_to_stderr() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "intro.txt", INTRO);
    let mut cmd = podium_cmd();
    cmd.arg(&file).arg("--json").arg("--log-level").arg("debug");
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let _: serde_json::Value = serde_json::from_str(stdout.trim()).expect("stdout stays JSON");
    assert!(String::from_utf8_lossy(&output.stderr).contains("scored transcript"));
}
