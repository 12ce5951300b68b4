use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

#[cfg(unix)]
fn make_source(root: &Path, tag: &str, cases: &[&str]) -> PathBuf {
    let source_dir = root.join(tag).join("src");
    let test_files = source_dir.join("testfiles");
    let weather = source_dir.join("weather");
    let datasets = source_dir.join("datasets");
    for dir in [&test_files, &weather, &datasets] {
        std::fs::create_dir_all(dir).unwrap();
    }
    std::fs::write(weather.join("default.epw"), "default weather\n").unwrap();
    for case in cases {
        std::fs::write(test_files.join(format!("{case}.idf")), "Building;\n").unwrap();
    }
    source_dir
}

#[cfg(unix)]
fn make_build(root: &Path, tag: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let build_dir = root.join(tag).join("build");
    std::fs::create_dir_all(&build_dir).unwrap();
    let script = "#!/bin/sh\n\
        printf 'Simulation Completed Successfully-- 0 Warning; 0 Severe Errors; Elapsed Time=00hr 00min 10.00sec' > simout.end\n\
        printf 'Date,Load\\n01/01,100.0\\n' > simout.csv\n";
    let path = build_dir.join("sim");
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    build_dir
}

#[test]
fn help_describes_the_tool() {
    Command::cargo_bin("simregress")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("two simulator builds"));
}

#[test]
fn missing_case_list_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("simregress")
        .unwrap()
        .args([
            dir.path().join("a_src").to_str().unwrap(),
            dir.path().join("a_build").to_str().unwrap(),
            dir.path().join("b_src").to_str().unwrap(),
            dir.path().join("b_build").to_str().unwrap(),
            dir.path().join("no_such_cases.json").to_str().unwrap(),
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read case list"));
}

#[cfg(unix)]
#[test]
fn full_run_writes_summaries_under_build_a() {
    let dir = tempfile::tempdir().unwrap();
    let a_src = make_source(dir.path(), "a", &["SimpleTest"]);
    let b_src = make_source(dir.path(), "b", &["SimpleTest"]);
    let a_build = make_build(dir.path(), "a");
    let b_build = make_build(dir.path(), "b");

    let case_list = dir.path().join("cases.json");
    std::fs::write(
        &case_list,
        r#"{"files_to_run": [{"file": "SimpleTest"}]}"#,
    )
    .unwrap();

    Command::cargo_bin("simregress")
        .unwrap()
        .args([
            a_src.to_str().unwrap(),
            a_build.to_str().unwrap(),
            b_src.to_str().unwrap(),
            b_build.to_str().unwrap(),
            case_list.to_str().unwrap(),
            "-a",
            "-b",
            "-j",
            "2",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Test suite complete"));

    let output_root = std::fs::read_dir(&a_build)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("Tests_"))
        })
        .expect("timestamped output root under build A");

    assert!(output_root.join("run_times.csv").exists());
    let results: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(output_root.join("test_results.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(results["diffed"]["cases"][0], "SimpleTest");
    assert_eq!(results["big_math_diffs"]["cases"].as_array().unwrap().len(), 0);
}

#[test]
fn filter_selecting_nothing_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let case_list = dir.path().join("cases.json");
    std::fs::write(
        &case_list,
        r#"{"files_to_run": [{"file": "SimpleTest"}]}"#,
    )
    .unwrap();
    Command::cargo_bin("simregress")
        .unwrap()
        .args([
            dir.path().join("a_src").to_str().unwrap(),
            dir.path().join("a_build").to_str().unwrap(),
            dir.path().join("b_src").to_str().unwrap(),
            dir.path().join("b_build").to_str().unwrap(),
            case_list.to_str().unwrap(),
            "--filter",
            "^NoSuchCase$",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("selected no cases"));
}
