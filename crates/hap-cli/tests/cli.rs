//! End-to-end tests of the `hap` binary.

mod helpers;

use std::fs;

use assert_cmd::Command;
use helpers::*;
use predicates::prelude::*;

const MISSING_RELEASE_KEY: &str = "编译错误，缺少release签名私钥文件";

fn hap() -> Command {
    let mut cmd = Command::cargo_bin("hap").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn build_prints_listing_and_package_size() {
    let project = project();
    hap()
        .args(["build", "--cwd"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "length: 4\napp.js\ncommon/logo.png\nmanifest.json\npages/Demo/index.js",
        ))
        .stdout(predicate::str::is_match(r"大小为 \d+ KB").unwrap());

    assert_eq!(dist_files(project.path()), ["com.example.demo.dev.rpk"]);
    assert!(project.path().join("build/pages/Demo/index.js").is_file());
}

#[test]
fn release_without_key_fails() {
    let project = project();
    hap()
        .args(["release", "--cwd"])
        .arg(project.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(MISSING_RELEASE_KEY));

    assert!(dist_files(project.path()).is_empty());
}

#[test]
fn release_with_key_is_tagged_and_verified() {
    let project = project();
    write_signing(project.path(), "release");
    hap()
        .args(["release", "--build-name-format", "CUSTOM=dev", "--verify", "--cwd"])
        .arg(project.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("(signed)"));

    let files = dist_files(project.path());
    assert_eq!(files, ["com.example.demo.release.dev.rpk"]);
    assert!(files[0].contains("dev"));
}

#[test]
fn stream_pack_writes_stats_json() {
    let project = project();
    hap()
        .args(["build", "--stream-pack", "--verify", "--stats-json", "out/stats.json", "--cwd"])
        .arg(project.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("(unsigned)"));

    let stats: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(project.path().join("out/stats.json")).unwrap()).unwrap();
    assert_eq!(stats["assets"].as_array().unwrap().len(), 4);
    assert!(stats["errors"].as_array().unwrap().is_empty());
}

#[test]
fn compile_errors_fail_with_stats() {
    let project = project_with(&[("src/app.ux", "<script>\nimport gone from './gone'\n</script>\n")]);
    hap()
        .args(["build", "--stats-json", "stats.json", "--cwd"])
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("UnresolvedImport"))
        .stderr(predicate::str::contains("./gone"));

    let stats: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(project.path().join("stats.json")).unwrap()).unwrap();
    assert_eq!(stats["errors"][0]["kind"], "UnresolvedImport");
    assert_eq!(stats["errors"][0]["module"], "app.ux");
    assert!(!project.path().join("build").exists());
}

#[test]
fn no_package_skips_dist() {
    let project = project();
    hap()
        .args(["build", "--no-package", "--cwd"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("length: 4"));

    assert!(dist_files(project.path()).is_empty());
    assert!(project.path().join("build/manifest.json").is_file());
}

#[test]
fn missing_project_dir_fails() {
    hap()
        .args(["build", "--cwd", "/definitely/not/a/project"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Project directory not found"));
}

#[test]
fn conflicting_stream_flags_are_rejected() {
    hap()
        .args(["build", "--stream-pack", "--disable-stream-pack"])
        .assert()
        .failure()
        .code(2);
}
