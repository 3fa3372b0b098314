//! Command functions driven directly, without the binary.

mod helpers;

use std::fs;

use hap_bundler::BuildState;
use hap_cli::CliError;
use hap_cli::cli::{BuildArgs, ProjectArgs, WatchArgs};
use hap_cli::commands::{self, OutputOptions, build_execute};
use hap_config::{BuildNameFormat, BuildProfile};
use helpers::*;
use serial_test::serial;

fn project_args(root: &std::path::Path) -> ProjectArgs {
    ProjectArgs {
        cwd: Some(root.to_path_buf()),
        ..ProjectArgs::default()
    }
}

#[test]
#[serial]
fn build_returns_report() {
    let project = project();
    let args = BuildArgs {
        project: project_args(project.path()),
        ..BuildArgs::default()
    };

    let report = build_execute(&args, BuildProfile::Dev, OutputOptions::default()).unwrap();
    assert_eq!(report.state, BuildState::Done);
    assert_eq!(report.stats.asset_count(), 4);
    assert!(report.package.unwrap().path.ends_with("dist/com.example.demo.dev.rpk"));
}

#[test]
#[serial]
fn config_file_and_env_layer_under_cli_flags() {
    let project = project();
    fs::write(
        project.path().join("hap.toml"),
        "dist_dir = \"out\"\nbuild_name_format = \"CUSTOM=file\"\n",
    )
    .unwrap();

    // Environment beats hap.toml.
    unsafe {
        std::env::set_var("HAP_STREAM_PACK", "true");
    }
    let args = BuildArgs {
        project: project_args(project.path()),
        ..BuildArgs::default()
    };
    let report = build_execute(&args, BuildProfile::Dev, OutputOptions::default());

    // CLI beats both.
    let cli_args = BuildArgs {
        project: ProjectArgs {
            disable_stream_pack: true,
            build_name_format: Some(BuildNameFormat::Custom("cli".to_string())),
            ..project_args(project.path())
        },
        verify: true,
        ..BuildArgs::default()
    };
    let cli_report = build_execute(&cli_args, BuildProfile::Dev, OutputOptions::default());
    unsafe {
        std::env::remove_var("HAP_STREAM_PACK");
    }

    let package = report.unwrap().package.unwrap();
    assert!(package.path.ends_with("out/com.example.demo.dev.file.rpk"));
    let streamed = hap_packager::verify(&fs::read(&package.path).unwrap()).unwrap();
    assert!(!streamed.has_meta_inf());

    let package = cli_report.unwrap().package.unwrap();
    assert!(package.path.ends_with("out/com.example.demo.dev.cli.rpk"));
    let full = hap_packager::verify(&fs::read(&package.path).unwrap()).unwrap();
    assert!(full.has_meta_inf());
}

#[test]
#[serial]
fn release_error_converts_to_cli_error() {
    let project = project();
    let args = BuildArgs {
        project: project_args(project.path()),
        ..BuildArgs::default()
    };

    let err = build_execute(&args, BuildProfile::Release, OutputOptions::default()).unwrap_err();
    let CliError::Build(err) = err else {
        panic!("expected a build error, got {err:?}");
    };
    assert_eq!(err.kind(), "MissingSigningMaterial");
}

#[tokio::test]
#[serial]
async fn watch_builds_once_and_stops_on_shutdown() {
    let project = project();
    let args = WatchArgs {
        project: project_args(project.path()),
        package: true,
    };

    let rebuilds = commands::watch::run(args, OutputOptions::default(), std::future::ready(()))
        .await
        .unwrap();
    assert_eq!(rebuilds, 0);
    assert!(project.path().join("build/app.js").is_file());
    assert_eq!(dist_files(project.path()), ["com.example.demo.dev.rpk"]);
}

#[tokio::test]
#[serial]
async fn watch_survives_failed_initial_build() {
    let project = project_with(&[("src/app.ux", "<script>\nimport gone from './gone'\n</script>\n")]);
    let args = WatchArgs {
        project: project_args(project.path()),
        package: false,
    };

    let rebuilds = commands::watch::run(args, OutputOptions::default(), std::future::ready(()))
        .await
        .unwrap();
    assert_eq!(rebuilds, 0);
    assert!(!project.path().join("build").exists());
}
