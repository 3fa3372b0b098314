mod helpers;

use hap_bundler::{BuildError, BuildMode, EmitOptions};
use hap_config::ConfigError;
use hap_graph::ModuleId;
use hap_ux::CompileError;
use helpers::*;

#[test]
fn full_build_emits_sorted_asset_list() {
    let mut bundler = bundler(memory_runtime(&demo_files()), EmitOptions::default());
    let output = bundler.build_project(BuildMode::Full).unwrap();

    insta::assert_snapshot!(output.stats.asset_listing(), @r"
    length: 6
    app.js
    common/logo.png
    common/util.js
    manifest.json
    pages/Demo/index.js
    pages/Demo/part.js
    ");
    assert_eq!(
        output.compiled,
        vec![
            id("app.ux"),
            ModuleId::builtin("@system.fetch"),
            id("common/util.js"),
            id("pages/Demo/index.ux"),
            id("pages/Demo/part.ux"),
        ]
    );
    assert!(output.stats.errors.is_empty());
    assert_eq!(asset_text(&output, "common/logo.png"), "PNG");
}

#[test]
fn consecutive_full_builds_are_identical() {
    let mut bundler = bundler(memory_runtime(&demo_files()), EmitOptions::default());
    let first = bundler.build_project(BuildMode::Full).unwrap();
    let second = bundler.build_project(BuildMode::Full).unwrap();

    assert_eq!(first.assets.len(), second.assets.len());
    assert_eq!(names(&first), names(&second));
    assert_eq!(first.assets, second.assets);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn page_chunk_links_components_and_inlines_style() {
    let mut bundler = bundler(memory_runtime(&demo_files()), EmitOptions::default());
    let output = bundler.build_project(BuildMode::Full).unwrap();

    let chunk = asset_text(&output, "pages/Demo/index.js");
    assert!(chunk.starts_with("$app_define$(\"pages/Demo/index.ux\", function ($app_require$, exports, module) {"));
    assert!(chunk.contains(r#"$app_require$("pages/Demo/part.ux")"#));
    assert!(chunk.contains(r#"$app_require$("builtin:@system.fetch")"#));
    assert!(chunk.contains(r#""style": {".page":{"flexDirection":"column"}}"#));
    assert!(chunk.trim_end().ends_with(");"));
}

#[test]
fn split_style_emits_style_assets() {
    let mut bundler = bundler(memory_runtime(&demo_files()), EmitOptions { split_style: true });
    let output = bundler.build_project(BuildMode::Full).unwrap();

    assert_eq!(asset_text(&output, "pages/Demo/index.css.json"), r#"{".page":{"flexDirection":"column"}}"#);
    assert!(output.assets.get("pages/Demo/part.css.json").is_none());
    let chunk = asset_text(&output, "pages/Demo/index.js");
    assert!(chunk.contains(r#""styleRef": "pages/Demo/index.css.json""#));
    assert!(!chunk.contains("flexDirection"));
}

#[test]
fn manifest_lists_builtin_capabilities() {
    let mut files = demo_files();
    files.push(("src/common/util.js", "import gadget from '@system.gadget'\nexport default {}\n"));
    let mut bundler = bundler(memory_runtime(&files), EmitOptions::default());
    let output = bundler.build_project(BuildMode::Full).unwrap();

    let manifest: serde_json::Value = serde_json::from_str(&asset_text(&output, "manifest.json")).unwrap();
    let features: Vec<&str> = manifest["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|feature| feature["name"].as_str().unwrap())
        .collect();
    assert_eq!(features, ["system.fetch", "system.gadget", "system.prompt"]);
    assert_eq!(manifest["package"], "com.example.demo");
}

#[test]
fn import_cycle_builds_with_each_module_once() {
    let runtime = memory_runtime(&[
        ("src/app.js", "import a from './a'\n"),
        ("src/a.js", "import b from './b'\nexport default 1\n"),
        ("src/b.js", "import a from './a'\nexport default 2\n"),
    ]);
    let mut bundler = bundler(runtime, EmitOptions::default());
    let output = bundler.build(&[id("app.js")], BuildMode::Full).unwrap();

    assert_eq!(output.compiled, vec![id("a.js"), id("app.js"), id("b.js")]);
    assert_eq!(names(&output), ["a.js", "app.js", "b.js"]);
    assert_eq!(bundler.graph().len(), 3);

    assert_eq!(output.stats.warnings.len(), 1);
    let warning = &output.stats.warnings[0];
    assert_eq!(warning.kind, "CycleDetected");
    assert_eq!(warning.modules, ["a.js", "b.js"]);
}

#[test]
fn one_unresolved_import_is_one_error() {
    let mut files = demo_files();
    files.push(("src/common/util.js", "import gone from './gone'\n"));
    let mut bundler = bundler(memory_runtime(&files), EmitOptions::default());

    let err = bundler.build_project(BuildMode::Full).unwrap_err();
    assert_eq!(
        err.compile_errors(),
        [CompileError::UnresolvedImport {
            module: id("common/util.js"),
            specifier: "./gone".into(),
        }]
    );
}

#[test]
fn all_unresolved_imports_across_units_are_reported() {
    let mut files = demo_files();
    files.push(("src/app.ux", "<script>\nimport one from './missing-1'\n</script>\n"));
    files.push((
        "src/common/util.js",
        "import two from './missing-2'\nconst three = require('./missing-3')\n",
    ));
    let mut bundler = bundler(memory_runtime(&files), EmitOptions::default());

    let err = bundler.build_project(BuildMode::Full).unwrap_err();
    assert!(matches!(err, BuildError::PartialBuildAbort { .. }));
    let reported: Vec<(String, &str)> = err
        .compile_errors()
        .iter()
        .map(|error| match error {
            CompileError::UnresolvedImport { module, specifier } => (module.to_string(), specifier.as_str()),
            other => panic!("unexpected error {other:?}"),
        })
        .collect();
    assert_eq!(
        reported,
        [
            ("app.ux".to_string(), "./missing-1"),
            ("common/util.js".to_string(), "./missing-2"),
            ("common/util.js".to_string(), "./missing-3"),
        ]
    );
}

#[test]
fn missing_entry_unit_is_reported() {
    let files: Vec<_> = demo_files().into_iter().filter(|(path, _)| *path != "src/app.ux").collect();
    let mut bundler = bundler(memory_runtime(&files), EmitOptions::default());

    let err = bundler.build_project(BuildMode::Full).unwrap_err();
    let errors = err.compile_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), "UnresolvedImport");
    assert_eq!(errors[0].module(), &id("app.ux"));
}

#[test]
fn missing_manifest_is_a_config_error() {
    let mut bundler = bundler(memory_runtime(&[("src/app.ux", APP)]), EmitOptions::default());
    let err = bundler.build_project(BuildMode::Full).unwrap_err();
    assert!(matches!(err, BuildError::Config(ConfigError::ManifestNotFound(_))));
}

#[test]
fn module_stats_track_sizes() {
    let mut bundler = bundler(memory_runtime(&demo_files()), EmitOptions::default());
    let output = bundler.build_project(BuildMode::Full).unwrap();

    let page = output
        .stats
        .modules
        .iter()
        .find(|module| module.id == "pages/Demo/index.ux")
        .unwrap();
    assert_eq!(page.source_size, DEMO.len());
    assert_eq!(page.output_size, output.assets.get("pages/Demo/index.js").unwrap().size());
    assert!(output.stats.modules.iter().all(|module| !module.id.starts_with("builtin:")));
}

#[test]
fn multibyte_template_text_builds() {
    let mut files = demo_files();
    files.push((
        "src/pages/Demo/part.ux",
        "<template>\n  <text title=\"标题\">你好，{{ 名字 }}</text>\n</template>\n",
    ));
    let mut bundler = bundler(memory_runtime(&files), EmitOptions::default());
    let output = bundler.build_project(BuildMode::Full).unwrap();

    let chunk = asset_text(&output, "pages/Demo/part.js");
    assert!(chunk.contains(r#""title": "标题""#));
    assert!(chunk.contains(r#"return "你好，" + (vm.名字);"#));
}

#[test]
fn units_sharing_an_output_name_are_reported() {
    let mut files = demo_files();
    files.push((
        "src/app.ux",
        "<import name=\"card\" src=\"./card.ux\"></import>\n<template>\n  <card></card>\n</template>\n<script>\nimport helper from './card.js'\n</script>\n",
    ));
    files.push(("src/card.ux", "<template>\n  <text>card</text>\n</template>\n"));
    files.push(("src/card.js", "export default {}\n"));
    let mut bundler = bundler(memory_runtime(&files), EmitOptions::default());

    let err = bundler.build_project(BuildMode::Full).unwrap_err();
    assert!(matches!(err, BuildError::PartialBuildAbort { .. }));
    assert_eq!(
        err.compile_errors(),
        [CompileError::OutputConflict {
            module: id("card.ux"),
            other: id("card.js"),
            asset: "card.js".into(),
        }]
    );
}
