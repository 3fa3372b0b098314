//! Turning a settled graph into assets.

use hap_config::{MANIFEST_FILE, ProjectManifest};
use hap_graph::{
    Asset, AssetKind, CompiledModule, ModuleGraph, ModuleId, ProjectLayout, Runtime, RuntimeError, SourceKind,
};
use hap_ux::CompileError;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::stats::ModuleStat;

/// Emission switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Emit template styles as `<stem>.css.json` instead of inlining them.
    pub split_style: bool,
}

/// Chunk text of one compiled module.
///
/// ```text
/// $app_define$("<id>", function ($app_require$, exports, module) {
/// <script>
/// }, { "render": <render function>, "style": <style object> });
/// ```
pub fn chunk_source(module: &CompiledModule, style_ref: Option<&str>) -> String {
    let mut out = format!(
        "$app_define$({}, function ($app_require$, exports, module) {{\n",
        quote(module.id.as_str())
    );
    let script = module.artifact.script.trim_end();
    if !script.is_empty() {
        out.push_str(script);
        out.push('\n');
    }
    out.push('}');

    if module.kind == SourceKind::Template {
        let mut fields = Vec::new();
        if let Some(render) = &module.artifact.render {
            fields.push(format!("\"render\": {render}"));
        }
        match (style_ref, &module.artifact.style) {
            (Some(name), Some(_)) => fields.push(format!("\"styleRef\": {}", quote(name))),
            (None, Some(style)) => fields.push(format!("\"style\": {style}")),
            _ => {}
        }
        if !fields.is_empty() {
            out.push_str(", { ");
            out.push_str(&fields.join(", "));
            out.push_str(" }");
        }
    }
    out.push_str(");\n");
    out
}

fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Chunks (and split styles) for every compiled user module.
///
/// Output names drop the source extension, so `card.ux` and `card.js` would
/// both claim `card.js`. Such clashes are reported against the later id.
pub(crate) fn module_assets(
    graph: &ModuleGraph,
    options: EmitOptions,
) -> std::result::Result<(Vec<Asset>, Vec<ModuleStat>), Vec<CompileError>> {
    let mut assets = Vec::new();
    let mut stats = Vec::new();
    let mut owners: FxHashMap<String, ModuleId> = FxHashMap::default();
    let mut conflicts = Vec::new();

    for module in graph.modules() {
        if module.is_builtin() {
            continue;
        }
        let style_name = match (&module.artifact.style, module.kind) {
            (Some(_), SourceKind::Template) if options.split_style => Some(module.id.with_extension("css.json")),
            _ => None,
        };
        let chunk_name = module.id.with_extension("js");

        for name in std::iter::once(&chunk_name).chain(style_name.as_ref()) {
            if let Some(other) = owners.insert(name.clone(), module.id.clone()) {
                conflicts.push(CompileError::OutputConflict {
                    module: module.id.clone(),
                    other,
                    asset: name.clone(),
                });
            }
        }

        let chunk = chunk_source(&module, style_name.as_deref());
        let mut output_size = chunk.len();
        assets.push(Asset::new(chunk_name, AssetKind::Chunk, chunk.into_bytes()));

        if let (Some(name), Some(style)) = (style_name, &module.artifact.style) {
            output_size += style.len();
            assets.push(Asset::new(name, AssetKind::Style, style.as_bytes().to_vec()));
        }

        stats.push(ModuleStat {
            id: module.id.to_string(),
            source_size: module.source_size,
            output_size,
        });
    }

    if conflicts.is_empty() {
        Ok((assets, stats))
    } else {
        Err(conflicts)
    }
}

/// `manifest.json` with every built-in capability of the graph listed as a
/// feature.
pub(crate) fn manifest_asset(manifest: &ProjectManifest, graph: &ModuleGraph) -> Result<Asset> {
    let capabilities = graph.builtin_capabilities();
    let merged = manifest.with_capabilities(capabilities.iter().map(String::as_str));
    let bytes = merged.to_json_bytes()?;
    Ok(Asset::new(MANIFEST_FILE, AssetKind::Manifest, bytes))
}

/// Every file under the source root that is not compiled, copied verbatim.
///
/// JSON files are copied unless the graph compiled them; the root manifest
/// is always skipped. Hidden files are ignored.
pub(crate) fn media_assets(runtime: &dyn Runtime, layout: &ProjectLayout, graph: &ModuleGraph) -> Result<Vec<Asset>> {
    let src_root = layout.src_root();
    let files = match runtime.list_files(src_root) {
        Ok(files) => files,
        Err(RuntimeError::FileNotFound(_)) => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut assets = Vec::new();
    for path in files {
        let Ok(relative) = path.strip_prefix(src_root) else {
            continue;
        };
        if relative
            .components()
            .any(|part| part.as_os_str().to_str().is_some_and(|name| name.starts_with('.')))
        {
            continue;
        }
        let Some(id) = layout.id_for(&path) else {
            continue;
        };
        if id.as_str() == MANIFEST_FILE {
            continue;
        }
        match SourceKind::detect(&id) {
            Some(SourceKind::Json) if !graph.contains(&id) => {}
            Some(_) => continue,
            None => {}
        }
        let content = runtime.read(&path)?;
        assets.push(Asset::new(id.as_str(), AssetKind::Media, content));
    }
    Ok(assets)
}
