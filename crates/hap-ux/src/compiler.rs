//! Unit compilation: parse, resolve every import, lower.

use std::sync::Arc;

use hap_graph::{
    CompiledModule, ImportTable, ModuleId, RenderArtifact, ResolveError, Resolver, SourceKind, SourceUnit,
};
use tracing::debug;

use crate::codegen::{self, CodegenError, Components};
use crate::error::{CompileError, CompileErrors, LineIndex, MAX_FILE_SIZE, SyntaxError};
use crate::markup::{self, Node};
use crate::script::{self, ScriptImport};
use crate::sfc::{self, Block};
use crate::style::{self, CssError};

/// Compiles source units into [`CompiledModule`]s.
///
/// Compilation is pure apart from resolution: the same content and the same
/// resolver state always produce byte-identical output.
#[derive(Debug, Clone)]
pub struct Compiler {
    resolver: Arc<Resolver>,
}

impl Compiler {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    /// Compile one unit, reporting every error found in it.
    pub fn compile(&self, unit: &SourceUnit) -> Result<CompiledModule, CompileErrors> {
        if unit.size() > MAX_FILE_SIZE {
            return Err(CompileErrors::new(vec![CompileError::FileTooLarge {
                module: unit.id.clone(),
                size: unit.size(),
                max: MAX_FILE_SIZE,
            }]));
        }

        let mut session = Session::new(&self.resolver, unit);
        let artifact = match unit.kind {
            SourceKind::Template => session.template(),
            SourceKind::Script => session.script_module(),
            SourceKind::Json => session.json_module(),
            SourceKind::Style => session.style_module(),
            SourceKind::BuiltinStub => return Ok(CompiledModule::builtin_stub(unit.id.clone())),
        };

        if !session.errors.is_empty() {
            debug!(module = %unit.id, errors = session.errors.len(), "compile failed");
            return Err(CompileErrors::new(session.errors));
        }

        debug!(module = %unit.id, imports = session.imports.len(), "compiled");
        Ok(CompiledModule::new(
            unit.id.clone(),
            unit.kind,
            session.imports,
            artifact,
            unit.size(),
        ))
    }
}

/// State of a single compile call.
struct Session<'a> {
    resolver: &'a Resolver,
    unit: &'a SourceUnit,
    lines: LineIndex,
    imports: ImportTable,
    errors: Vec<CompileError>,
}

impl<'a> Session<'a> {
    fn new(resolver: &'a Resolver, unit: &'a SourceUnit) -> Self {
        Self {
            resolver,
            unit,
            lines: LineIndex::new(unit.content()),
            imports: ImportTable::new(),
            errors: Vec::new(),
        }
    }

    fn module(&self) -> &ModuleId {
        &self.unit.id
    }

    fn syntax(&mut self, error: SyntaxError) {
        let error = error.into_compile_error(&self.unit.id, &self.lines);
        self.errors.push(error);
    }

    fn unsupported(&mut self, feature: impl Into<String>) {
        self.errors.push(CompileError::UnsupportedFeature {
            module: self.unit.id.clone(),
            feature: feature.into(),
        });
    }

    /// Resolve a specifier, recording the result in the import table.
    /// Each failing specifier is reported once.
    fn resolve(&mut self, specifier: &str) -> Option<String> {
        if let Some(target) = self.imports.get(specifier) {
            return Some(target.id().to_string());
        }
        match self.resolver.resolve(specifier, &self.unit.id) {
            Ok(target) => {
                let id = target.id().to_string();
                self.imports.push(specifier, target);
                Some(id)
            }
            Err(ResolveError::UnresolvedImport { specifier, .. }) => {
                let already = self.errors.iter().any(|error| {
                    matches!(error, CompileError::UnresolvedImport { specifier: s, .. } if *s == specifier)
                });
                if !already {
                    self.errors.push(CompileError::UnresolvedImport {
                        module: self.unit.id.clone(),
                        specifier,
                    });
                }
                None
            }
        }
    }

    fn template(&mut self) -> RenderArtifact {
        let unit = self.unit;
        let source = unit.content();
        let document = match sfc::extract(source) {
            Ok(document) => document,
            Err(error) => {
                self.syntax(error);
                // still surface unresolved imports of intact tags and script
                for src in find_import_fallback(source) {
                    self.resolve(&src);
                }
                if let Some(script) = find_script_fallback(source) {
                    self.rewrite_script(script);
                }
                return RenderArtifact::default();
            }
        };

        let mut components = Components::new();
        for import in &document.imports {
            if let Some(id) = self.resolve(&import.src) {
                components.insert(import.name.clone(), id);
            }
        }

        let script = match &document.script {
            Some(block) => self.script_block(block),
            None => String::new(),
        };
        let style = document.style.as_ref().and_then(|block| self.style_block(block));
        let render = document.template.as_ref().and_then(|block| self.template_block(block, &components));

        RenderArtifact { render, style, script }
    }

    fn script_block(&mut self, block: &Block<'_>) -> String {
        let lang = block.lang("js");
        if lang != "js" {
            self.unsupported(format!("script lang '{lang}'"));
            return String::new();
        }
        self.rewrite_script(block.content)
    }

    fn style_block(&mut self, block: &Block<'_>) -> Option<String> {
        let lang = block.lang("css");
        if lang != "css" {
            self.unsupported(format!("style lang '{lang}'"));
            return None;
        }
        self.style_object(block.content, block.content_offset)
    }

    fn style_object(&mut self, css: &str, base: usize) -> Option<String> {
        match style::parse_css(css, base) {
            Ok(object) => Some(style::to_json(&object)),
            Err(CssError::AtRule { name, .. }) => {
                self.unsupported(format!("css at-rule '{name}'"));
                None
            }
            Err(CssError::Syntax(error)) => {
                self.syntax(error);
                None
            }
        }
    }

    fn template_block(&mut self, block: &Block<'_>, components: &Components) -> Option<String> {
        let nodes = match markup::parse_nodes(block.content, block.content_offset) {
            Ok(nodes) => nodes,
            Err(error) => {
                self.syntax(error);
                return None;
            }
        };

        let mut elements = nodes.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        });
        let stray_text = nodes.iter().find_map(|node| match node {
            Node::Text(text) => Some(text.offset),
            Node::Element(_) => None,
        });
        let (Some(root), None, None) = (elements.next(), elements.next(), stray_text) else {
            self.syntax(SyntaxError::new(block.offset, "<template> must contain exactly one root element"));
            return None;
        };

        match codegen::render_function(root, components) {
            Ok(render) => Some(render),
            Err(errors) => {
                for error in errors {
                    match error {
                        CodegenError::Syntax(error) => self.syntax(error),
                        CodegenError::Unsupported(feature) => self.unsupported(feature),
                    }
                }
                None
            }
        }
    }

    fn rewrite_script(&mut self, source: &str) -> String {
        let imports: Vec<ScriptImport> = script::scan(source);
        let resolved: Vec<Option<String>> = imports.iter().map(|import| self.resolve(&import.specifier)).collect();
        script::rewrite(source, &imports, &resolved)
    }

    fn script_module(&mut self) -> RenderArtifact {
        let unit = self.unit;
        let script = self.rewrite_script(unit.content());
        RenderArtifact {
            render: None,
            style: None,
            script,
        }
    }

    fn json_module(&mut self) -> RenderArtifact {
        let unit = self.unit;
        let text = unit.content().trim();
        if let Err(error) = serde_json::from_str::<serde_json::Value>(text) {
            self.errors.push(CompileError::InvalidJson {
                module: self.module().clone(),
                message: error.to_string(),
            });
            return RenderArtifact::default();
        }
        RenderArtifact {
            render: None,
            style: None,
            script: format!("module.exports = {text};\n"),
        }
    }

    fn style_module(&mut self) -> RenderArtifact {
        let unit = self.unit;
        let Some(style) = self.style_object(unit.content(), 0) else {
            return RenderArtifact::default();
        };
        RenderArtifact {
            render: None,
            script: format!("module.exports = {style};\n"),
            style: Some(style),
        }
    }
}

/// `src` of every `<import>` tag that still parses in a unit whose block
/// structure is broken.
fn find_import_fallback(source: &str) -> Vec<String> {
    let bytes = source.as_bytes();
    memchr::memmem::find_iter(bytes, b"<import")
        .filter(|&at| matches!(bytes.get(at + 7), Some(b' ' | b'\t' | b'\n' | b'\r' | b'/' | b'>')))
        .filter_map(|at| markup::parse_open_tag(source, at, 0).ok())
        .filter_map(|tag| tag.attrs.into_iter().find(|attr| attr.name == "src")?.value)
        .map(|src| src.trim().to_string())
        .filter(|src| !src.is_empty())
        .collect()
}

/// Locate a `<script>` body in a unit whose block structure is broken.
fn find_script_fallback(source: &str) -> Option<&str> {
    let open = memchr::memmem::find(source.as_bytes(), b"<script")?;
    let body_start = open + source[open..].find('>')? + 1;
    let body_end = body_start + memchr::memmem::find(&source.as_bytes()[body_start..], b"</script>")?;
    Some(&source[body_start..body_end])
}
