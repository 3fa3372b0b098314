//! # hap-ux
//!
//! Compiler for hap source units.
//!
//! A `.ux` unit holds `<import>` tags plus at most one `<template>`, `<style>`
//! and `<script>` block. The template lowers to a render function over the
//! view model, the stylesheet to a style object and the script to a
//! CommonJS-style body whose imports go through `$app_require$`. Script,
//! JSON and style units compile to script bodies of their own.
//!
//! Every import is resolved while compiling. A unit never stops at its
//! first problem: [`Compiler::compile`] returns all of them at once.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use hap_graph::{ModuleId, NativeRuntime, ProjectLayout, Resolver, ResolverConfig, SourceKind, SourceUnit};
//! use hap_ux::Compiler;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = ProjectLayout::new("/work/demo", "src");
//! let resolver = Arc::new(Resolver::new(ResolverConfig::new(layout), Arc::new(NativeRuntime)));
//! let compiler = Compiler::new(resolver);
//!
//! let id = ModuleId::new("app.ux")?;
//! let unit = SourceUnit::new(id, "/work/demo/src/app.ux", SourceKind::Template, "<script>export default {}</script>");
//! let module = compiler.compile(&unit)?;
//! println!("{}", module.artifact.script);
//! # Ok(())
//! # }
//! ```

mod codegen;
mod compiler;
mod error;
pub mod expr;
pub mod markup;
pub mod script;
pub mod sfc;
pub mod style;

pub use compiler::Compiler;
pub use error::{CompileError, CompileErrors, ErrorRecord, MAX_FILE_SIZE, SyntaxError};
