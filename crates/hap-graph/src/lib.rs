//! # hap-graph
//!
//! Module identities, import resolution and the module graph arena shared by
//! the hap compiler, bundler and packager.
//!
//! ## Overview
//!
//! - [`ModuleId`]: `/`-separated logical path relative to the project source
//!   root, or a `builtin:` id for runtime capabilities such as
//!   `@system.fetch`.
//! - [`Resolver`]: classifies import specifiers (relative, package-local or
//!   built-in) and maps them to targets, memoizing successes per
//!   `(specifier, importer)`.
//! - [`ModuleGraph`]: arena of compiled modules with an atomic three-state
//!   claim, reverse edges for watch-mode invalidation and cycle detection.
//! - [`AssetList`]: assets sorted by logical path.
//! - [`Runtime`]: file-system seam; [`NativeRuntime`] for real builds and
//!   `MemoryRuntime` (feature `test-utils`) for tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use hap_graph::{ModuleId, NativeRuntime, ProjectLayout, Resolver, ResolverConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = ProjectLayout::new("/work/demo", "src");
//! let resolver = Resolver::new(ResolverConfig::new(layout), Arc::new(NativeRuntime));
//!
//! let from = ModuleId::new("pages/Demo/index.ux")?;
//! let target = resolver.resolve("./helper", &from)?;
//! println!("{from} imports {}", target.id());
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod graph;
pub mod layout;
pub mod module;
pub mod module_id;
pub mod resolver;
pub mod runtime;
pub mod source;
pub mod specifier;

pub use asset::{Asset, AssetError, AssetKind, AssetList};
pub use graph::{Claim, ModuleGraph, VisitState};
pub use layout::ProjectLayout;
pub use module::{CompiledModule, ImportEntry, ImportTable, RenderArtifact};
pub use module_id::{ModuleId, ModuleIdError};
pub use resolver::{BuiltinStub, ResolveError, ResolvedTarget, Resolver, ResolverConfig};
pub use runtime::native::NativeRuntime;
pub use runtime::{Runtime, RuntimeError, RuntimeResult};
pub use source::{SourceKind, SourceUnit};
pub use specifier::{DEFAULT_BUILTIN_PREFIXES, ImportSpecifier, SpecifierKind};

#[cfg(any(test, feature = "test-utils"))]
pub use runtime::memory::MemoryRuntime;
