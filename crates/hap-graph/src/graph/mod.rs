//! Module graph arena.
//!
//! Every unit reachable from the entry points has exactly one slot keyed by
//! its `ModuleId`. A slot moves `Unvisited -> InProgress -> Done` and the
//! transition out of `Unvisited` is an atomic [`ModuleGraph::claim`], so
//! parallel compilation of one traversal layer never compiles a unit twice.
//! Revisiting an `InProgress` or `Done` slot short-circuits, which makes
//! import cycles between user modules harmless.

mod arena;
mod mutations;
mod queries;
mod traversal;

pub use arena::{Claim, ModuleGraph, VisitState};

#[cfg(test)]
mod tests;
