use std::thread;

use super::*;
use crate::module::{CompiledModule, ImportTable, RenderArtifact};
use crate::resolver::{BuiltinStub, ResolvedTarget};
use crate::source::SourceKind;
use crate::ModuleId;

fn id(path: &str) -> ModuleId {
    ModuleId::new(path).unwrap()
}

fn module(path: &str, imports: &[&str]) -> CompiledModule {
    let mut table = ImportTable::new();
    for import in imports {
        let target = if import.starts_with('@') {
            ResolvedTarget::Builtin {
                stub: BuiltinStub::new(*import),
            }
        } else {
            ResolvedTarget::Module { id: id(import) }
        };
        table.push(*import, target);
    }
    CompiledModule::new(id(path), SourceKind::Script, table, RenderArtifact::default(), 0)
}

fn settle(graph: &ModuleGraph, path: &str, imports: &[&str]) {
    assert!(matches!(graph.claim(&id(path)), Claim::Acquired));
    graph.complete(module(path, imports));
}

#[test]
fn claim_is_exclusive() {
    let graph = ModuleGraph::new();
    let a = id("a.js");
    assert!(matches!(graph.claim(&a), Claim::Acquired));
    assert!(matches!(graph.claim(&a), Claim::InProgress));
    graph.complete(module("a.js", &[]));
    match graph.claim(&a) {
        Claim::Done(Some(found)) => assert_eq!(found.id, a),
        other => panic!("unexpected claim {other:?}"),
    }
}

#[test]
fn concurrent_claims_have_one_winner() {
    let graph = ModuleGraph::new();
    let target = id("shared.js");
    let winners: usize = (0..8)
        .map(|_| {
            let graph = graph.clone();
            let target = target.clone();
            thread::spawn(move || matches!(graph.claim(&target), Claim::Acquired) as usize)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .sum();
    assert_eq!(winners, 1);
}

#[test]
fn failed_units_settle_without_module() {
    let graph = ModuleGraph::new();
    let broken = id("broken.js");
    graph.claim(&broken);
    graph.fail(&broken);
    assert!(matches!(graph.claim(&broken), Claim::Done(None)));
    assert_eq!(graph.failed_ids(), vec![broken.clone()]);

    assert_eq!(graph.retry_failed(), vec![broken.clone()]);
    assert_eq!(graph.state(&broken), Some(VisitState::Unvisited));
    assert!(graph.failed_ids().is_empty());
}

#[test]
fn edges_and_importer_closure() {
    let graph = ModuleGraph::new();
    graph.set_entries([id("app.ux")]);
    settle(&graph, "app.ux", &["y.js", "z.js"]);
    settle(&graph, "y.js", &["x.js"]);
    settle(&graph, "x.js", &[]);
    settle(&graph, "z.js", &[]);

    assert_eq!(graph.dependencies(&id("app.ux")), vec![id("y.js"), id("z.js")]);
    assert_eq!(graph.dependents(&id("x.js")), vec![id("y.js")]);
    assert_eq!(
        graph.importers_closure([&id("x.js")]),
        vec![id("app.ux"), id("x.js"), id("y.js")]
    );
}

#[test]
fn invalidate_keeps_incoming_edges() {
    let graph = ModuleGraph::new();
    settle(&graph, "y.js", &["x.js"]);
    settle(&graph, "x.js", &["w.js"]);
    graph.invalidate([&id("x.js")]);

    assert_eq!(graph.state(&id("x.js")), Some(VisitState::Unvisited));
    assert!(graph.get(&id("x.js")).is_none());
    assert_eq!(graph.dependents(&id("x.js")), vec![id("y.js")]);
    assert!(graph.dependents(&id("w.js")).is_empty());
    assert_eq!(graph.unvisited_ids(), vec![id("x.js")]);
}

#[test]
fn cycles_are_built_once_and_reported() {
    let graph = ModuleGraph::new();
    graph.set_entries([id("a.js")]);
    settle(&graph, "a.js", &["b.js"]);
    assert!(matches!(graph.claim(&id("b.js")), Claim::Acquired));
    assert!(matches!(graph.claim(&id("a.js")), Claim::Done(Some(_))));
    graph.complete(module("b.js", &["a.js"]));
    settle(&graph, "self.js", &["self.js"]);

    assert_eq!(graph.len(), 3);
    assert_eq!(
        graph.find_cycles(),
        vec![vec![id("a.js"), id("b.js")], vec![id("self.js")]]
    );
}

#[test]
fn acyclic_graph_reports_no_cycles() {
    let graph = ModuleGraph::new();
    settle(&graph, "a.js", &["b.js", "c.js"]);
    settle(&graph, "b.js", &["c.js"]);
    settle(&graph, "c.js", &[]);
    assert!(graph.find_cycles().is_empty());
}

#[test]
fn deep_chain_does_not_overflow() {
    let graph = ModuleGraph::new();
    let depth = 20_000;
    for i in 0..depth {
        let next = format!("m{}.js", i + 1);
        let imports: Vec<&str> = if i + 1 < depth { vec![next.as_str()] } else { vec![] };
        settle(&graph, &format!("m{i}.js"), &imports);
    }
    assert!(graph.find_cycles().is_empty());
}

#[test]
fn prune_drops_unreachable_units() {
    let graph = ModuleGraph::new();
    graph.set_entries([id("app.ux")]);
    settle(&graph, "app.ux", &["kept.js", "@system.fetch"]);
    settle(&graph, "kept.js", &[]);
    settle(&graph, "orphan.js", &["kept.js"]);
    assert!(matches!(graph.claim(&ModuleId::builtin("@system.fetch")), Claim::Acquired));
    graph.complete(CompiledModule::builtin_stub(ModuleId::builtin("@system.fetch")));

    assert_eq!(graph.prune_unreachable(), vec![id("orphan.js")]);
    assert_eq!(graph.dependents(&id("kept.js")), vec![id("app.ux")]);
    assert_eq!(graph.builtin_capabilities(), vec!["system.fetch".to_string()]);
    assert_eq!(
        graph.modules().iter().map(|m| m.id.clone()).collect::<Vec<_>>(),
        vec![id("app.ux"), ModuleId::builtin("@system.fetch"), id("kept.js")]
    );
}
