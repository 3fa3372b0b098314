//! Traversal methods for ModuleGraph.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use super::arena::ModuleGraph;
use crate::ModuleId;

impl ModuleGraph {
    /// Every id reachable from the entry points, entries included.
    pub fn reachable(&self) -> HashSet<ModuleId> {
        let inner = self.inner.read();
        let mut visited = HashSet::default();
        let mut queue: VecDeque<ModuleId> = inner.entries.iter().cloned().collect();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(deps) = inner.dependencies.get(&current) {
                for dep in deps {
                    if !visited.contains(dep) {
                        queue.push_back(dep.clone());
                    }
                }
            }
        }

        visited
    }

    /// The seeds plus every transitive importer of any seed, sorted.
    pub fn importers_closure<'a, I>(&self, seeds: I) -> Vec<ModuleId>
    where
        I: IntoIterator<Item = &'a ModuleId>,
    {
        let inner = self.inner.read();
        let mut visited = HashSet::default();
        let mut queue: VecDeque<ModuleId> = seeds.into_iter().cloned().collect();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(importers) = inner.dependents.get(&current) {
                for importer in importers {
                    if !visited.contains(importer) {
                        queue.push_back(importer.clone());
                    }
                }
            }
        }

        let mut ids: Vec<ModuleId> = visited.into_iter().collect();
        ids.sort();
        ids
    }

    /// Strongly connected components of user modules that form a cycle
    /// (more than one member, or a self import). Members are sorted within
    /// each component and components are sorted.
    ///
    /// Iterative Tarjan, so deep graphs cannot overflow the stack.
    pub fn find_cycles(&self) -> Vec<Vec<ModuleId>> {
        let inner = self.inner.read();
        let mut nodes: Vec<&ModuleId> = inner.slots.keys().filter(|id| !id.is_builtin()).collect();
        nodes.sort();
        let position: HashMap<&ModuleId, usize> =
            nodes.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let adjacency: Vec<Vec<usize>> = nodes
            .iter()
            .map(|id| {
                inner
                    .dependencies
                    .get(*id)
                    .map(|deps| deps.iter().filter_map(|dep| position.get(dep).copied()).collect())
                    .unwrap_or_default()
            })
            .collect();

        const UNSEEN: usize = usize::MAX;
        let count = nodes.len();
        let mut index = vec![UNSEEN; count];
        let mut low = vec![0; count];
        let mut on_stack = vec![false; count];
        let mut stack = Vec::new();
        let mut next_index = 0;
        let mut cycles = Vec::new();

        for root in 0..count {
            if index[root] != UNSEEN {
                continue;
            }
            index[root] = next_index;
            low[root] = next_index;
            next_index += 1;
            stack.push(root);
            on_stack[root] = true;
            let mut work = vec![(root, 0usize)];

            while let Some(frame) = work.last_mut() {
                let node = frame.0;
                if let Some(&next) = adjacency[node].get(frame.1) {
                    frame.1 += 1;
                    if index[next] == UNSEEN {
                        index[next] = next_index;
                        low[next] = next_index;
                        next_index += 1;
                        stack.push(next);
                        on_stack[next] = true;
                        work.push((next, 0));
                    } else if on_stack[next] {
                        low[node] = low[node].min(index[next]);
                    }
                    continue;
                }

                work.pop();
                if let Some(&(parent, _)) = work.last() {
                    low[parent] = low[parent].min(low[node]);
                }
                if low[node] != index[node] {
                    continue;
                }

                let mut component = Vec::new();
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                let self_import = component.len() == 1 && adjacency[node].contains(&node);
                if component.len() > 1 || self_import {
                    let mut ids: Vec<ModuleId> = component.iter().map(|&i| nodes[i].clone()).collect();
                    ids.sort();
                    cycles.push(ids);
                }
            }
        }

        cycles.sort();
        cycles
    }
}
