//! Reference graph over mixer entries.
//!
//! Nodes are entry identifiers; an edge `a -> b` means entry `a` directly
//! references entry `b`. Identifiers that appear only as edge targets (for
//! example entries removed after something started referencing them) are
//! nodes with no outgoing edges.
//!
//! # Invariants
//!
//! - The graph built from a mixer must be acyclic.

use crate::id::EntryId;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Default, Clone)]
pub struct ReferenceGraph {
    edges: BTreeMap<EntryId, BTreeSet<EntryId>>,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the direct references of `from`, replacing any previous set.
    pub fn insert_node(&mut self, from: EntryId, references: BTreeSet<EntryId>) {
        self.edges.insert(from, references);
    }

    /// Drop `id` and its outgoing edges. Edges pointing at `id` are kept.
    pub fn remove_node(&mut self, id: &str) -> Option<BTreeSet<EntryId>> {
        self.edges.remove(id)
    }

    pub fn add_edge(&mut self, from: EntryId, to: EntryId) {
        self.edges.entry(from).or_default().insert(to);
    }

    pub fn references(&self, id: &str) -> Option<&BTreeSet<EntryId>> {
        self.edges.get(id)
    }

    /// Everything reachable from `root`, excluding `root` unless it lies on
    /// a cycle.
    ///
    /// Breadth-first over the direct reference sets.
    pub fn closure(&self, root: &str) -> BTreeSet<EntryId> {
        let mut result = BTreeSet::new();
        let mut queue = VecDeque::new();

        if let Some(references) = self.references(root) {
            queue.extend(references.iter().cloned());
        }

        while let Some(current) = queue.pop_front() {
            if result.insert(current.clone()) {
                if let Some(references) = self.references(current.as_str()) {
                    queue.extend(references.iter().cloned());
                }
            }
        }

        result
    }

    /// Find any reference cycle.
    ///
    /// Returns the cycle as a path that starts and ends on the same
    /// identifier, or `None` if the graph is a DAG.
    pub fn find_cycle(&self) -> Option<Vec<EntryId>> {
        let mut search = Search::default();
        self.edges
            .keys()
            .find_map(|node| self.cycle_from(node, None, &mut search))
    }

    /// Find a cycle through `node`, taking `references` as its outgoing
    /// edges in place of any recorded ones.
    ///
    /// Used to check an entry that is not in the graph yet. Only the part
    /// of the graph reachable from `node` is visited.
    pub fn find_cycle_with(
        &self,
        node: &EntryId,
        references: &BTreeSet<EntryId>,
    ) -> Option<Vec<EntryId>> {
        let mut search = Search::default();
        self.cycle_from(node, Some((node, references)), &mut search)
    }

    fn cycle_from<'g>(
        &'g self,
        node: &'g EntryId,
        overlay: Option<(&'g EntryId, &'g BTreeSet<EntryId>)>,
        search: &mut Search<'g>,
    ) -> Option<Vec<EntryId>> {
        if search.on_path.contains(node) {
            let start = search.path.iter().position(|on_path| *on_path == node)?;
            let mut cycle: Vec<EntryId> = search.path[start..]
                .iter()
                .map(|id| (*id).clone())
                .collect();
            cycle.push(node.clone());
            return Some(cycle);
        }
        if !search.visited.insert(node) {
            return None;
        }

        search.on_path.insert(node);
        search.path.push(node);

        let references = match overlay {
            Some((overlaid, references)) if overlaid == node => Some(references),
            _ => self.edges.get(node),
        };
        if let Some(references) = references {
            for next in references {
                if let Some(cycle) = self.cycle_from(next, overlay, search) {
                    return Some(cycle);
                }
            }
        }

        search.on_path.remove(node);
        search.path.pop();
        None
    }
}

/// DFS state: `path` keeps the order for reporting, `on_path` answers
/// membership without scanning it.
#[derive(Default)]
struct Search<'g> {
    visited: BTreeSet<&'g EntryId>,
    on_path: BTreeSet<&'g EntryId>,
    path: Vec<&'g EntryId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntryId {
        EntryId::new(s)
    }

    fn set(ids: &[&str]) -> BTreeSet<EntryId> {
        ids.iter().map(|s| id(s)).collect()
    }

    fn graph(edges: &[(&str, &str)]) -> ReferenceGraph {
        let mut graph = ReferenceGraph::new();
        for (from, to) in edges {
            graph.add_edge(id(from), id(to));
        }
        graph
    }

    #[test]
    fn closure_is_transitive_and_excludes_root() {
        let graph = graph(&[("c", "b"), ("b", "a"), ("d", "c")]);
        let closure = graph.closure("d");
        assert_eq!(closure, set(&["c", "b", "a"]));
        assert!(graph.closure("a").is_empty());
    }

    #[test]
    fn closure_includes_targets_without_nodes() {
        let graph = graph(&[("b", "gone")]);
        assert_eq!(graph.closure("b"), set(&["gone"]));
    }

    #[test]
    fn closure_contains_root_only_through_cycle() {
        let graph = graph(&[("a", "b"), ("b", "a")]);
        assert!(graph.closure("a").contains("a"));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let graph = graph(&[("top", "left"), ("top", "right"), ("left", "base"), ("right", "base")]);
        assert_eq!(graph.find_cycle(), None);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let graph = graph(&[("a", "a")]);
        assert_eq!(graph.find_cycle(), Some(vec![id("a"), id("a")]));
    }

    #[test]
    fn overlay_node_closing_a_loop_is_reported() {
        let graph = graph(&[("b", "a"), ("c", "b")]);
        assert_eq!(graph.find_cycle_with(&id("new"), &set(&["c", "a"])), None);

        // "a" is overlaid with an edge back to "c", which reaches "a".
        let cycle = graph
            .find_cycle_with(&id("a"), &set(&["c"]))
            .expect("cycle must be found");
        assert_eq!(cycle, vec![id("a"), id("c"), id("b"), id("a")]);
        // The recorded graph itself is untouched.
        assert_eq!(graph.find_cycle(), None);
    }

    #[test]
    fn overlay_self_reference_is_a_cycle() {
        let graph = graph(&[("b", "a")]);
        let cycle = graph.find_cycle_with(&id("new"), &set(&["b", "new"]));
        assert_eq!(cycle, Some(vec![id("new"), id("new")]));
    }

    #[test]
    fn long_chain_is_checked_without_revisiting() {
        let mut graph = ReferenceGraph::new();
        for n in 1..1000 {
            graph.add_edge(id(&format!("n{n}")), id(&format!("n{}", n - 1)));
        }
        let head = BTreeSet::from([id("n999")]);
        assert_eq!(graph.find_cycle_with(&id("top"), &head), None);
        assert_eq!(graph.closure("n999").len(), 999);
    }

    #[test]
    fn transitive_cycle_reports_path() {
        let graph = graph(&[("x", "a"), ("a", "b"), ("b", "c"), ("c", "a")]);
        let cycle = graph.find_cycle().expect("cycle must be found");
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle, vec![id("a"), id("b"), id("c"), id("a")]);
    }
}
