//! Memoized structural validation of a template graph.
//!
//! Validation runs before any build: each node first checks its own settings and
//! required input slots; a locally invalid node short-circuits without visiting
//! children. Locally valid nodes recurse into every connected input, and the first
//! failing descendant's verdict propagates up. Cycles are reported as the verdict
//! of the first node revisited on its own ancestor path — never a panic or a hang.
//!
//! Verdicts memoize per node id in an explicit [`ValidationCache`]. The cache is
//! only correct for the graph it was filled from; clear it (or use a fresh one)
//! after any graph reconstruction.
use std::collections::HashMap;

use crate::template::graph::{Node, TemplateGraph};
use crate::template::NodeId;

/// Reason string reported when a node is revisited on its own ancestor path.
pub(crate) const REASON_CYCLE: &str = "node depends on itself";

/// Outcome of validating a graph or subtree.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Valid,
    Invalid {
        /// Label of the first offending node; `None` when the graph itself is
        /// unusable (e.g. no root set).
        node: Option<NodeId>,
        reason: String,
    },
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    /// The offending node's label, if the verdict is invalid and node-specific.
    pub fn invalid_node(&self) -> Option<&str> {
        match self {
            Verdict::Valid => None,
            Verdict::Invalid { node, .. } => node.as_deref(),
        }
    }
}

/// Explicit memoization of per-node verdicts, keyed by node id.
#[derive(Debug, Default)]
pub struct ValidationCache {
    verdicts: HashMap<NodeId, Verdict>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Verdict> {
        self.verdicts.get(id)
    }

    pub fn insert(&mut self, id: NodeId, verdict: Verdict) {
        self.verdicts.insert(id, verdict);
    }

    pub fn remove(&mut self, id: &str) -> Option<Verdict> {
        self.verdicts.remove(id)
    }

    pub fn clear(&mut self) {
        self.verdicts.clear();
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }
}

/// Validates the whole graph from its root.
pub fn validate(graph: &TemplateGraph, cache: &mut ValidationCache) -> Verdict {
    let Some(root) = graph.root() else {
        return Verdict::Invalid {
            node: None,
            reason: "graph has no root template".into(),
        };
    };
    let mut path = Vec::new();
    validate_node(graph, root, cache, &mut path)
}

fn validate_node(
    graph: &TemplateGraph,
    id: &str,
    cache: &mut ValidationCache,
    path: &mut Vec<NodeId>,
) -> Verdict {
    if let Some(verdict) = cache.get(id) {
        return verdict.clone();
    }

    if path.iter().any(|ancestor| ancestor == id) {
        let verdict = Verdict::Invalid {
            node: Some(id.to_string()),
            reason: REASON_CYCLE.into(),
        };
        cache.insert(id.to_string(), verdict.clone());
        return verdict;
    }

    let Some(node) = graph.node(id) else {
        let verdict = Verdict::Invalid {
            node: Some(id.to_string()),
            reason: "node is not part of the graph".into(),
        };
        cache.insert(id.to_string(), verdict.clone());
        return verdict;
    };

    if let Err(reason) = check_local(graph, node) {
        let verdict = Verdict::Invalid {
            node: Some(id.to_string()),
            reason,
        };
        cache.insert(id.to_string(), verdict.clone());
        return verdict;
    }

    path.push(id.to_string());
    let verdict = walk_inputs(graph, node, cache, path);
    path.pop();

    cache.insert(id.to_string(), verdict.clone());
    verdict
}

/// Local settings and slot completeness check for one node.
fn check_local(graph: &TemplateGraph, node: &Node) -> Result<(), String> {
    node.kind.check_settings()?;

    for (slot, expected) in node.kind.required_slots() {
        match node.input(slot) {
            None => {
                return Err(format!("required input '{slot}' is not connected"));
            }
            Some(child_id) => match graph.node(child_id) {
                None => {
                    return Err(format!(
                        "input '{slot}' references unknown node '{child_id}'"
                    ));
                }
                Some(child) => {
                    if child.kind.slot_kind() != *expected {
                        return Err(format!(
                            "input '{slot}' must be a {expected} node, got {} ('{child_id}')",
                            child.kind.slot_kind()
                        ));
                    }
                }
            },
        }
    }
    Ok(())
}

/// Recurses into every connected input: required slots in declaration order
/// first, any extra connections after, sorted for deterministic reporting.
fn walk_inputs(
    graph: &TemplateGraph,
    node: &Node,
    cache: &mut ValidationCache,
    path: &mut Vec<NodeId>,
) -> Verdict {
    let required = node.kind.required_slots();
    for (slot, _) in required {
        if let Some(child) = node.input(slot) {
            let verdict = validate_node(graph, child, cache, path);
            if !verdict.is_valid() {
                return verdict;
            }
        }
    }

    let mut extra: Vec<(&String, &NodeId)> = node
        .inputs
        .iter()
        .filter(|(slot, _)| !required.iter().any(|(name, _)| *name == slot.as_str()))
        .collect();
    extra.sort_by(|(a, _), (b, _)| a.cmp(b));
    for (_, child) in extra {
        let verdict = validate_node(graph, child, cache, path);
        if !verdict.is_valid() {
            return verdict;
        }
    }

    Verdict::Valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::node::slots;
    use crate::template::{GeoSpec, TemplateSpec};

    fn agent_graph() -> TemplateGraph {
        let mut graph = TemplateGraph::new();
        graph.add_geo("geo", GeoSpec::object("Guard"));
        graph.add_template("spawn", TemplateSpec::agent("walker"));
        graph.connect("spawn", slots::OBJECTS, "geo").unwrap();
        graph.set_root("spawn").unwrap();
        graph
    }

    #[test]
    fn valid_graph_passes() {
        let graph = agent_graph();
        let mut cache = ValidationCache::new();
        assert!(validate(&graph, &mut cache).is_valid());
    }

    #[test]
    fn missing_root_is_reported_without_a_node() {
        let graph = TemplateGraph::new();
        let mut cache = ValidationCache::new();
        let verdict = validate(&graph, &mut cache);
        assert!(!verdict.is_valid());
        assert_eq!(verdict.invalid_node(), None);
    }

    #[test]
    fn unconnected_required_slot_names_the_node() {
        let mut graph = TemplateGraph::new();
        graph.add_template("spawn", TemplateSpec::agent("walker"));
        graph.set_root("spawn").unwrap();

        let mut cache = ValidationCache::new();
        let verdict = validate(&graph, &mut cache);
        assert_eq!(verdict.invalid_node(), Some("spawn"));
    }

    #[test]
    fn slot_kind_mismatch_is_invalid() {
        let mut graph = TemplateGraph::new();
        graph.add_template("inner", TemplateSpec::agent("walker"));
        graph.add_template("spawn", TemplateSpec::agent("walker"));
        // A template node where geometry is expected.
        graph.connect("spawn", slots::OBJECTS, "inner").unwrap();
        graph.set_root("spawn").unwrap();

        let mut cache = ValidationCache::new();
        let verdict = validate(&graph, &mut cache);
        assert_eq!(verdict.invalid_node(), Some("spawn"));
    }

    #[test]
    fn locally_invalid_node_short_circuits_before_children() {
        let mut graph = TemplateGraph::new();
        // Offset with a broken child; the child itself has a bad setting.
        graph.add_template("bad_child", TemplateSpec::switch(2.0));
        let params = crate::template::node::OffsetParams {
            carry_incoming: true,
            ..Default::default()
        };
        graph.add_template("offset", TemplateSpec::offset(params));
        graph.connect("offset", slots::TEMPLATE, "bad_child").unwrap();
        graph.set_root("offset").unwrap();

        let mut cache = ValidationCache::new();
        let verdict = validate(&graph, &mut cache);
        assert_eq!(verdict.invalid_node(), Some("bad_child"));
    }

    #[test]
    fn two_node_cycle_is_detected() {
        let mut graph = TemplateGraph::new();
        let params = crate::template::node::OffsetParams {
            carry_incoming: true,
            ..Default::default()
        };
        graph.add_template("a", TemplateSpec::offset(params.clone()));
        graph.add_template("b", TemplateSpec::offset(params));
        graph.connect("a", slots::TEMPLATE, "b").unwrap();
        graph.connect("b", slots::TEMPLATE, "a").unwrap();
        graph.set_root("a").unwrap();

        let mut cache = ValidationCache::new();
        let verdict = validate(&graph, &mut cache);
        assert!(!verdict.is_valid());
        // The revisited node on the ancestor path is "a".
        assert_eq!(verdict.invalid_node(), Some("a"));
    }

    #[test]
    fn verdicts_are_memoized_per_node() {
        let graph = agent_graph();
        let mut cache = ValidationCache::new();

        assert!(validate(&graph, &mut cache).is_valid());
        assert_eq!(cache.len(), 2);
        assert!(cache.get("spawn").is_some_and(Verdict::is_valid));

        // A second run over a warm cache returns the same verdict.
        assert!(validate(&graph, &mut cache).is_valid());
    }

    #[test]
    fn shared_child_is_validated_once_and_allowed() {
        // Diamond: both switch branches point at the same subtree. A DAG, not
        // a cycle.
        let mut graph = TemplateGraph::new();
        graph.add_geo("geo", GeoSpec::object("Guard"));
        graph.add_template("spawn", TemplateSpec::agent("walker"));
        graph.connect("spawn", slots::OBJECTS, "geo").unwrap();
        graph.add_template("switch", TemplateSpec::switch(0.5));
        graph.connect("switch", slots::TEMPLATE_1, "spawn").unwrap();
        graph.connect("switch", slots::TEMPLATE_2, "spawn").unwrap();
        graph.set_root("switch").unwrap();

        let mut cache = ValidationCache::new();
        assert!(validate(&graph, &mut cache).is_valid());
    }
}
