//! Graph container for template nodes.
//!
//! A [`TemplateGraph`] is built once by an external editor/loader and reused across
//! many build calls. Nodes are immutable after construction; mutating settings on a
//! live graph is unsupported (rebuild the graph and a fresh
//! [`crate::template::validate::ValidationCache`] instead).
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::template::node::{GeoSpec, NodeKind, TemplateSpec};
use crate::template::NodeId;

/// A single node: spec plus named input bindings.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub inputs: HashMap<String, NodeId>,
}

impl Node {
    /// The node connected to the given input slot, if any.
    pub fn input(&self, slot: &str) -> Option<&NodeId> {
        self.inputs.get(slot)
    }
}

/// Id-keyed node storage with a single root template.
#[derive(Clone, Debug, Default)]
pub struct TemplateGraph {
    nodes: HashMap<NodeId, Node>,
    root: Option<NodeId>,
}

impl TemplateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, replacing any previous node with the same id.
    pub fn add(&mut self, id: &str, kind: NodeKind) -> &mut Self {
        self.nodes.insert(
            id.to_string(),
            Node {
                id: id.to_string(),
                kind,
                inputs: HashMap::new(),
            },
        );
        self
    }

    /// Adds a placement template node.
    pub fn add_template(&mut self, id: &str, spec: TemplateSpec) -> &mut Self {
        self.add(id, NodeKind::Template(spec))
    }

    /// Adds a geometry template node.
    pub fn add_geo(&mut self, id: &str, spec: GeoSpec) -> &mut Self {
        self.add(id, NodeKind::Geo(spec))
    }

    /// Connects `child` into the named input slot of `node`.
    pub fn connect(&mut self, node: &str, slot: &str, child: &str) -> Result<()> {
        if !self.nodes.contains_key(child) {
            return Err(Error::Structural(format!(
                "cannot connect unknown node '{child}' into '{node}'"
            )));
        }
        let target = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| Error::Structural(format!("unknown node '{node}'")))?;
        target.inputs.insert(slot.to_string(), child.to_string());
        Ok(())
    }

    /// Sets the root; must name an existing placement template.
    pub fn set_root(&mut self, id: &str) -> Result<()> {
        match self.nodes.get(id) {
            None => Err(Error::Structural(format!("unknown root node '{id}'"))),
            Some(node) => match node.kind {
                NodeKind::Template(_) => {
                    self.root = Some(id.to_string());
                    Ok(())
                }
                NodeKind::Geo(_) => Err(Error::Structural(format!(
                    "root node '{id}' must be a placement template, not geometry"
                ))),
            },
        }
    }

    pub fn root(&self) -> Option<&NodeId> {
        self.root.as_ref()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{GeoSpec, TemplateSpec};

    #[test]
    fn connect_rejects_unknown_nodes() {
        let mut graph = TemplateGraph::new();
        graph.add_template("spawn", TemplateSpec::agent("walker"));

        assert!(graph.connect("spawn", "Objects", "missing").is_err());
        assert!(graph.connect("missing", "Objects", "spawn").is_err());
    }

    #[test]
    fn root_must_be_a_template() {
        let mut graph = TemplateGraph::new();
        graph.add_geo("geo", GeoSpec::object("Guard"));
        graph.add_template("spawn", TemplateSpec::agent("walker"));

        assert!(graph.set_root("geo").is_err());
        assert!(graph.set_root("spawn").is_ok());
        assert_eq!(graph.root().map(String::as_str), Some("spawn"));
    }

    #[test]
    fn adding_same_id_replaces_the_node() {
        let mut graph = TemplateGraph::new();
        graph.add_template("n", TemplateSpec::agent("a"));
        graph.add_template("n", TemplateSpec::switch(0.5));

        assert_eq!(graph.len(), 1);
        let node = graph.node("n").unwrap();
        assert_eq!(node.kind.variant_name(), "Switch");
    }
}
