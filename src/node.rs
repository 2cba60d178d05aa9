use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::element::Element;

/// Nodes keyed by name, in order of first appearance
pub type NodeMap = IndexMap<String, Node>;

/// A named connection point and the elements that declare it.
///
/// Nodes are never authored directly; they are derived from the node
/// lists of the registered elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    name: String,
    elements: IndexSet<String>,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            elements: IndexSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Qualified names of the elements attached to this node
    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(String::as_str)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn contains(&self, element_name: &str) -> bool {
        self.elements.contains(element_name)
    }

    pub(crate) fn add_element(&mut self, element_name: &str) {
        self.elements.insert(element_name.to_string());
    }
}

/// Build the complete node mapping for `elements` in one pass.
pub(crate) fn derive_nodes<'a>(elements: impl IntoIterator<Item = &'a Element>) -> NodeMap {
    let mut nodes = NodeMap::new();
    for element in elements {
        for node_name in element.nodes() {
            nodes
                .entry(node_name.clone())
                .or_insert_with(|| Node::new(node_name.as_str()))
                .add_element(element.name());
        }
    }
    nodes
}
