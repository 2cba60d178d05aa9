use std::cell::OnceCell;
use std::fmt;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::element::{DeviceModel, Element, ElementKind, Parameters};
use crate::error::{NetlistError, Result};
use crate::node::{derive_nodes, Node, NodeMap};

/// What a name resolves to inside a netlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    Element(&'a Element),
    Model(&'a DeviceModel),
    Node(&'a str),
}

/// A container of uniquely named elements and device models.
///
/// Nodes are derived from the element node lists on demand. The derived
/// mapping is either fresh (cell filled) or stale (cell empty): element
/// registration empties the cell, and the next read rebuilds the whole
/// mapping before storing it, so a partially built mapping is never
/// observable.
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    elements: IndexMap<String, Element>,
    models: IndexMap<String, DeviceModel>,
    nodes: OnceCell<NodeMap>,
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element. Returns false and keeps the existing element if
    /// the qualified name is already taken.
    pub fn add_element(&mut self, element: Element) -> bool {
        if self.elements.contains_key(element.name()) {
            warn!("Element {} already registered, ignoring duplicate", element.name());
            return false;
        }

        debug!("Registering element: {}", element);
        self.elements.insert(element.name().to_string(), element);
        self.nodes.take();
        true
    }

    pub fn resistor(
        &mut self,
        name: impl ToString,
        node_plus: impl ToString,
        node_minus: impl ToString,
        parameters: impl Into<Parameters>,
    ) -> bool {
        self.add_element(Element::two_terminal(
            ElementKind::Resistor,
            name,
            node_plus,
            node_minus,
            parameters,
        ))
    }

    pub fn capacitor(
        &mut self,
        name: impl ToString,
        node_plus: impl ToString,
        node_minus: impl ToString,
        parameters: impl Into<Parameters>,
    ) -> bool {
        self.add_element(Element::two_terminal(
            ElementKind::Capacitor,
            name,
            node_plus,
            node_minus,
            parameters,
        ))
    }

    pub fn inductor(
        &mut self,
        name: impl ToString,
        node_plus: impl ToString,
        node_minus: impl ToString,
        parameters: impl Into<Parameters>,
    ) -> bool {
        self.add_element(Element::two_terminal(
            ElementKind::Inductor,
            name,
            node_plus,
            node_minus,
            parameters,
        ))
    }

    pub fn diode(
        &mut self,
        name: impl ToString,
        node_plus: impl ToString,
        node_minus: impl ToString,
        parameters: impl Into<Parameters>,
    ) -> bool {
        self.add_element(Element::two_terminal(
            ElementKind::Diode,
            name,
            node_plus,
            node_minus,
            parameters,
        ))
    }

    pub fn voltage_source(
        &mut self,
        name: impl ToString,
        node_plus: impl ToString,
        node_minus: impl ToString,
        parameters: impl Into<Parameters>,
    ) -> bool {
        self.add_element(Element::two_terminal(
            ElementKind::VoltageSource,
            name,
            node_plus,
            node_minus,
            parameters,
        ))
    }

    pub fn subcircuit_instance<I, N>(
        &mut self,
        name: impl ToString,
        subcircuit_name: impl ToString,
        nodes: I,
        parameters: impl Into<Parameters>,
    ) -> bool
    where
        I: IntoIterator<Item = N>,
        N: ToString,
    {
        self.add_element(Element::subcircuit_instance(
            name,
            subcircuit_name,
            nodes,
            parameters,
        ))
    }

    /// Register a device model; the first model registered under a name wins.
    /// Models never affect the node mapping.
    pub fn add_model(&mut self, model: DeviceModel) -> bool {
        if self.models.contains_key(model.name()) {
            warn!("Model {} already registered, ignoring duplicate", model.name());
            return false;
        }

        debug!("Registering model: {}", model);
        self.models.insert(model.name().to_string(), model);
        true
    }

    pub fn model<I, K, V>(&mut self, name: impl ToString, model_type: impl ToString, parameters: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: ToString,
    {
        self.add_model(DeviceModel::new(name, model_type, parameters))
    }

    /// Elements in registration order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Models in registration order
    pub fn models(&self) -> impl Iterator<Item = &DeviceModel> {
        self.models.values()
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.get(name)
    }

    pub fn model_named(&self, name: &str) -> Option<&DeviceModel> {
        self.models.get(name)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.models.is_empty()
    }

    /// The node mapping, rebuilt first if an element was registered since
    /// the last read.
    pub fn nodes(&self) -> &NodeMap {
        self.nodes.get_or_init(|| {
            let nodes = derive_nodes(self.elements.values());
            debug!(
                "Derived {} nodes from {} elements",
                nodes.len(),
                self.elements.len()
            );
            nodes
        })
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes().get(name)
    }

    /// True when the node mapping reflects every registered element
    pub fn is_node_cache_fresh(&self) -> bool {
        self.nodes.get().is_some()
    }

    /// Look a name up among elements, then models, then nodes.
    pub fn resolve(&self, name: &str) -> Result<Resolved<'_>> {
        if let Some(element) = self.elements.get(name) {
            Ok(Resolved::Element(element))
        } else if let Some(model) = self.models.get(name) {
            Ok(Resolved::Model(model))
        } else if let Some((node_name, _)) = self.nodes().get_key_value(name) {
            Ok(Resolved::Node(node_name.as_str()))
        } else {
            Err(NetlistError::NotFound(name.to_string()))
        }
    }
}

impl fmt::Display for Netlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in self.elements() {
            writeln!(f, "{}", element)?;
        }
        for model in self.models() {
            writeln!(f, "{}", model)?;
        }
        Ok(())
    }
}
