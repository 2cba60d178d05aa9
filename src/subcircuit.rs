use std::fmt;
use std::ops::{Deref, DerefMut};

use indexmap::IndexSet;
use log::debug;

use crate::error::{NetlistError, Result};
use crate::netlist::Netlist;

/// A reusable netlist with a declared external-node interface
#[derive(Debug, Clone)]
pub struct SubCircuit {
    name: String,
    external_nodes: IndexSet<String>,
    ground: Option<String>,
    netlist: Netlist,
}

impl SubCircuit {
    pub fn new<I, N>(name: impl ToString, external_nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: ToString,
    {
        SubCircuit {
            name: name.to_string(),
            external_nodes: external_nodes.into_iter().map(|node| node.to_string()).collect(),
            ground: None,
            netlist: Netlist::new(),
        }
    }

    /// Name a ground node that is exempt from the connectivity check
    pub fn with_ground(mut self, ground: impl ToString) -> Self {
        self.ground = Some(ground.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interface nodes in declaration order
    pub fn external_nodes(&self) -> impl Iterator<Item = &str> {
        self.external_nodes.iter().map(String::as_str)
    }

    pub fn ground(&self) -> Option<&str> {
        self.ground.as_deref()
    }

    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    /// Fails if a declared external node is not referenced by any element.
    pub fn check_nodes(&self) -> Result<()> {
        let connected = self.netlist.nodes();
        let unconnected: Vec<String> = self
            .external_nodes
            .iter()
            .filter(|node| Some(node.as_str()) != self.ground.as_deref())
            .filter(|node| !connected.contains_key(node.as_str()))
            .cloned()
            .collect();

        if unconnected.is_empty() {
            debug!("Subcircuit {}: all external nodes connected", self.name);
            Ok(())
        } else {
            Err(NetlistError::Connectivity {
                subcircuit: self.name.clone(),
                nodes: unconnected,
            })
        }
    }
}

impl Deref for SubCircuit {
    type Target = Netlist;

    fn deref(&self) -> &Netlist {
        &self.netlist
    }
}

impl DerefMut for SubCircuit {
    fn deref_mut(&mut self) -> &mut Netlist {
        &mut self.netlist
    }
}

impl fmt::Display for SubCircuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".subckt {}", self.name)?;
        for node in &self.external_nodes {
            write!(f, " {}", node)?;
        }
        writeln!(f)?;
        write!(f, "{}", self.netlist)?;
        writeln!(f, ".ends")
    }
}
