//! Error types for the netlist object model.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetlistError {
    /// A name resolved to no element, model or node.
    #[error("no element, model or node named '{0}'")]
    NotFound(String),

    /// Declared subcircuit interface nodes that no contained element references.
    #[error("subcircuit {subcircuit} nodes {} are not connected", .nodes.join(", "))]
    Connectivity {
        subcircuit: String,
        nodes: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, NetlistError>;
