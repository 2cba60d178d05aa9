pub mod circuit;
pub mod cli;
pub mod description;
pub mod element;
pub mod error;
pub mod netlist;
pub mod node;
pub mod report;
pub mod simulation;
pub mod subcircuit;

// Re-export commonly used types
pub use circuit::Circuit;
pub use element::{DeviceModel, Element, ElementKind, Parameters};
pub use error::{NetlistError, Result};
pub use netlist::{Netlist, Resolved};
pub use node::{Node, NodeMap};
pub use simulation::{CircuitSimulation, SimulationConfig};
pub use subcircuit::SubCircuit;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
