use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};

use crate::error::Result;
use crate::netlist::Netlist;
use crate::simulation::{CircuitSimulation, SimulationConfig};
use crate::subcircuit::SubCircuit;

/// Conventional SPICE ground node
pub const DEFAULT_GROUND: &str = "0";

/// Top-level circuit: the root of netlist rendering
#[derive(Debug, Clone)]
pub struct Circuit {
    title: String,
    ground: String,
    global_nodes: IndexSet<String>,
    includes: IndexSet<PathBuf>,
    parameters: IndexMap<String, String>,
    subcircuits: IndexMap<String, SubCircuit>,
    netlist: Netlist,
}

impl Circuit {
    pub fn new(title: impl ToString) -> Self {
        Circuit {
            title: title.to_string(),
            ground: DEFAULT_GROUND.to_string(),
            global_nodes: IndexSet::new(),
            includes: IndexSet::new(),
            parameters: IndexMap::new(),
            subcircuits: IndexMap::new(),
            netlist: Netlist::new(),
        }
    }

    pub fn with_ground(mut self, ground: impl ToString) -> Self {
        self.ground = ground.to_string();
        self
    }

    pub fn with_global_nodes<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: ToString,
    {
        for node in nodes {
            self.global_node(node);
        }
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Ground node name
    pub fn gnd(&self) -> &str {
        &self.ground
    }

    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    /// Declare a `.global` node; returns false if already declared
    pub fn global_node(&mut self, node: impl ToString) -> bool {
        self.global_nodes.insert(node.to_string())
    }

    pub fn global_nodes(&self) -> impl Iterator<Item = &str> {
        self.global_nodes.iter().map(String::as_str)
    }

    /// Add an `.include` file; returns false if already included
    pub fn include(&mut self, path: impl AsRef<Path>) -> bool {
        self.includes.insert(path.as_ref().to_path_buf())
    }

    pub fn includes(&self) -> impl Iterator<Item = &Path> {
        self.includes.iter().map(PathBuf::as_path)
    }

    /// Set a `.param`; redefining a parameter replaces its expression in place
    pub fn parameter(&mut self, name: impl ToString, expression: impl ToString) {
        self.parameters.insert(name.to_string(), expression.to_string());
    }

    pub fn parameters(&self) -> &IndexMap<String, String> {
        &self.parameters
    }

    /// Register a subcircuit definition. The first definition of a name wins.
    pub fn subcircuit(&mut self, subcircuit: SubCircuit) -> bool {
        if self.subcircuits.contains_key(subcircuit.name()) {
            warn!(
                "Subcircuit {} already registered, ignoring duplicate",
                subcircuit.name()
            );
            return false;
        }

        debug!("Registering subcircuit: {}", subcircuit.name());
        self.subcircuits.insert(subcircuit.name().to_string(), subcircuit);
        true
    }

    pub fn subcircuits(&self) -> impl Iterator<Item = &SubCircuit> {
        self.subcircuits.values()
    }

    pub fn subcircuit_named(&self, name: &str) -> Option<&SubCircuit> {
        self.subcircuits.get(name)
    }

    /// Run the connectivity check of every registered subcircuit
    pub fn check_subcircuits(&self) -> Result<()> {
        for subcircuit in self.subcircuits() {
            subcircuit.check_nodes()?;
        }
        Ok(())
    }

    pub fn simulation(&self, config: SimulationConfig) -> CircuitSimulation<'_> {
        CircuitSimulation::with_config(self, config)
    }
}

impl Deref for Circuit {
    type Target = Netlist;

    fn deref(&self) -> &Netlist {
        &self.netlist
    }
}

impl DerefMut for Circuit {
    fn deref_mut(&mut self) -> &mut Netlist {
        &mut self.netlist
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ".title {}", self.title)?;
        for include in &self.includes {
            writeln!(f, ".include {}", include.display())?;
        }
        if !self.global_nodes.is_empty() {
            f.write_str(".global")?;
            for node in &self.global_nodes {
                write!(f, " {}", node)?;
            }
            writeln!(f)?;
        }
        for (name, expression) in &self.parameters {
            writeln!(f, ".param {}={}", name, expression)?;
        }
        for subcircuit in self.subcircuits.values() {
            write!(f, "{}", subcircuit)?;
        }
        write!(f, "{}", self.netlist)?;
        writeln!(f, ".end")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Parameters;
    use crate::error::NetlistError;

    fn example_circuit() -> Circuit {
        let mut circuit = Circuit::new("ex1");
        circuit.resistor(1, "in", "out", 1000);
        circuit.voltage_source(1, "in", 0, 5);
        circuit
    }

    #[test]
    fn test_simple_circuit_text() {
        let circuit = example_circuit();
        assert_eq!(circuit.to_string(), ".title ex1\nR1 in out 1000\nV1 in 0 5\n.end\n");
        assert_eq!(circuit.gnd(), "0");
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut circuit = example_circuit();
        circuit.model("DMOD", "D", [("is", "1e-14"), ("n", "1.8")]);
        circuit.parameter("rload", "{2*1k}");
        assert_eq!(circuit.to_string(), circuit.to_string());
    }

    #[test]
    fn test_full_section_order() {
        let mut sub = SubCircuit::new("divider", ["top", "tap", "bottom"]);
        sub.resistor(1, "top", "tap", "{rtop}");
        sub.resistor(2, "tap", "bottom", "10k");

        let mut circuit = Circuit::new("sections").with_global_nodes(["vdd", "vss", "vdd"]);
        circuit.include("models/diodes.lib");
        circuit.include("models/extra.lib");
        circuit.include("models/diodes.lib");
        circuit.parameter("rtop", "10k");
        circuit.parameter("vin", 5);
        circuit.model("DMOD", "D", [("is", "1e-14")]);
        assert!(circuit.subcircuit(sub));
        circuit.voltage_source("in", "in", 0, Parameters::new().value("DC").value("{vin}"));
        circuit.subcircuit_instance(1, "divider", ["in", "mid", "0"], ());
        circuit.diode(1, "mid", 0, Parameters::new().value("DMOD").param("area", 2));

        let expected = "\
.title sections
.include models/diodes.lib
.include models/extra.lib
.global vdd vss
.param rtop=10k
.param vin=5
.subckt divider top tap bottom
R1 top tap {rtop}
R2 tap bottom 10k
.ends
Vin in 0 DC {vin}
X1 in mid 0 divider
D1 mid 0 DMOD area=2
.model DMOD D (is=1e-14)
.end
";
        assert_eq!(circuit.to_string(), expected);
    }

    #[test]
    fn test_parameter_redefinition_keeps_position() {
        let mut circuit = Circuit::new("params");
        circuit.parameter("a", 1);
        circuit.parameter("b", 2);
        circuit.parameter("a", 3);
        assert_eq!(
            circuit.to_string(),
            ".title params\n.param a=3\n.param b=2\n.end\n"
        );
    }

    #[test]
    fn test_duplicate_subcircuit_keeps_first() {
        let mut circuit = Circuit::new("dup");
        assert!(circuit.subcircuit(SubCircuit::new("amp", ["in", "out"])));
        assert!(!circuit.subcircuit(SubCircuit::new("amp", ["a"])));

        let amp = circuit.subcircuit_named("amp").unwrap();
        let nodes: Vec<_> = amp.external_nodes().collect();
        assert_eq!(nodes, ["in", "out"]);
        assert_eq!(circuit.subcircuits().count(), 1);
    }

    #[test]
    fn test_check_subcircuits() {
        let mut good = SubCircuit::new("good", ["a"]);
        good.resistor(1, "a", 0, 1);
        let bad = SubCircuit::new("bad", ["x", "y"]);

        let mut circuit = Circuit::new("checks");
        circuit.subcircuit(good);
        assert!(circuit.check_subcircuits().is_ok());

        circuit.subcircuit(bad);
        assert_eq!(
            circuit.check_subcircuits(),
            Err(NetlistError::Connectivity {
                subcircuit: "bad".to_string(),
                nodes: vec!["x".to_string(), "y".to_string()],
            })
        );
    }

    #[test]
    fn test_custom_ground() {
        let circuit = Circuit::new("gnd").with_ground("gnd");
        assert_eq!(circuit.gnd(), "gnd");
    }
}
