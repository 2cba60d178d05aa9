//! JSON circuit decks.
//!
//! A deck describes a circuit (and optionally its simulation directives)
//! as data. Building a deck goes through the same registration calls a
//! program would make, so duplicate names and ordering behave the same.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};

use crate::circuit::Circuit;
use crate::element::{DeviceModel, Element, ElementKind, Parameters};
use crate::netlist::Netlist;
use crate::simulation::{CircuitSimulation, SimulationConfig};
use crate::subcircuit::SubCircuit;

/// A string, number or boolean written into the netlist as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(text) => f.write_str(text),
            Scalar::Number(number) => write!(f, "{}", number),
            Scalar::Bool(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CircuitDescription {
    pub title: String,
    #[serde(default)]
    pub ground: Option<Scalar>,
    #[serde(default)]
    pub global_nodes: Vec<Scalar>,
    #[serde(default)]
    pub includes: Vec<PathBuf>,
    #[serde(default)]
    pub parameters: IndexMap<String, Scalar>,
    #[serde(default)]
    pub subcircuits: Vec<SubCircuitDescription>,
    #[serde(default)]
    pub elements: Vec<ElementDescription>,
    #[serde(default)]
    pub models: Vec<ModelDescription>,
    #[serde(default)]
    pub simulation: Option<SimulationDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubCircuitDescription {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Scalar>,
    #[serde(default)]
    pub ground: Option<Scalar>,
    #[serde(default)]
    pub elements: Vec<ElementDescription>,
    #[serde(default)]
    pub models: Vec<ModelDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementDescription {
    pub kind: ElementKind,
    pub name: Scalar,
    pub nodes: Vec<Scalar>,
    /// Target definition of a subcircuit instance
    #[serde(default)]
    pub subcircuit: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Scalar>,
    #[serde(default)]
    pub named: IndexMap<String, Scalar>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: String,
    #[serde(default)]
    pub parameters: IndexMap<String, Scalar>,
}

fn default_temperature() -> f64 {
    SimulationConfig::default().temperature
}

fn default_nominal_temperature() -> f64 {
    SimulationConfig::default().nominal_temperature
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationDescription {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_nominal_temperature")]
    pub nominal_temperature: f64,
    #[serde(default)]
    pub pipe: bool,
    #[serde(default)]
    pub options: IndexMap<String, Option<Scalar>>,
    #[serde(default)]
    pub save: Vec<Scalar>,
    #[serde(default)]
    pub analyses: IndexMap<String, Vec<Scalar>>,
}

impl ElementDescription {
    pub fn to_element(&self) -> Result<Element> {
        let qualified = format!("{}{}", self.kind.prefix(), self.name);

        let mut parameters = Parameters::new();
        match (self.kind, &self.subcircuit) {
            (ElementKind::SubCircuit, Some(target)) => parameters = parameters.value(target),
            (ElementKind::SubCircuit, None) => {
                bail!("Subcircuit instance {} does not name its subcircuit", qualified)
            }
            (_, Some(_)) => bail!("Element {} is not a subcircuit instance", qualified),
            (kind, None) if kind.is_two_terminal() && self.nodes.len() != 2 => bail!(
                "Element {} expects 2 nodes, but has {}",
                qualified,
                self.nodes.len()
            ),
            _ => {}
        }

        for value in &self.parameters {
            parameters = parameters.value(value);
        }
        for (key, value) in &self.named {
            parameters = parameters.param(key, value);
        }

        Ok(Element::new(self.kind, &self.name, &self.nodes, parameters))
    }
}

impl ModelDescription {
    pub fn to_model(&self) -> DeviceModel {
        DeviceModel::new(&self.name, &self.model_type, &self.parameters)
    }
}

fn populate(netlist: &mut Netlist, elements: &[ElementDescription], models: &[ModelDescription]) -> Result<()> {
    for description in elements {
        netlist.add_element(description.to_element()?);
    }
    for description in models {
        netlist.add_model(description.to_model());
    }
    Ok(())
}

impl SubCircuitDescription {
    pub fn build(&self) -> Result<SubCircuit> {
        let mut subcircuit = SubCircuit::new(&self.name, &self.nodes);
        if let Some(ground) = &self.ground {
            subcircuit = subcircuit.with_ground(ground);
        }
        populate(&mut subcircuit, &self.elements, &self.models)
            .with_context(|| format!("in subcircuit {}", self.name))?;
        Ok(subcircuit)
    }
}

impl Default for SimulationDescription {
    fn default() -> Self {
        SimulationDescription {
            temperature: default_temperature(),
            nominal_temperature: default_nominal_temperature(),
            pipe: false,
            options: IndexMap::new(),
            save: Vec::new(),
            analyses: IndexMap::new(),
        }
    }
}

impl SimulationDescription {
    pub fn config(&self) -> SimulationConfig {
        SimulationConfig {
            temperature: self.temperature,
            nominal_temperature: self.nominal_temperature,
            pipe: self.pipe,
        }
    }

    /// Apply the directives to a new simulation of `circuit`
    pub fn configure<'a>(&self, circuit: &'a Circuit) -> CircuitSimulation<'a> {
        let mut simulation = circuit.simulation(self.config());
        for (name, value) in &self.options {
            match value {
                Some(value) => simulation.option(name, value),
                None => simulation.flag(name),
            }
        }
        if !self.save.is_empty() {
            simulation.save(&self.save);
        }
        for (analysis, arguments) in &self.analyses {
            simulation.analysis(analysis, arguments);
        }
        simulation
    }
}

impl CircuitDescription {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| anyhow!("Invalid circuit description: {}", e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read file '{}': {}", path.display(), e))?;
        Self::from_json(&content).with_context(|| format!("in '{}'", path.display()))
    }

    pub fn build(&self) -> Result<Circuit> {
        let mut circuit = Circuit::new(&self.title);
        if let Some(ground) = &self.ground {
            circuit = circuit.with_ground(ground);
        }
        circuit = circuit.with_global_nodes(&self.global_nodes);
        for include in &self.includes {
            circuit.include(include);
        }
        for (name, expression) in &self.parameters {
            circuit.parameter(name, expression);
        }
        for description in &self.subcircuits {
            circuit.subcircuit(description.build()?);
        }
        populate(&mut circuit, &self.elements, &self.models)?;

        info!(
            "Built circuit '{}': {} elements, {} models, {} subcircuits",
            circuit.title(),
            circuit.element_count(),
            circuit.model_count(),
            circuit.subcircuits().count()
        );
        Ok(circuit)
    }

    /// Netlist text of `circuit`, with simulation directives if the deck has any
    pub fn render(&self, circuit: &Circuit) -> String {
        match &self.simulation {
            Some(simulation) => simulation.configure(circuit).to_string(),
            None => circuit.to_string(),
        }
    }
}
