use std::fmt;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::circuit::Circuit;

/// Option key holding the simulation temperature
pub const TEMPERATURE_OPTION: &str = "TEMP";
/// Option key holding the nominal (model) temperature
pub const NOMINAL_TEMPERATURE_OPTION: &str = "TNOM";

/// Settings fixed when a simulation deck is created
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub temperature: f64,
    pub nominal_temperature: f64,
    /// Emit the options needed to stream results through a pipe
    pub pipe: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            temperature: 27.0,
            nominal_temperature: 27.0,
            pipe: false,
        }
    }
}

/// A circuit decorated with simulation control directives.
///
/// Renders the circuit text followed by `.options`, `.save` and one line
/// per analysis kind.
#[derive(Debug, Clone)]
pub struct CircuitSimulation<'a> {
    circuit: &'a Circuit,
    temperature: f64,
    nominal_temperature: f64,
    options: IndexMap<String, Option<String>>,
    saved_nodes: Vec<String>,
    analyses: IndexMap<String, Vec<String>>,
}

impl<'a> CircuitSimulation<'a> {
    pub fn new(circuit: &'a Circuit) -> Self {
        Self::with_config(circuit, SimulationConfig::default())
    }

    pub fn with_config(circuit: &'a Circuit, config: SimulationConfig) -> Self {
        let mut simulation = CircuitSimulation {
            circuit,
            temperature: config.temperature,
            nominal_temperature: config.nominal_temperature,
            options: IndexMap::new(),
            saved_nodes: Vec::new(),
            analyses: IndexMap::new(),
        };

        if config.pipe {
            simulation.flag("NOINIT");
            simulation.option("filetype", "binary");
        }
        simulation
    }

    pub fn circuit(&self) -> &'a Circuit {
        self.circuit
    }

    /// Set a value-less option, rendered as a bare flag
    pub fn flag(&mut self, name: impl ToString) {
        let name = name.to_string();
        if self.temperature_slot(&name).is_some() {
            warn!("Option {} requires a numeric value, ignoring flag", name);
            return;
        }
        self.options.insert(name, None);
    }

    /// Set `name = value`. The temperature keys only accept numbers.
    pub fn option(&mut self, name: impl ToString, value: impl ToString) {
        let name = name.to_string();
        let value = value.to_string();

        if let Some(slot) = self.temperature_slot(&name) {
            match value.trim().parse::<f64>() {
                Ok(number) => *slot = number,
                Err(_) => warn!("Option {} requires a numeric value, ignoring '{}'", name, value),
            }
            return;
        }
        self.options.insert(name, Some(value));
    }

    fn temperature_slot(&mut self, name: &str) -> Option<&mut f64> {
        if name.eq_ignore_ascii_case(TEMPERATURE_OPTION) {
            Some(&mut self.temperature)
        } else if name.eq_ignore_ascii_case(NOMINAL_TEMPERATURE_OPTION) {
            Some(&mut self.nominal_temperature)
        } else {
            None
        }
    }

    /// All options in rendering order, temperatures first
    pub fn options(&self) -> Vec<(String, Option<String>)> {
        let mut options = vec![
            (TEMPERATURE_OPTION.to_string(), Some(self.temperature.to_string())),
            (
                NOMINAL_TEMPERATURE_OPTION.to_string(),
                Some(self.nominal_temperature.to_string()),
            ),
        ];
        options.extend(
            self.options
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        options
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, value: f64) {
        self.temperature = value;
    }

    pub fn nominal_temperature(&self) -> f64 {
        self.nominal_temperature
    }

    pub fn set_nominal_temperature(&mut self, value: f64) {
        self.nominal_temperature = value;
    }

    /// Replace the list of saved nodes
    pub fn save<I, N>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = N>,
        N: ToString,
    {
        self.saved_nodes = nodes.into_iter().map(|node| node.to_string()).collect();
    }

    pub fn saved_nodes(&self) -> &[String] {
        &self.saved_nodes
    }

    /// Set the arguments of the `.{name}` directive. Each analysis kind
    /// appears once; setting it again replaces the arguments in place.
    pub fn analysis<I, A>(&mut self, name: impl ToString, arguments: I)
    where
        I: IntoIterator<Item = A>,
        A: ToString,
    {
        let name = name.to_string();
        let arguments: Vec<String> = arguments.into_iter().map(|arg| arg.to_string()).collect();
        debug!("Analysis .{} {:?}", name, arguments);
        self.analyses.insert(name, arguments);
    }

    /// Operating point
    pub fn op(&mut self) {
        self.analysis("op", Vec::<String>::new());
    }

    /// Transient analysis
    pub fn tran(&mut self, step: impl ToString, stop: impl ToString) {
        self.analysis("tran", [step.to_string(), stop.to_string()]);
    }

    /// DC sweep of `source`
    pub fn dc(
        &mut self,
        source: impl ToString,
        start: impl ToString,
        stop: impl ToString,
        step: impl ToString,
    ) {
        self.analysis(
            "dc",
            [
                source.to_string(),
                start.to_string(),
                stop.to_string(),
                step.to_string(),
            ],
        );
    }

    /// Small-signal AC sweep; `variation` is `dec`, `oct` or `lin`
    pub fn ac(
        &mut self,
        variation: impl ToString,
        points: usize,
        start_frequency: impl ToString,
        stop_frequency: impl ToString,
    ) {
        self.analysis(
            "ac",
            [
                variation.to_string(),
                points.to_string(),
                start_frequency.to_string(),
                stop_frequency.to_string(),
            ],
        );
    }

    pub fn analyses(&self) -> &IndexMap<String, Vec<String>> {
        &self.analyses
    }
}

impl fmt::Display for CircuitSimulation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.circuit)?;
        for (name, value) in self.options() {
            match value {
                Some(value) => writeln!(f, ".options {} = {}", name, value)?,
                None => writeln!(f, ".options {}", name)?,
            }
        }
        if !self.saved_nodes.is_empty() {
            writeln!(f, ".save {}", self.saved_nodes.join(" "))?;
        }
        for (analysis, arguments) in &self.analyses {
            if arguments.is_empty() {
                writeln!(f, ".{}", analysis)?;
            } else {
                writeln!(f, ".{} {}", analysis, arguments.join(" "))?;
            }
        }
        Ok(())
    }
}
