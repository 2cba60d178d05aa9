use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Kinds of circuit elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Resistor,
    Capacitor,
    Inductor,
    Diode,
    VoltageSource,
    #[serde(rename = "subcircuit")]
    SubCircuit,
}

impl ElementKind {
    /// Letter that starts the element's name on a netlist line
    pub fn prefix(&self) -> char {
        match self {
            ElementKind::Resistor => 'R',
            ElementKind::Capacitor => 'C',
            ElementKind::Inductor => 'L',
            ElementKind::Diode => 'D',
            ElementKind::VoltageSource => 'V',
            ElementKind::SubCircuit => 'X',
        }
    }

    /// Returns true if this kind always connects exactly two nodes
    pub fn is_two_terminal(&self) -> bool {
        !matches!(self, ElementKind::SubCircuit)
    }
}

/// Positional and `key=value` parameters of an element line.
///
/// Values are kept in their rendered string form. Named parameters
/// render in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    positional: Vec<String>,
    named: IndexMap<String, String>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional value
    pub fn value(mut self, value: impl ToString) -> Self {
        self.positional.push(value.to_string());
        self
    }

    /// Set a `key=value` parameter; a repeated key keeps its first position
    pub fn param(mut self, key: impl ToString, value: impl ToString) -> Self {
        self.named.insert(key.to_string(), value.to_string());
        self
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    pub fn named(&self) -> &IndexMap<String, String> {
        &self.named
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

impl From<()> for Parameters {
    fn from(_: ()) -> Self {
        Parameters::new()
    }
}

macro_rules! single_value_parameters {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Parameters {
                fn from(value: $ty) -> Self {
                    Parameters::new().value(value)
                }
            }
        )*
    };
}

single_value_parameters!(&str, String, f64, f32, i32, i64, u32, u64, usize);

/// A circuit element: a prefixed name, its nodes and its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    kind: ElementKind,
    name: String,
    nodes: Vec<String>,
    parameters: Parameters,
}

impl Element {
    pub fn new<I, N>(
        kind: ElementKind,
        name: impl ToString,
        nodes: I,
        parameters: impl Into<Parameters>,
    ) -> Self
    where
        I: IntoIterator<Item = N>,
        N: ToString,
    {
        Element {
            kind,
            name: format!("{}{}", kind.prefix(), name.to_string()),
            nodes: nodes.into_iter().map(|node| node.to_string()).collect(),
            parameters: parameters.into(),
        }
    }

    pub fn two_terminal(
        kind: ElementKind,
        name: impl ToString,
        node_plus: impl ToString,
        node_minus: impl ToString,
        parameters: impl Into<Parameters>,
    ) -> Self {
        Element::new(
            kind,
            name,
            [node_plus.to_string(), node_minus.to_string()],
            parameters,
        )
    }

    /// An `X` instance of `subcircuit_name`, which renders after the nodes
    /// and ahead of any other parameters
    pub fn subcircuit_instance<I, N>(
        name: impl ToString,
        subcircuit_name: impl ToString,
        nodes: I,
        parameters: impl Into<Parameters>,
    ) -> Self
    where
        I: IntoIterator<Item = N>,
        N: ToString,
    {
        let mut parameters = parameters.into();
        parameters.positional.insert(0, subcircuit_name.to_string());
        Element::new(ElementKind::SubCircuit, name, nodes, parameters)
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Qualified name, prefix included (e.g. `R1`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name as given at construction, without the prefix
    pub fn base_name(&self) -> &str {
        &self.name[self.kind.prefix().len_utf8()..]
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn node_plus(&self) -> Option<&str> {
        self.two_terminal_node(0)
    }

    pub fn node_minus(&self) -> Option<&str> {
        self.two_terminal_node(1)
    }

    fn two_terminal_node(&self, index: usize) -> Option<&str> {
        if self.kind.is_two_terminal() {
            self.nodes.get(index).map(String::as_str)
        } else {
            None
        }
    }

    /// Target subcircuit of an `X` instance
    pub fn subcircuit_name(&self) -> Option<&str> {
        match self.kind {
            ElementKind::SubCircuit => self.parameters.positional.first().map(String::as_str),
            _ => None,
        }
    }

    pub fn parameters(&self) -> &[String] {
        self.parameters.positional()
    }

    pub fn named_parameters(&self) -> &IndexMap<String, String> {
        self.parameters.named()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for node in &self.nodes {
            write!(f, " {}", node)?;
        }
        for value in &self.parameters.positional {
            write!(f, " {}", value)?;
        }
        for (key, value) in &self.parameters.named {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

/// A `.model` card: a named parameter set bound to a model type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceModel {
    name: String,
    model_type: String,
    parameters: IndexMap<String, String>,
}

impl DeviceModel {
    pub fn new<I, K, V>(name: impl ToString, model_type: impl ToString, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: ToString,
    {
        DeviceModel {
            name: name.to_string(),
            model_type: model_type.to_string(),
            parameters: parameters
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    pub fn parameters(&self) -> &IndexMap<String, String> {
        &self.parameters
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".model {} {} (", self.name, self.model_type)?;
        for (i, (key, value)) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ElementKind::Resistor, "R1")]
    #[case(ElementKind::Capacitor, "C1")]
    #[case(ElementKind::Inductor, "L1")]
    #[case(ElementKind::Diode, "D1")]
    #[case(ElementKind::VoltageSource, "V1")]
    fn test_qualified_name(#[case] kind: ElementKind, #[case] expected: &str) {
        let element = Element::two_terminal(kind, 1, "a", "b", ());
        assert_eq!(element.name(), expected);
        assert_eq!(element.base_name(), "1");
        assert_eq!(element.node_plus(), Some("a"));
        assert_eq!(element.node_minus(), Some("b"));
    }

    #[test]
    fn test_element_line() {
        let resistor = Element::two_terminal(
            ElementKind::Resistor,
            "load",
            "in",
            0,
            Parameters::new().value("1k").param("m", 2).param("temp", 50),
        );
        assert_eq!(resistor.to_string(), "Rload in 0 1k m=2 temp=50");
        assert_eq!(resistor.nodes(), ["in", "0"]);
    }

    #[test]
    fn test_element_without_parameters() {
        let diode = Element::two_terminal(ElementKind::Diode, 3, "a", "k", ());
        assert_eq!(diode.to_string(), "D3 a k");
    }

    #[test]
    fn test_named_parameters_keep_insertion_order() {
        let params = Parameters::new().param("z", 1).param("a", 2).param("m", 3);
        let keys: Vec<_> = params.named().keys().cloned().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_subcircuit_instance() {
        let instance = Element::subcircuit_instance("amp", "opamp", ["inp", "inn", "out"], ());
        assert_eq!(instance.kind(), ElementKind::SubCircuit);
        assert_eq!(instance.subcircuit_name(), Some("opamp"));
        assert_eq!(instance.node_plus(), None);
        assert_eq!(instance.to_string(), "Xamp inp inn out opamp");
    }

    #[test]
    fn test_subcircuit_instance_parameters_follow_target() {
        let instance = Element::subcircuit_instance(
            "amp",
            "opamp",
            ["inp", "inn", "out"],
            Parameters::new().value("fast").param("gain", 10),
        );
        assert_eq!(instance.subcircuit_name(), Some("opamp"));
        assert_eq!(instance.parameters(), ["opamp", "fast"]);
        assert_eq!(instance.to_string(), "Xamp inp inn out opamp fast gain=10");
    }

    #[test]
    fn test_device_model_line() {
        let model = DeviceModel::new("D1N4148", "D", [("is", "2.52n"), ("rs", "0.568")]);
        assert_eq!(model.model_type(), "D");
        assert_eq!(model.to_string(), ".model D1N4148 D (is=2.52n rs=0.568)");

        let bare = DeviceModel::new("DMOD", "D", Vec::<(String, String)>::new());
        assert_eq!(bare.to_string(), ".model DMOD D ()");
    }
}
