use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use csv::Writer;
use log::info;
use serde::Serialize;

use crate::circuit::Circuit;
use crate::netlist::Netlist;

/// File format of an exported report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

/// Node topology of a circuit and each of its subcircuits
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyReport {
    pub title: String,
    pub scopes: Vec<ScopeReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Circuit,
    Subcircuit,
}

impl ScopeKind {
    fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Circuit => "circuit",
            ScopeKind::Subcircuit => "subcircuit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeReport {
    pub kind: ScopeKind,
    pub name: String,
    pub nodes: Vec<NodeReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeReport {
    pub name: String,
    pub elements: Vec<String>,
}

fn scope(kind: ScopeKind, name: &str, netlist: &Netlist) -> ScopeReport {
    ScopeReport {
        kind,
        name: name.to_string(),
        nodes: netlist
            .nodes()
            .values()
            .map(|node| NodeReport {
                name: node.name().to_string(),
                elements: node.elements().map(str::to_string).collect(),
            })
            .collect(),
    }
}

impl TopologyReport {
    pub fn from_circuit(circuit: &Circuit) -> Self {
        let mut scopes = vec![scope(ScopeKind::Circuit, circuit.title(), circuit)];
        scopes.extend(
            circuit
                .subcircuits()
                .map(|sub| scope(ScopeKind::Subcircuit, sub.name(), sub)),
        );

        TopologyReport {
            title: circuit.title().to_string(),
            scopes,
        }
    }

    /// Export the report to a file
    pub fn export(&self, filename: &Path, format: OutputFormat) -> Result<()> {
        let file = File::create(filename)?;
        match format {
            OutputFormat::Csv => self.write_csv(file)?,
            OutputFormat::Json => self.write_json(file)?,
        }
        info!("Topology report exported to {}", filename.display());
        Ok(())
    }

    /// One row per node: scope kind, scope name, node, space-joined elements
    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = Writer::from_writer(out);
        writer.write_record(["kind", "scope", "node", "elements"])?;
        for scope in &self.scopes {
            for node in &scope.nodes {
                writer.write_record([
                    scope.kind.as_str(),
                    scope.name.as_str(),
                    node.name.as_str(),
                    node.elements.join(" ").as_str(),
                ])?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_json<W: Write>(&self, out: W) -> Result<()> {
        serde_json::to_writer_pretty(out, self)?;
        Ok(())
    }
}
