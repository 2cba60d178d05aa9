use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::info;

use crate::description::CircuitDescription;
pub use crate::report::OutputFormat;
use crate::report::TopologyReport;

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub input_file: String,
    pub output_file: Option<String>,
    pub report_file: Option<String>,
    pub report_format: OutputFormat,
    pub check: bool,
    pub verbose_level: u8,
}

pub fn build_command() -> Command {
    Command::new("netlist")
        .version(crate::VERSION)
        .about("Render a JSON circuit deck as a SPICE netlist")
        .arg(
            Arg::new("input")
                .help("Input circuit deck (.json)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the netlist to FILE instead of stdout"),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .value_name("FILE")
                .help("Export the node topology report to FILE"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .default_value("csv")
                .value_parser(["csv", "json"])
                .help("Topology report format"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .help("Fail if a subcircuit declares unconnected external nodes"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase verbosity level"),
        )
}

impl CliArgs {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let input_file = matches
            .get_one::<String>("input")
            .ok_or_else(|| anyhow!("Input file is required"))?
            .clone();

        let output_file = matches.get_one::<String>("output").cloned();
        let report_file = matches.get_one::<String>("report").cloned();

        let report_format = match matches.get_one::<String>("format").map(String::as_str) {
            Some("csv") | None => OutputFormat::Csv,
            Some("json") => OutputFormat::Json,
            Some(other) => return Err(anyhow!("Invalid output format: {}", other)),
        };

        Ok(CliArgs {
            input_file,
            output_file,
            report_file,
            report_format,
            check: matches.get_flag("check"),
            verbose_level: matches.get_count("verbose"),
        })
    }

    /// Default log filter for the requested verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose_level {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Build the deck, render it and write the requested outputs
pub fn run(args: &CliArgs) -> Result<()> {
    let description = CircuitDescription::load(&args.input_file)?;
    let circuit = description.build()?;

    if args.check {
        circuit
            .check_subcircuits()
            .context("Subcircuit connectivity check failed")?;
        info!("All subcircuit interfaces are connected");
    }

    let netlist = description.render(&circuit);
    match &args.output_file {
        Some(path) => {
            fs::write(path, &netlist)
                .map_err(|e| anyhow!("Failed to write '{}': {}", path, e))?;
            info!("Netlist written to {}", path);
        }
        None => io::stdout().lock().write_all(netlist.as_bytes())?,
    }

    if let Some(path) = &args.report_file {
        TopologyReport::from_circuit(&circuit).export(Path::new(path), args.report_format)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = r#"{
        "title": "divider",
        "subcircuits": [{ "name": "half", "nodes": ["top", "tap", "spare"],
            "elements": [{ "kind": "resistor", "name": 1, "nodes": ["top", "tap"], "parameters": ["10k"] }] }],
        "elements": [
            { "kind": "voltage_source", "name": 1, "nodes": ["in", 0], "parameters": [5] },
            { "kind": "subcircuit", "name": 1, "nodes": ["in", "out", "nc"], "subcircuit": "half" }
        ]
    }"#;

    fn args_for(argv: &[&str]) -> CliArgs {
        let matches = build_command().try_get_matches_from(argv.iter().copied()).unwrap();
        CliArgs::from_matches(&matches).unwrap()
    }

    fn write_deck(dir: &Path) -> String {
        let path = dir.join("deck.json");
        fs::write(&path, DECK).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_parse_arguments() {
        let args = args_for(&["netlist", "deck.json", "-o", "out.cir", "--report", "nodes.json", "-f", "json", "-vv"]);
        assert_eq!(args.input_file, "deck.json");
        assert_eq!(args.output_file.as_deref(), Some("out.cir"));
        assert_eq!(args.report_file.as_deref(), Some("nodes.json"));
        assert_eq!(args.report_format, OutputFormat::Json);
        assert!(!args.check);
        assert_eq!(args.log_level(), "debug");
    }

    #[test]
    fn test_defaults() {
        let args = args_for(&["netlist", "deck.json"]);
        assert_eq!(args.report_format, OutputFormat::Csv);
        assert_eq!(args.log_level(), "warn");
        assert!(build_command().try_get_matches_from(["netlist", "deck.json", "-f", "xml"]).is_err());
    }

    #[test]
    fn test_run_writes_netlist_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_deck(dir.path());
        let output = dir.path().join("out.cir");
        let report = dir.path().join("nodes.csv");

        let args = args_for(&[
            "netlist",
            input.as_str(),
            "-o",
            output.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
        ]);
        run(&args).unwrap();

        let netlist = fs::read_to_string(&output).unwrap();
        assert_eq!(
            netlist,
            ".title divider\n.subckt half top tap spare\nR1 top tap 10k\n.ends\n\
             V1 in 0 5\nX1 in out nc half\n.end\n"
        );
        let csv = fs::read_to_string(&report).unwrap();
        assert!(csv.starts_with("kind,scope,node,elements\ncircuit,divider,in,V1 X1\n"));
    }

    #[test]
    fn test_run_check_fails_on_unconnected_interface() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_deck(dir.path());
        let output = dir.path().join("out.cir");

        let args = args_for(&["netlist", input.as_str(), "--check", "-o", output.to_str().unwrap()]);
        let err = run(&args).unwrap_err();
        assert!(format!("{:#}", err).contains("subcircuit half nodes spare are not connected"));
        assert!(!output.exists());
    }
}
