use colored::*;
use log::{error, info};

use spice_netlist::cli::{self, CliArgs};

fn main() {
    let matches = cli::build_command().get_matches();

    let args = match CliArgs::from_matches(&matches) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
            std::process::exit(2);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .init();

    if let Err(e) = run_application(&args) {
        error!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

fn run_application(args: &CliArgs) -> anyhow::Result<()> {
    info!("{}", "Starting netlist renderer".green().bold());
    info!("Input file: {}", args.input_file.bright_blue());

    cli::run(args)?;

    info!("{}", "Netlist rendered successfully!".green().bold());
    Ok(())
}
