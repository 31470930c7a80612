//! replset-warden binary

use clap::Parser;
use std::process::ExitCode;
use warden_cli::{Cli, WardenConfig, DISASTER_EXIT};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too
            let code = if e.use_stderr() { DISASTER_EXIT } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let config = match WardenConfig::resolve(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("replset-warden: {}", e);
            return ExitCode::from(DISASTER_EXIT);
        }
    };

    if let Err(e) = warden_logging::init(&config.log) {
        eprintln!("replset-warden: {}", e);
        return ExitCode::from(DISASTER_EXIT);
    }

    let report = warden_cli::run(&config);
    ExitCode::from(report.exit_code())
}
