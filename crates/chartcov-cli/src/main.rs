//! Chartcov CLI: branch coverage for template charts
//!
//! ## Usage
//!
//! ```bash
//! chartcov run charts/app -f ci/values-prod.yaml -f ci/  # One run per values file
//! chartcov run charts/app --format xml -o coverage.xml   # Cobertura report
//! chartcov scan charts/app --ranges                      # List branches
//! chartcov instrument charts/app -o /tmp/app-instrumented
//! ```

use chartcov_cli::{
    handlers::{execute_instrument, execute_run, execute_scan},
    init_logging, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity,
};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    init_logging(&config);

    match cli.command {
        Commands::Run(args) => execute_run(&config, &args),
        Commands::Scan(args) => execute_scan(&config, &args),
        Commands::Instrument(args) => execute_instrument(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.clone().into();

    CliConfig::new().with_verbosity(verbosity).with_color(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_defaults() {
        let cli = Cli::parse_from(["chartcov", "scan", "app"]);
        let config = build_config(&cli);
        assert_eq!(config.verbosity, Verbosity::Normal);
        assert_eq!(config.color, ColorChoice::Auto);
    }

    #[test]
    fn test_build_config_verbosity() {
        let cli = Cli::parse_from(["chartcov", "-v", "scan", "app"]);
        assert_eq!(build_config(&cli).verbosity, Verbosity::Verbose);

        let cli = Cli::parse_from(["chartcov", "-vvv", "scan", "app"]);
        assert_eq!(build_config(&cli).verbosity, Verbosity::Debug);
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        let cli = Cli::parse_from(["chartcov", "-q", "-vv", "--color", "always", "scan", "app"]);
        let config = build_config(&cli);
        assert_eq!(config.verbosity, Verbosity::Quiet);
        assert_eq!(config.color, ColorChoice::Always);
    }
}
