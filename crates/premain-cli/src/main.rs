//! `premain`: offline checker for global constructors.
//!
//! Walks Rust source trees with the same rules `#[global_ctor]` applies at
//! compile time, plus everything an attribute macro cannot see: restrictions
//! inherited from enclosing scopes and conditional compilation for a chosen
//! target.

mod error;
mod log;
mod report;

use crate::{error::Error, log::Level};
use clap::{Args, Parser, Subcommand, ValueEnum};
use premain_core::{
    ScanReport, Scanner,
    cfg::CfgSet,
    config::{Config, ConfigModel},
};
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

#[derive(Parser)]
#[command(name = "premain")]
#[command(about = "Check and list global constructors in Rust source trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report every marked function that breaks a rule; exit 1 if any does
    Check(ScanArgs),
    /// Print the set of functions that would be registered
    List(ScanArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Files or directories to scan
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Configuration file (defaults to premain.toml next to the first path)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra cfg setting: FLAG or KEY=VALUE (repeatable)
    #[arg(long = "cfg", value_name = "CFG")]
    cfgs: Vec<String>,

    /// Skip the host's target_os / target_family / target_arch settings
    #[arg(long)]
    no_host_cfg: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            log!(Level::Error, "{}", err);
            ExitCode::from(2)
        }
    }
}

fn run(command: Command) -> Result<ExitCode, Error> {
    match command {
        Command::Check(args) => {
            let report = scan(&args)?;

            match args.format {
                Format::Text => print!("{}", report::check_text(&report)),
                Format::Json => println!("{}", report::check_json(&report)?),
            }

            if report.is_clean() {
                log!(Level::Ok, "{} global constructor(s), no violations", report.registry.len());
                Ok(ExitCode::SUCCESS)
            } else {
                log!(Level::Error, "{} violation(s)", report.diagnostics.len());
                Ok(ExitCode::from(1))
            }
        }

        Command::List(args) => {
            let report = scan(&args)?;

            match args.format {
                Format::Text => print!("{}", report::list_text(&report.registry)),
                Format::Json => println!("{}", report::list_json(&report.registry)?),
            }

            if !report.is_clean() {
                log!(
                    Level::Warn,
                    "{} marked function(s) left out because they break a rule; run `premain check`",
                    report.diagnostics.len()
                );
            }

            Ok(ExitCode::SUCCESS)
        }
    }
}

fn scan(args: &ScanArgs) -> Result<ScanReport, Error> {
    log::set_verbose(args.verbose);

    let config = load_config(args)?;
    let scanner = Scanner::new(&config);

    let mut report = ScanReport::default();
    for path in &args.paths {
        if !path.exists() {
            return Err(Error::MissingPath(path.display().to_string()));
        }

        let part = scanner.scan_path(path)?;
        log!(
            "scan",
            Level::Debug,
            "{}: {} file(s), {} registered, {} excluded by cfg",
            path.display(),
            part.files,
            part.registry.len(),
            part.excluded
        );
        report.merge(part);
    }

    Ok(report)
}

// file settings, then host cfg, then --cfg on top
fn load_config(args: &ScanArgs) -> Result<ConfigModel, Error> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::discover(&config_dir(&args.paths))?,
    };

    let mut cfg = if args.no_host_cfg {
        CfgSet::default()
    } else {
        CfgSet::host()
    };
    cfg.merge(&config.cfg);
    for arg in &args.cfgs {
        cfg.apply_arg(arg)?;
    }
    config.cfg = cfg;

    log!("config", Level::Debug, "markers: {}", config.markers.join(", "));

    Ok(config)
}

fn config_dir(paths: &[PathBuf]) -> PathBuf {
    let Some(first) = paths.first() else {
        return PathBuf::from(".");
    };

    if first.is_dir() {
        first.clone()
    } else {
        first
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeated_cfg() {
        let cli = Cli::parse_from([
            "premain", "check", "src", "--cfg", "unix", "--cfg", "feature=\"std\"", "--format",
            "json",
        ]);

        let Command::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.cfgs, ["unix", "feature=\"std\""]);
        assert!(matches!(args.format, Format::Json));
    }

    #[test]
    fn config_dir_of_file_is_its_parent() {
        assert_eq!(config_dir(&[PathBuf::from("crate/src/lib.rs")]), PathBuf::from("crate/src"));
        assert_eq!(config_dir(&[PathBuf::from("lib.rs")]), PathBuf::from("."));
    }
}
