//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_feed::CsvFeed;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::replay;
use crate::domain::config_validation::validate_engine_config;
use crate::domain::error::RudderError;
use crate::domain::settings::{build_settings, EngineSettings};
use crate::domain::sizer::RiskBudget;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "rudder", about = "Rule-based signal and risk engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a CSV feed through the engine
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        /// Starting cash, overriding the config
        #[arg(long)]
        cash: Option<f64>,
    },
    /// Validate an engine configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show feed coverage for each symbol
    Info {
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Replay { config, data, cash } => run_replay(&config, &data, cash),
        Command::Validate { config } => run_validate(&config),
        Command::Info { data } => run_info(&data),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = RudderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_settings(config_path: &PathBuf) -> Result<(EngineSettings, FileConfigAdapter), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;

    if let Err(e) = validate_engine_config(&adapter) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }

    match build_settings(&adapter) {
        Ok(settings) => Ok((settings, adapter)),
        Err(e) => {
            eprintln!("error: {e}");
            Err((&e).into())
        }
    }
}

fn run_replay(config_path: &PathBuf, data_path: &PathBuf, cash: Option<f64>) -> ExitCode {
    let (settings, adapter) = match load_settings(config_path) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    let initial_cash = cash.unwrap_or_else(|| adapter.get_double("engine", "cash", 100_000.0));
    if initial_cash <= 0.0 {
        eprintln!("error: starting cash must be positive");
        return ExitCode::from(2);
    }

    let feed = match CsvFeed::load(data_path) {
        Ok(feed) => feed,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Replaying {} symbols with rule '{}'",
        feed.symbols().len(),
        settings.rule.name(),
    );

    let summary = replay::run_replay(&feed, settings, initial_cash);

    eprintln!("\n=== Replay Summary ===");
    eprintln!("Events:          {}", summary.events);
    eprintln!("Sessions:        {}", summary.sessions);
    eprintln!("Fills:           {}", summary.fills);
    eprintln!("Liquidations:    {}", summary.liquidations.len());
    eprintln!("Open positions:  {}", summary.open_positions);
    eprintln!("Final cash:      {:.2}", summary.final_cash);
    eprintln!("Final equity:    {:.2}", summary.final_equity);

    if !summary.liquidations.is_empty() {
        eprintln!("\n=== Exits ===");
        for (symbol, reason) in &summary.liquidations {
            eprintln!("  {}: {}", symbol, reason);
        }
    }

    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let (settings, _) = match load_settings(config_path) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    eprintln!("\nEngine:");
    eprintln!("  max_positions: {}", settings.max_positions);
    match settings.risk {
        RiskBudget::Dollars(amount) => eprintln!("  risk_per_trade: ${:.0}", amount),
        RiskBudget::EquityFraction(fraction) => {
            eprintln!("  risk_fraction: {:.2}% of equity", fraction * 100.0)
        }
    }
    eprintln!("  max_notional: ${:.0}", settings.max_notional);

    eprintln!("\nUniverse:");
    eprintln!("  top_k: {}", settings.universe.top_k);
    eprintln!("  min_price: {}", settings.universe.min_price);
    eprintln!(
        "  require_fundamental_data: {}",
        settings.universe.require_fundamental_data
    );

    eprintln!("\nRule: {}", settings.rule.name());
    let gauges = settings.rule.gauge_kinds();
    if gauges.is_empty() {
        eprintln!("  no gauges required");
    } else {
        let mut names: Vec<String> = gauges.iter().map(|g| g.to_string()).collect();
        names.sort();
        for name in names {
            eprintln!("  {}", name);
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(data_path: &PathBuf) -> ExitCode {
    let feed = match CsvFeed::load(data_path) {
        Ok(feed) => feed,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for symbol in feed.symbols() {
        match feed.coverage(&symbol) {
            Some((first, last, count)) => {
                println!("{}: {} bars, {} to {}", symbol, count, first, last);
            }
            None => eprintln!("{}: no data", symbol),
        }
    }
    ExitCode::SUCCESS
}
