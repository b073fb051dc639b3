pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod history;
pub mod holdings;
pub mod quotes;
pub mod session;
pub mod valuation;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use cli::{Cli, Commands};
use commands::portfolio::{self, CycleReport};
use config::Config;
use holdings::Registry;
use session::Session;

const CHART_WIDTH: usize = 60;
const CHART_HEIGHT: usize = 12;

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    let mut config = Config::load(config_path.as_deref())?;
    cli.apply_to(&mut config);

    let log_env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    env_logger::Builder::from_env(log_env).init();

    match config_path {
        Some(ref path) => log::debug!("Loaded config from {}", path.display()),
        None => log::debug!("No config file, using defaults"),
    }

    let registry = Registry::kr1()?;
    let session = Session::new(registry, Arc::new(config.price_source()), config.failure_policy);

    let command = cli.command.unwrap_or(Commands::Interactive);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        match command {
            Commands::Cycle { cycles, json, pdf } => run_once(&session, cycles, json, pdf).await,
            Commands::Interactive => run_interactive(&session).await,
            Commands::Holdings { json } => print_holdings(&session, json),
        }
    })
}

fn print_report(report: &CycleReport) {
    if let Some(ref warning) = report.warning {
        eprintln!("Warning: {}", warning);
    }
    println!("{}", display::render_table(&report.rows, report.total, &report.currency));
    println!();
    println!(
        "{}",
        display::render_chart(&report.history, &report.currency, CHART_WIDTH, CHART_HEIGHT)
    );
}

async fn export_pdf(session: &Session, path: String) {
    match portfolio::export_history_pdf(session, path).await {
        Ok(result) => println!("Wrote {} samples to {}", result.samples, result.path),
        Err(e) => eprintln!("Error: {}", e),
    }
}

/// Run `cycles` cycles back to back on one session
async fn run_cycles(session: &Session, cycles: u32) -> Vec<CycleReport> {
    let mut reports = Vec::with_capacity(cycles as usize);
    for _ in 0..cycles {
        reports.push(portfolio::run_valuation_cycle(session).await);
    }
    reports
}

async fn run_once(session: &Session, cycles: u32, json: bool, pdf: Option<PathBuf>) -> Result<()> {
    let reports = run_cycles(session, cycles).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    if let Some(path) = pdf {
        export_pdf(session, path.display().to_string()).await;
    }
    Ok(())
}

async fn run_interactive(session: &Session) -> Result<()> {
    println!(
        "KR1 Portfolio Tracker ({}, failed fetches: {})",
        session.currency().to_uppercase(),
        session.policy().as_str()
    );
    println!(
        "[Enter] fetch current portfolio value  [h] history  [p <file>] export chart PDF  [q] quit"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => print_report(&portfolio::run_valuation_cycle(session).await),
            "q" | "quit" => break,
            "h" | "history" => {
                let history = portfolio::get_portfolio_history(session).await;
                println!(
                    "{}",
                    display::render_chart(&history, session.currency(), CHART_WIDTH, CHART_HEIGHT)
                );
                if let Some(last) = session.latest().await {
                    println!(
                        "Last recorded: {} at {}",
                        display::format_money(last.total_value, session.currency()),
                        last.timestamp.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
            _ => match input.strip_prefix("p ") {
                Some(path) if !path.trim().is_empty() => {
                    export_pdf(session, path.trim().to_string()).await
                }
                _ => println!("Unknown command: {}", input),
            },
        }
    }
    Ok(())
}

fn print_holdings(session: &Session, json: bool) -> Result<()> {
    let holdings = portfolio::get_holdings(session);

    if json {
        println!("{}", serde_json::to_string_pretty(&holdings)?);
        return Ok(());
    }

    let name_width = holdings.iter().map(|a| a.display_name.len()).max().unwrap_or(0);
    for asset in &holdings {
        println!(
            "{:<w$}  {:>16}  {}",
            asset.display_name,
            display::format_grouped(asset.held_quantity, 0),
            asset.feed_id,
            w = name_width
        );
    }
    Ok(())
}
