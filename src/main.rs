//! Cellbook - reactive notebook cell parser

mod cli;
mod config;
mod output;

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, warn};

use cellbook_core::{Notebook, STANDARD_BUILTINS};
use cellbook_engine::engine::Cell;
use cli::{Args, Command};
use config::{Config, load_config};
use output::{OrderEntry, render_diagnostics, render_order, render_parse};

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(args: Args) -> Result<ExitCode> {
    let config = if args.no_config {
        Config::default()
    } else {
        let (config, warnings) = load_config(args.config.as_deref());
        for warning in warnings {
            warn!("{}", warning);
        }
        config
    };
    let format = args.format.or(config.format).unwrap_or_default();
    debug!("output format: {:?}", format);

    match args.command {
        Command::Parse { source, file, kind } => {
            let source = match (source, file) {
                (Some(source), _) => source,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read stdin")?;
                    buf
                }
            };
            let cell = Cell::new(kind.into(), &source);
            println!("{}", render_parse(&cell.parsed, format)?);
            Ok(exit_code(!cell.parsed.is_exception()))
        }
        Command::Check { notebook } => {
            let notebook = open_notebook(&notebook, &config)?;
            let diagnostics = notebook.diagnostics();
            println!("{}", render_diagnostics(&diagnostics, format)?);
            Ok(exit_code(diagnostics.is_empty()))
        }
        Command::Order { notebook } => {
            let notebook = open_notebook(&notebook, &config)?;
            let entries: Vec<OrderEntry> = notebook
                .evaluation_order()?
                .into_iter()
                .map(|cell| OrderEntry {
                    cell,
                    name: notebook
                        .cells
                        .get(&cell)
                        .and_then(|c| c.name().map(str::to_string)),
                })
                .collect();
            println!("{}", render_order(&entries, format)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_notebook(path: &Path, config: &Config) -> Result<Notebook> {
    let builtins = STANDARD_BUILTINS
        .iter()
        .map(|name| name.to_string())
        .chain(config.builtins.iter().cloned());
    let mut notebook = Notebook::with_builtins(builtins);
    notebook
        .load_file(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(notebook)
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
