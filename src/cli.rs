//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;
use cellbook_engine::engine::CellKind;

#[derive(Debug, Parser)]
#[command(
    name = "cellbook",
    version,
    about = "Classify reactive notebook cells, extract their dependencies and order them."
)]
pub struct Args {
    /// Configuration file (default: <config dir>/cellbook/config.toml).
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Ignore the configuration file.
    #[arg(long, global = true, conflicts_with = "config")]
    pub no_config: bool,

    /// Output format (overrides the configuration file).
    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse one cell and print its classification. Exits 1 on a parse error.
    Parse {
        /// Cell source given inline.
        #[arg(short = 'c', long = "command", value_name = "SOURCE", conflicts_with = "file")]
        source: Option<String>,

        /// File holding the cell source (stdin when neither is given).
        file: Option<PathBuf>,

        /// Cell language.
        #[arg(long, value_enum, default_value_t = KindArg::Code)]
        kind: KindArg,
    },

    /// Report parse errors, duplicate definitions, unresolved references
    /// and cycles. Exits 1 when any are found.
    Check {
        /// Notebook file (.cellbook).
        notebook: PathBuf,
    },

    /// Print the cells of a notebook in evaluation order. Exits 1 on a cycle.
    Order {
        /// Notebook file (.cellbook).
        notebook: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Code,
    Md,
    Html,
}

impl From<KindArg> for CellKind {
    fn from(kind: KindArg) -> CellKind {
        match kind {
            KindArg::Code => CellKind::Code,
            KindArg::Md => CellKind::Markdown,
            KindArg::Html => CellKind::Html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_inline() {
        let args = Args::try_parse_from(["cellbook", "-vv", "parse", "-c", "x = 1", "--kind", "md"]).unwrap();
        assert_eq!(args.verbose, 2);
        match args.command {
            Command::Parse { source, file, kind } => {
                assert_eq!(source.as_deref(), Some("x = 1"));
                assert!(file.is_none());
                assert_eq!(kind, KindArg::Md);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["cellbook", "order", "nb.cellbook", "--format", "json"]).unwrap();
        assert_eq!(args.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_conflicts() {
        assert!(Args::try_parse_from(["cellbook", "parse", "-c", "1", "cell.js"]).is_err());
        assert!(Args::try_parse_from(["cellbook", "--config", "a.toml", "--no-config", "check", "nb"]).is_err());
        assert!(Args::try_parse_from(["cellbook", "check"]).is_err());
    }
}
