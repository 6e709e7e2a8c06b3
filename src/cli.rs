//! Command-line interface for the Elm analyzer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "elm-analyzer")]
#[command(about = "Name resolution and go-to-definition for Elm projects", long_about = None)]
pub struct Cli {
    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the module name, exposing list and imports of a file
    Inspect {
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve the definition under an LSP position (0-based line and UTF-16 character)
    #[command(alias = "def")]
    Definition {
        /// Project root; every `.elm` file under it is loaded
        root: PathBuf,
        file: PathBuf,
        line: u32,
        character: u32,
    },
}
