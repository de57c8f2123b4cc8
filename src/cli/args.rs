// src/cli/args.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::infrastructure::parsers::ImportFormat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// Convert knowledge-base exports into canonical import items
pub struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Turn debugging information on
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Disable colored output
    #[arg(long = "no-color", help = "disable colored output")]
    pub no_color: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long = "generate-config")]
    pub generate_config: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect the export format of a file
    Detect {
        /// Export file to inspect
        file: PathBuf,
    },

    /// Parse an export file into import items
    Parse {
        /// Export file to parse
        file: PathBuf,

        #[arg(
            short = 'f',
            long = "format",
            value_name = "FORMAT",
            help = "skip detection, e.g. bookmarks, pocket, pocket-csv, evernote, notion, twitter, raindrop"
        )]
        format: Option<ImportFormat>,

        #[arg(long = "json", help = "print the full parse result as JSON")]
        json: bool,

        #[arg(
            long = "batch",
            conflicts_with = "json",
            help = "print items as JSON batches, one batch per line"
        )]
        batch: bool,
    },

    /// List supported export formats
    Formats,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for (bash, zsh, fish)
        shell: String,
    },
}
