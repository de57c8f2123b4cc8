// src/cli/mod.rs
use std::io;

use crate::cli::args::{Cli, Commands};
use crate::cli::commands::OutputMode;
use crate::cli::error::{CliError, CliResult};
use crate::config::Settings;

pub mod args;
pub mod commands;
pub mod completion;
pub mod display;
pub mod error;

pub fn execute_command(cli: Cli, settings: &Settings) -> CliResult<()> {
    if cli.generate_config {
        println!("{}", crate::config::generate_default_config());
        return Ok(());
    }
    let color = !cli.no_color;

    match cli.command {
        Some(Commands::Detect { file }) => commands::detect(&file, settings),
        Some(Commands::Parse {
            file,
            format,
            json,
            batch,
        }) => {
            let mode = match (json, batch) {
                (true, _) => OutputMode::Json,
                (false, true) => OutputMode::Batch,
                (false, false) => OutputMode::Summary,
            };
            commands::parse(&file, format, mode, settings, color)
        }
        Some(Commands::Formats) => commands::formats(),
        Some(Commands::Completion { shell }) => handle_completion(shell),
        None => Err(CliError::InvalidInput(
            "no command given, see --help".to_string(),
        )),
    }
}

fn handle_completion(shell: String) -> CliResult<()> {
    // Write a brief comment to stderr about what's being output
    match shell.to_lowercase().as_str() {
        "bash" => {
            eprintln!("# Outputting bash completion script for kbimport");
            eprintln!("# To use, run one of:");
            eprintln!("# - eval \"$(kbimport completion bash)\"              # one-time use");
            eprintln!("# - kbimport completion bash >> ~/.bashrc             # add to bashrc");
            eprintln!("#");
        }
        "zsh" => {
            eprintln!("# Outputting zsh completion script for kbimport");
            eprintln!("# To use, run one of:");
            eprintln!("# - eval \"$(kbimport completion zsh)\"               # one-time use");
            eprintln!("# - kbimport completion zsh > ~/.zfunc/_kbimport      # save to fpath directory");
            eprintln!("#");
        }
        "fish" => {
            eprintln!("# Outputting fish completion script for kbimport");
            eprintln!("# - kbimport completion fish > ~/.config/fish/completions/kbimport.fish");
            eprintln!("#");
        }
        _ => {}
    }

    completion::generate_completion(&shell, &mut io::stdout()).map_err(|e| {
        CliError::CommandFailed(format!("Failed to generate completion script: {}", e))
    })
}
