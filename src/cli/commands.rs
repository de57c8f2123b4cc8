// src/cli/commands.rs
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crossterm::style::Stylize;
use tokio::runtime::Runtime;
use tracing::{debug, info, instrument};

use crate::cli::display::{render_formats, render_summary};
use crate::cli::error::{CliError, CliResult};
use crate::config::Settings;
use crate::domain::parse_result::ParseResult;
use crate::infrastructure::parsers::{
    detect_format, parse_notion_async, parse_with, resolve_format, ImportFormat,
};
use crate::util::batch::batch_array;

/// How `parse` prints its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Summary,
    Json,
    Batch,
}

/// Read an input file, refusing anything above the configured size limit
#[instrument(level = "debug", skip(settings))]
pub fn read_input(path: &Path, settings: &Settings) -> CliResult<Vec<u8>> {
    read_limited(path, settings).map_err(|e| e.context(path.display().to_string()))
}

fn read_limited(path: &Path, settings: &Settings) -> CliResult<Vec<u8>> {
    let metadata = fs::metadata(path).map_err(|e| CliError::NoInput(e.to_string()))?;
    if !metadata.is_file() {
        return Err(CliError::NoInput("not a file".to_string()));
    }

    let limit = settings.max_file_size_bytes();
    if metadata.len() > limit {
        return Err(CliError::InvalidInput(format!(
            "{} bytes, limit is {} MB",
            metadata.len(),
            settings.max_file_size_mb
        )));
    }

    fs::read(path).map_err(|e| CliError::NoInput(e.to_string()))
}

pub fn detect(file: &Path, settings: &Settings) -> CliResult<()> {
    let content = read_input(file, settings)?;
    match detect_format(&content) {
        Some(format) => {
            println!("{}", format);
            Ok(())
        }
        None => {
            println!("unknown");
            Err(CliError::ParseFailed(format!(
                "{}: no supported export format detected",
                file.display()
            )))
        }
    }
}

pub fn parse(
    file: &Path,
    explicit: Option<ImportFormat>,
    mode: OutputMode,
    settings: &Settings,
    color: bool,
) -> CliResult<()> {
    let content = read_input(file, settings)?;
    let format = resolve_format(explicit, Some(file), &content).ok_or_else(|| {
        CliError::InvalidInput(format!(
            "{}: cannot detect export format, pass --format",
            file.display()
        ))
    })?;
    debug!("Parsing {} as {}", file.display(), format);

    let result = run_parser(format, content)?;
    info!(
        "{}: {} items, {} errors, {} warnings",
        file.display(),
        result.items.len(),
        result.errors.len(),
        result.warnings.len()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Summary => {
            write!(out, "{}", render_summary(&file.display().to_string(), format, &result, color))?;
        }
        OutputMode::Json => {
            writeln!(out, "{}", to_json(&result, settings.pretty)?)?;
            report_collisions(&result, color);
        }
        OutputMode::Batch => {
            for batch in batch_array(&result.items, settings.batch_size) {
                writeln!(out, "{}", serde_json::to_string(&batch)?)?;
            }
            report_collisions(&result, color);
        }
    }

    if result.success {
        Ok(())
    } else {
        let reason = result
            .errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "unknown error".to_string());
        Err(CliError::ParseFailed(format!("{}: {}", file.display(), reason)))
    }
}

/// Notion archives are decompressed on the blocking pool; everything else parses inline
fn run_parser(format: ImportFormat, content: Vec<u8>) -> CliResult<ParseResult> {
    match format {
        ImportFormat::Notion => {
            let runtime = Runtime::new()
                .map_err(|e| CliError::CommandFailed(format!("Failed to create async runtime: {}", e)))?;
            Ok(runtime.block_on(parse_notion_async(content)))
        }
        other => Ok(parse_with(other, &content)),
    }
}

fn to_json(result: &ParseResult, pretty: bool) -> CliResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    Ok(json)
}

/// Machine readable modes keep stdout clean, so collisions go to stderr
fn report_collisions(result: &ParseResult, color: bool) {
    let collisions = result.dedup_collisions();
    if collisions.is_empty() {
        return;
    }
    let message = format!(
        "{} dedup keys are shared by more than one item (all items kept)",
        collisions.len()
    );
    if color {
        eprintln!("{}", message.yellow());
    } else {
        eprintln!("{}", message);
    }
}

pub fn formats() -> CliResult<()> {
    println!("{}", render_formats());
    Ok(())
}
