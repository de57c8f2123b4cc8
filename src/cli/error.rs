// src/cli/error.rs
use std::io;

use thiserror::Error;

use crate::domain::error::ImportError;
use crate::exitcode;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot read input: {0}")]
    NoInput(String),

    #[error("Parse failed: {0}")]
    ParseFailed(String),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        match self {
            CliError::CommandFailed(msg) => {
                CliError::CommandFailed(format!("{}: {}", context.into(), msg))
            }
            CliError::InvalidInput(msg) => {
                CliError::InvalidInput(format!("{}: {}", context.into(), msg))
            }
            CliError::NoInput(msg) => CliError::NoInput(format!("{}: {}", context.into(), msg)),
            CliError::ParseFailed(msg) => {
                CliError::ParseFailed(format!("{}: {}", context.into(), msg))
            }
            CliError::Import(err) => CliError::Import(err.context(context)),
            err => CliError::CommandFailed(format!("{}: {}", context.into(), err)),
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NoInput(_) => exitcode::NOINPUT,
            CliError::ParseFailed(_) => exitcode::DATAERR,
            _ => exitcode::USAGE,
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
