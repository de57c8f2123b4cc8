// src/lib.rs
#![crate_type = "lib"]
#![crate_name = "kbimport"]

// Core modules
pub mod domain;
pub mod infrastructure;
pub mod util;

// CLI modules
pub mod cli;
pub mod config;
pub mod exitcode;

pub use domain::error::{DomainResult, ImportError};
pub use domain::item::{ImportItem, ImportSource, ItemMetadata, ItemType};
pub use domain::parse_result::{ParseError, ParseResult, ParseStats};
pub use domain::tag::Tag;
pub use infrastructure::parsers::{
    detect_format, parse_notion_async, parse_with, resolve_format, ImportFormat, ImportParser,
};
