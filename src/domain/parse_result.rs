// src/domain/parse_result.rs
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::error::{DomainResult, ImportError};
use crate::domain::item::{ImportItem, ImportSource};

/// An item level failure; never aborts the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    pub message: String,
}

impl ParseError {
    pub fn new(item: Option<String>, message: impl Into<String>) -> Self {
        Self {
            item,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Records found in the input
    pub total: usize,
    /// Records turned into items
    pub parsed: usize,
    /// Records dropped, with or without an error
    pub skipped: usize,
}

/// Output contract shared by all parsers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    /// False only for structural failures
    pub success: bool,
    pub items: Vec<ImportItem>,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<String>,
    pub stats: ParseStats,
}

impl ParseResult {
    /// Structural failure: a single error, no items
    pub fn failure(err: ImportError) -> Self {
        warn!("Structural parse failure: {}", err);
        Self {
            success: false,
            items: Vec::new(),
            errors: vec![ParseError::new(None, err.to_string())],
            warnings: Vec::new(),
            stats: ParseStats::default(),
        }
    }

    /// Groups of item indices sharing a dedup key, only where more than one item collides
    pub fn dedup_collisions(&self) -> BTreeMap<String, Vec<usize>> {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, item) in self.items.iter().enumerate() {
            groups.entry(item.dedup_key()).or_default().push(idx);
        }
        groups.retain(|_, idxs| idxs.len() > 1);
        groups
    }
}

/// Accumulates the outcome of one parse call.
///
/// Every record passes through `record`, which enforces the item invariants and turns
/// record errors into `ParseError`s.
#[derive(Debug)]
pub struct ResultCollector {
    source: ImportSource,
    items: Vec<ImportItem>,
    errors: Vec<ParseError>,
    warnings: Vec<String>,
    total: usize,
    skipped: usize,
}

impl ResultCollector {
    pub fn new(source: ImportSource) -> Self {
        Self {
            source,
            items: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            total: 0,
            skipped: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Account for the outcome of one record.
    ///
    /// `Ok(None)` is a silent skip, `Err` is kept as a `ParseError` labelled with `label`.
    pub fn record<L>(&mut self, label: L, outcome: DomainResult<Option<ImportItem>>)
    where
        L: FnOnce() -> String,
    {
        self.total += 1;
        match outcome.and_then(|item| match item {
            Some(item) => item.validate().map(|_| Some(item)),
            None => Ok(None),
        }) {
            Ok(Some(item)) => self.items.push(item),
            Ok(None) => {
                debug!("{}: skipping record {}", self.source, self.total);
                self.skipped += 1;
            }
            Err(e) => {
                let label = label();
                debug!("{}: record '{}' failed: {}", self.source, label, e);
                self.errors.push(ParseError::new(Some(label), e.to_string()));
                self.skipped += 1;
            }
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn finish(self) -> ParseResult {
        let stats = ParseStats {
            total: self.total,
            parsed: self.items.len(),
            skipped: self.skipped,
        };
        info!(
            "{}: parsed {} of {} records ({} skipped, {} errors)",
            self.source,
            stats.parsed,
            stats.total,
            stats.skipped,
            self.errors.len()
        );
        ParseResult {
            success: true,
            items: self.items,
            errors: self.errors,
            warnings: self.warnings,
            stats,
        }
    }
}
