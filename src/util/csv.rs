// src/util/csv.rs
//! Minimal CSV support for export files: quoted fields, `""` escapes and quoted
//! fields spanning several physical lines.

/// Split one logical CSV record into trimmed fields.
///
/// A `"` opens a quoted field only at the start of a field; inside it delimiters are
/// kept and `""` is a literal quote. A quote in the middle of an unquoted field is
/// plain text.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' if in_quotes => in_quotes = false,
            '"' if at_field_start => in_quotes = true,
            ',' if !in_quotes => {
                values.push(current.trim().to_string());
                current.clear();
                at_field_start = true;
                continue;
            }
            c if at_field_start && !in_quotes && c.is_whitespace() => continue,
            _ => current.push(c),
        }
        at_field_start = false;
    }

    values.push(current.trim().to_string());
    values
}

/// A logical record together with the 1-based line it starts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    pub line: usize,
    pub values: Vec<String>,
}

impl CsvRecord {
    /// Field at `index`, `None` when the column is unresolved or the row is short
    pub fn get(&self, index: Option<usize>) -> Option<&str> {
        index.and_then(|i| self.values.get(i)).map(String::as_str)
    }
}

/// Group physical lines into logical records.
///
/// A record continues onto the next line only while a quoted field is open. When that
/// quote never closes, each of the lines involved becomes a record of its own, so one
/// broken row cannot swallow the rows after it. Blank records are dropped.
pub fn csv_records(text: &str) -> Vec<CsvRecord> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();
    let mut records = Vec::new();
    let mut start = 0;

    while start < lines.len() {
        let mut end = start;
        let mut open = quote_open_after(lines[start], false);
        while open && end + 1 < lines.len() {
            end += 1;
            open = quote_open_after(lines[end], true);
        }

        if open && end > start {
            for (offset, line) in lines[start..=end].iter().enumerate() {
                push_record(&mut records, start + offset + 1, line);
            }
        } else {
            push_record(&mut records, start + 1, &lines[start..=end].join("\n"));
        }
        start = end + 1;
    }

    records
}

fn push_record(records: &mut Vec<CsvRecord>, line: usize, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        records.push(CsvRecord {
            line,
            values: split_csv_line(text),
        });
    }
}

/// Whether a quoted field is still open after `line`, given the state it starts in
fn quote_open_after(line: &str, mut in_quotes: bool) -> bool {
    let mut at_field_start = !in_quotes;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
            }
            '"' if in_quotes => in_quotes = false,
            '"' if at_field_start => in_quotes = true,
            ',' if !in_quotes => {
                at_field_start = true;
                continue;
            }
            c if at_field_start && !in_quotes && c.is_whitespace() => continue,
            _ => {}
        }
        at_field_start = false;
    }

    in_quotes
}

/// Header row with case-insensitive lookup by column name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvHeader {
    columns: Vec<String>,
}

impl CsvHeader {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_start_matches('\u{feff}');
        Self {
            columns: split_csv_line(line)
                .into_iter()
                .map(|c| c.to_lowercase())
                .collect(),
        }
    }

    pub fn from_record(record: &CsvRecord) -> Self {
        Self {
            columns: record
                .values
                .iter()
                .map(|c| c.trim_start_matches('\u{feff}').to_lowercase())
                .collect(),
        }
    }

    /// Index of the first column whose name matches any of `names`
    pub fn position(&self, names: &[&str]) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| names.iter().any(|n| c == n))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(&[name]).is_some()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}
