//! Comma-delimited flow exports.
//!
//! Without a header the columns are assumed to follow
//! [`COLUMN_HYPOTHESIS`]. A row made only of known column names is taken as a
//! header and replaces the hypothesis for the rest of the input.
//!
//! Plain comma-splitting also "matches" JSON, `key=value` and CEF lines,
//! which is why this detector runs last.

use super::{flow_fields, has_verdict, is_flow_alias, Detection, EncodingDetector, FlowEncoding};
use crate::parsers::ParsedLine;
use std::collections::HashMap;
use std::net::IpAddr;

/// Assumed column order for header-less exports.
pub const COLUMN_HYPOTHESIS: &[&str] = &["ts", "src", "dst", "spt", "dpt", "proto", "action", "bytes"];

const MIN_CELLS: usize = 3;

#[derive(Debug, Clone)]
pub struct CsvDetector {
    columns: Vec<String>,
    from_header: bool,
}

impl CsvDetector {
    pub fn new() -> Self {
        Self {
            columns: COLUMN_HYPOTHESIS.iter().map(|c| c.to_string()).collect(),
            from_header: false,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Default for CsvDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodingDetector for CsvDetector {
    fn encoding(&self) -> FlowEncoding {
        FlowEncoding::Csv
    }

    fn detect(&mut self, line: &str) -> Detection {
        if !line.contains(',') {
            return Detection::Miss;
        }
        let Some(cells) = split_cells(line) else {
            return Detection::Miss;
        };
        if cells.len() < MIN_CELLS {
            return Detection::Miss;
        }

        if let Some(header) = as_header(&cells) {
            tracing::debug!(columns = ?header, "csv header adopted");
            self.columns = header;
            self.from_header = true;
            return Detection::Claimed(ParsedLine::default());
        }

        let row: HashMap<&str, &str> = self
            .columns
            .iter()
            .map(String::as_str)
            .zip(cells.iter().map(String::as_str))
            .collect();

        // The bare hypothesis is a guess; only trust it for rows whose
        // address columns hold addresses.
        if !self.from_header && !(is_ip(row.get("src")) && is_ip(row.get("dst"))) {
            return Detection::Miss;
        }

        let parsed = flow_fields(|k| row.get(k).map(|v| v.to_string()));
        if has_verdict(&parsed) {
            Detection::Match(parsed)
        } else {
            Detection::Miss
        }
    }
}

fn is_ip(v: Option<&&str>) -> bool {
    v.is_some_and(|s| s.trim().parse::<IpAddr>().is_ok())
}

/// Normalised column names when every cell is a known column name.
fn as_header(cells: &[String]) -> Option<Vec<String>> {
    let names: Vec<String> = cells
        .iter()
        .map(|c| c.trim().to_ascii_lowercase().replace(&[' ', '-'][..], "_"))
        .collect();
    names
        .iter()
        .all(|n| is_flow_alias(n))
        .then_some(names)
}

/// Split on commas outside double quotes. `""` inside quotes is a literal
/// quote. `None` on an unterminated quote.
pub fn split_cells(line: &str) -> Option<Vec<String>> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', _) => in_quotes = !in_quotes,
            (',', false) => cells.push(std::mem::take(&mut current).trim().to_string()),
            (c, _) => current.push(c),
        }
    }
    if in_quotes {
        return None;
    }
    cells.push(current.trim().to_string());
    Some(cells)
}
