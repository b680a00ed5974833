use crate::core::error::AnalyzeError;
use crate::core::types::DecklistEntry;
use regex::Regex;
use tracing::{debug, warn};

/// Splits decklist text into one entry per non-blank line.
///
/// A line is either `<quantity> <name>` or just `<name>` (quantity 1). Only
/// ASCII digits form a quantity. Lines whose leading quantity is zero or does
/// not fit a `u32` are rejected with a warning. Duplicate names stay separate entries.
pub fn parse_decklist(text: &str) -> Result<Vec<DecklistEntry>, AnalyzeError> {
    let entries: Vec<DecklistEntry> = text
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_line)
        .collect();

    if entries.is_empty() {
        return Err(AnalyzeError::EmptyInput);
    }
    debug!(entries = entries.len(), "Parsed decklist");
    Ok(entries)
}

fn parse_line(line: &str) -> Option<DecklistEntry> {
    lazy_static::lazy_static! {
        static ref QUANTITY_RE: Regex = Regex::new(r"^([0-9]+)\s+(.*)$").unwrap();
    }

    let Some(caps) = QUANTITY_RE.captures(line) else {
        return Some(DecklistEntry {
            quantity: 1,
            raw_name: line.to_string(),
        });
    };

    let name = caps[2].trim();
    match caps[1].parse::<u32>() {
        Ok(quantity) if quantity > 0 => Some(DecklistEntry {
            quantity,
            raw_name: name.to_string(),
        }),
        _ => {
            warn!(line, "Skipping decklist line with invalid quantity");
            None
        }
    }
}
