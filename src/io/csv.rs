//! CSV codec for the point table.
//!
//! The wire shape is the upload/download format of the design workflow: a
//! header row with the case-sensitive column names `x`, `y`, `delay`
//! (additional columns are ignored) followed by one numeric row per hole.
//! Export writes the three columns only, no index column.

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::domain::{Pattern, Point};
use crate::error::{BlastError, BlastResult};

const REQUIRED_COLUMNS: [&str; 3] = ["x", "y", "delay"];

/// Parse a pattern from CSV text.
///
/// Rows with cells that fail numeric coercion are not silently dropped: the
/// whole import fails with [`BlastError::MissingColumns`] naming every
/// offending column, exactly as a missing header column does.
pub fn pattern_from_csv(text: &str) -> BlastResult<Pattern> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| BlastError::Codec(format!("csv header: {}", e)))?
        .clone();

    let mut indices = [0usize; 3];
    let mut missing: Vec<String> = Vec::new();
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        match headers.iter().position(|h| h == name) {
            Some(i) => *slot = i,
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(BlastError::MissingColumns { columns: missing });
    }

    let mut invalid: Vec<String> = Vec::new();
    let mut points = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| BlastError::Codec(format!("csv row: {}", e)))?;
        let mut values = [0.0f64; 3];
        let mut row_ok = true;
        for (value, (&idx, name)) in values
            .iter_mut()
            .zip(indices.iter().zip(REQUIRED_COLUMNS))
        {
            match record.get(idx).and_then(|s| s.parse::<f64>().ok()) {
                Some(v) => *value = v,
                None => {
                    row_ok = false;
                    if !invalid.iter().any(|c| c == name) {
                        invalid.push(name.to_string());
                    }
                }
            }
        }
        if row_ok {
            points.push(Point::new(values[0], values[1], values[2]));
        }
    }
    if !invalid.is_empty() {
        return Err(BlastError::MissingColumns { columns: invalid });
    }

    Ok(Pattern::from_points(points))
}

/// Serialize a pattern to CSV text (`x,y,delay`, no index column).
pub fn pattern_to_csv(pattern: &Pattern) -> BlastResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(REQUIRED_COLUMNS)
        .map_err(|e| BlastError::Codec(format!("csv header: {}", e)))?;
    for p in pattern.iter() {
        writer
            .write_record([p.x.to_string(), p.y.to_string(), p.delay.to_string()])
            .map_err(|e| BlastError::Codec(format!("csv row: {}", e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| BlastError::Codec(format!("csv flush: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| BlastError::Codec(format!("csv utf-8: {}", e)))
}

/// Load a pattern from a CSV file.
pub fn load_pattern_file(path: &Path) -> Result<Pattern> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    pattern_from_csv(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Write a pattern to a CSV file.
pub fn save_pattern_file(path: &Path, pattern: &Pattern) -> Result<()> {
    let text = pattern_to_csv(pattern).context("failed to serialize pattern")?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// The starter table offered to new users: three holes on a row with
/// sequential delays.
pub fn template_pattern() -> Pattern {
    Pattern::from_points(vec![
        Point::new(0.0, 0.0, 0.0),
        Point::new(10.0, 0.0, 1.0),
        Point::new(20.0, 0.0, 2.0),
    ])
}
