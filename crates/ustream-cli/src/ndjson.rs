use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use ustream_types::Unit;

/// Read NDJSON lines as units. Blank lines are skipped; a JSON array line is
/// a batch.
pub fn read_units<R: BufRead>(reader: R) -> impl Iterator<Item = Result<Unit>> {
    reader.lines().enumerate().filter_map(|(idx, line)| {
        let line_no = idx + 1;
        match line {
            Err(err) => Some(
                Err(anyhow::Error::new(err))
                    .with_context(|| format!("failed to read input line {line_no}")),
            ),
            Ok(text) if text.trim().is_empty() => None,
            Ok(text) => Some(
                serde_json::from_str::<Value>(&text)
                    .map(Unit::from_value)
                    .with_context(|| format!("malformed JSON on input line {line_no}")),
            ),
        }
    })
}

pub fn write_unit<W: Write>(writer: &mut W, unit: &Unit) -> Result<()> {
    serde_json::to_writer(&mut *writer, unit).context("failed to encode output unit")?;
    writer.write_all(b"\n").context("failed to write output")?;
    Ok(())
}

/// `.ndjson` and `.jsonl` change files hold one record per line.
pub fn is_line_delimited(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("ndjson" | "jsonl")
    )
}

/// Parse a change document. Line-delimited files are collected into a JSON
/// array; anything else must already be one JSON document.
pub fn parse_changes(text: &str, line_delimited: bool) -> Result<Value> {
    if !line_delimited {
        return serde_json::from_str(text).context("change file is not valid JSON");
    }
    let records = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("malformed JSON on change line {}", idx + 1))
        })
        .collect::<Result<Vec<Value>>>()?;
    Ok(Value::Array(records))
}
