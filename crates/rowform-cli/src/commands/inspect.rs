//! Inspect command handler

use std::path::Path;

use anyhow::{bail, Context, Result};

use rowform_core::table::{clamp_row, parse_document, placeholder_label, split_line};

use crate::output::Output;

/// Parse a file and print its table structure
pub fn run(file: &Path, header_row: usize, row: Option<usize>, output: &Output) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let lines: Vec<&str> = text.lines().collect();
    let header_row = clamp_row(header_row, lines.len());
    let snapshot = parse_document(&text, header_row);

    match row {
        None => output.print_snapshot(&snapshot, header_row),
        Some(row) => {
            let Some(line) = lines.get(row.wrapping_sub(1)) else {
                bail!(
                    "Line {} is out of range ({} has {} lines)",
                    row,
                    file.display(),
                    lines.len()
                );
            };
            let (cells, _) = split_line(line);
            let fields: Vec<(String, String)> = cells
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let label = snapshot
                        .headers
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| placeholder_label(i));
                    (label, cell.trim().to_string())
                })
                .collect();
            output.print_row(row, &fields);
        }
    }

    Ok(())
}
