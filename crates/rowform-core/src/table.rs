//! Tabular text parsing
//!
//! Splits delimiter-separated lines into cells and derives a
//! [`TableSnapshot`] from a whole buffer. Tab takes precedence over comma;
//! a line containing neither delimiter is a single cell.

use serde::Serialize;

/// Cell delimiter detected on a single line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
    /// No delimiter present - the whole line is one cell
    None,
}

impl Delimiter {
    /// Detect the delimiter for a line (tab wins over comma)
    pub fn detect(line: &str) -> Self {
        if line.contains('\t') {
            Delimiter::Tab
        } else if line.contains(',') {
            Delimiter::Comma
        } else {
            Delimiter::None
        }
    }

    /// The character used when rejoining cells
    ///
    /// A line that never had a delimiter but gained columns joins with tab.
    pub fn joiner(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab | Delimiter::None => '\t',
        }
    }
}

/// Split a line into cells, reporting the delimiter that was used
pub fn split_line(line: &str) -> (Vec<String>, Delimiter) {
    let delimiter = Delimiter::detect(line);
    let cells = match delimiter {
        Delimiter::Tab => line.split('\t').map(str::to_string).collect(),
        Delimiter::Comma => line.split(',').map(str::to_string).collect(),
        Delimiter::None => vec![line.to_string()],
    };
    (cells, delimiter)
}

/// Overwrite one cell of a line, padding with empty cells as needed
///
/// Never fails: a `column_index` past the current cell count grows the row.
/// The rejoined line keeps the delimiter the line already used.
pub fn set_cell(line: &str, column_index: usize, value: &str) -> String {
    let (mut cells, delimiter) = split_line(line);
    while cells.len() <= column_index {
        cells.push(String::new());
    }
    cells[column_index] = value.to_string();
    cells.join(&delimiter.joiner().to_string())
}

/// Placeholder column label for blank or missing headers
pub fn placeholder_label(index: usize) -> String {
    format!("Column {}", index + 1)
}

/// Normalize a raw header cell into a column label
///
/// Strips surrounding double quotes, unescapes doubled quotes, and falls
/// back to a placeholder when the cell is blank.
fn header_label(cell: &str, index: usize) -> String {
    let trimmed = cell.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .replace("\"\"", "\"");
    if unquoted.is_empty() {
        placeholder_label(index)
    } else {
        unquoted
    }
}

/// Structured view of a tabular buffer
///
/// Rebuilt by the orchestrator on every relevant change; handlers only read
/// it. `first_row_headers` are frozen from the physical first line so column
/// prompts stay stable while the header row is relocated.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableSnapshot {
    /// Column labels from the designated header row
    pub headers: Vec<String>,
    /// Labels from the physical first line, used as fallback placeholders
    pub first_row_headers: Vec<String>,
    /// Data rows (header row excluded, blank lines skipped), padded to
    /// `column_count`
    pub rows: Vec<Vec<String>>,
    /// Maximum cell count over all lines
    pub column_count: usize,
    /// Total line count of the buffer, including blank lines
    pub line_count: usize,
}

/// Clamp a 1-based row index into `1..=line_count`
pub fn clamp_row(row: usize, line_count: usize) -> usize {
    row.max(1).min(line_count.max(1))
}

/// Parse a whole buffer into a [`TableSnapshot`]
///
/// `header_row` is 1-based and clamped into range. Headers and
/// `first_row_headers` are both padded with placeholders up to the widest
/// line; short data rows pad with empty cells.
pub fn parse_document(text: &str, header_row: usize) -> TableSnapshot {
    let lines: Vec<&str> = text.lines().collect();
    let line_count = lines.len();
    if line_count == 0 {
        return TableSnapshot::default();
    }

    let header_row = clamp_row(header_row, line_count);

    let mut column_count = 0;
    for line in &lines {
        let (cells, _) = split_line(line);
        column_count = column_count.max(cells.len());
    }

    let label_row = |line: &str| -> Vec<String> {
        let (cells, _) = split_line(line);
        let mut labels: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| header_label(cell, i))
            .collect();
        while labels.len() < column_count {
            let next = labels.len();
            labels.push(placeholder_label(next));
        }
        labels
    };

    let first_row_headers = label_row(lines[0]);
    let headers = label_row(lines[header_row - 1]);

    let mut rows = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if i == header_row - 1 {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        let (cells, _) = split_line(line);
        let mut row: Vec<String> = cells.iter().map(|c| c.trim().to_string()).collect();
        row.resize(column_count, String::new());
        rows.push(row);
    }

    TableSnapshot {
        headers,
        first_row_headers,
        rows,
        column_count,
        line_count,
    }
}

/// Relation between the header row and the active row
///
/// Recomputed from the two indices on every event; never stored. Each
/// regime targets a different line for form edits: in `HeaderEqualsRow` a
/// form edit writes the header line itself (and relabels the form), in the
/// other two it writes a data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRegime {
    /// Header row precedes the active row (table below its header)
    HeaderBeforeRow,
    /// The active row is the header row itself
    HeaderEqualsRow,
    /// Header row was relocated below the active row
    HeaderAfterRow,
}

impl RowRegime {
    /// Classify the relation between two 1-based row indices
    pub fn compare(header_row: usize, active_row: usize) -> Self {
        use std::cmp::Ordering;
        match header_row.cmp(&active_row) {
            Ordering::Less => RowRegime::HeaderBeforeRow,
            Ordering::Equal => RowRegime::HeaderEqualsRow,
            Ordering::Greater => RowRegime::HeaderAfterRow,
        }
    }
}
