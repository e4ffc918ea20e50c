//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use rowform_core::{FormCall, TableSnapshot};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is in JSON mode
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a parsed table snapshot
    pub fn print_snapshot(&self, snapshot: &TableSnapshot, header_row: usize) {
        match self.format {
            OutputFormat::Human => {
                println!("Lines:      {}", snapshot.line_count);
                println!("Columns:    {}", snapshot.column_count);
                println!("Header row: {}", header_row);
                println!("Headers:    {}", snapshot.headers.join(" | "));
                if !snapshot.rows.is_empty() {
                    println!();
                    for row in snapshot.rows.iter().take(10) {
                        println!(
                            "  {}",
                            row.iter()
                                .map(|c| truncate(c, 25))
                                .collect::<Vec<_>>()
                                .join(" | ")
                        );
                    }
                    if snapshot.rows.len() > 10 {
                        println!("  ... {} more row(s)", snapshot.rows.len() - 10);
                    }
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(snapshot).unwrap());
            }
            OutputFormat::Quiet => {
                for header in &snapshot.headers {
                    println!("{}", header);
                }
            }
        }
    }

    /// Print one row as label/value pairs
    pub fn print_row(&self, line_number: usize, fields: &[(String, String)]) {
        match self.format {
            OutputFormat::Human => {
                println!("Line {}:", line_number);
                let width = fields.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
                for (label, value) in fields {
                    println!("  {:width$}  {}", label, value, width = width);
                }
            }
            OutputFormat::Json => {
                let object: serde_json::Map<_, _> = fields
                    .iter()
                    .map(|(l, v)| (l.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&object).unwrap());
            }
            OutputFormat::Quiet => {
                for (_, value) in fields {
                    println!("{}", value);
                }
            }
        }
    }

    /// Print the calls the engine made on the form during a replay
    pub fn print_form_trace(&self, calls: &[FormCall]) {
        match self.format {
            OutputFormat::Human => {
                println!("── Form trace ({} call(s)) ──", calls.len());
                for call in calls {
                    println!("{}", serde_json::to_string(call).unwrap());
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(calls).unwrap());
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Truncate a string to max length in characters, adding "..." if truncated
///
/// Counts characters rather than bytes; cell content is arbitrary user
/// text and cutting at a byte offset could split a multibyte character.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
