//! Replay command handler
//!
//! Feeds a scripted sequence of edits through a real [`Orchestrator`] over
//! an in-memory buffer, then prints (or writes) the resulting buffer. With
//! `--trace` the calls the engine made on the form are printed too, which
//! makes the command double as a debugging aid for sync behavior.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use rowform_core::editor::{BufferEditor, Document, Editor, Position, Selection};
use rowform_core::form::{FormView, RecordingFormView};
use rowform_core::{FormMessage, Orchestrator, SyncConfig};

use crate::output::Output;

/// One scripted edit
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ReplayAction {
    /// Edit a form field
    UpdateCell {
        line_number: usize,
        column: String,
        value: String,
        #[serde(default)]
        column_index: usize,
    },
    /// Append a row from values or a copy of the cursor line
    AddRow {
        #[serde(default)]
        values: Option<BTreeMap<String, String>>,
        #[serde(default)]
        copy_current_row: bool,
    },
    /// Change the header-row field
    SetHeaderRow { row: usize },
    /// Change the current-row field
    SetCurrentRow { row: usize },
    /// Move the editor cursor to a 1-based line
    MoveCursor { line: usize },
    /// Replace a 1-based line's text in the editor
    EditLine { line: usize, text: String },
}

/// Replay a script against a file
pub async fn run(
    file: &Path,
    script: &Path,
    header_row: usize,
    trace: bool,
    out_file: Option<&Path>,
    output: &Output,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let script_text = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read {}", script.display()))?;
    let actions: Vec<ReplayAction> =
        serde_json::from_str(&script_text).context("Failed to parse replay script")?;

    let editor = BufferEditor::new(&text);
    let form = Arc::new(RecordingFormView::new());
    // Wall-clock coalescing only gets in the way of a scripted run
    let config = SyncConfig::immediate();
    let orchestrator = Orchestrator::new(
        Arc::clone(&editor) as Arc<dyn Editor>,
        Arc::clone(&form) as Arc<dyn FormView>,
        &config,
    );

    if header_row != 1 {
        orchestrator
            .handle_form_message(FormMessage::HeaderRowChanged { row: header_row })
            .await;
    }
    orchestrator.reload().await;

    for action in actions {
        apply(&orchestrator, &editor, action).await;
        settle().await;
    }
    orchestrator.dispose();

    if trace {
        output.print_form_trace(&form.take_calls());
    }

    let buffer = editor.text();
    match out_file {
        Some(path) => {
            std::fs::write(path, &buffer)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output.success(&format!("Wrote {}", path.display()));
        }
        None => {
            if output.is_json() && !trace {
                println!("{}", serde_json::json!({ "buffer": buffer }));
            } else if !output.is_json() {
                println!("{}", buffer);
            }
        }
    }

    Ok(())
}

async fn apply(orchestrator: &Orchestrator, editor: &Arc<BufferEditor>, action: ReplayAction) {
    match action {
        ReplayAction::UpdateCell {
            line_number,
            column,
            value,
            column_index,
        } => {
            orchestrator
                .handle_form_message(FormMessage::UpdateCell {
                    line_number,
                    column,
                    value,
                    column_index,
                })
                .await;
        }
        ReplayAction::AddRow {
            values,
            copy_current_row,
        } => {
            orchestrator
                .handle_form_message(FormMessage::AddRow {
                    values,
                    copy_current_row,
                })
                .await;
        }
        ReplayAction::SetHeaderRow { row } => {
            orchestrator
                .handle_form_message(FormMessage::HeaderRowChanged { row })
                .await;
        }
        ReplayAction::SetCurrentRow { row } => {
            orchestrator
                .handle_form_message(FormMessage::CurrentRowChanged { row })
                .await;
            // The host reports the cursor move the handler just made
            orchestrator.cursor_moved().await;
        }
        ReplayAction::MoveCursor { line } => {
            editor.set_selection(Selection::cursor(Position::new(line.saturating_sub(1), 0)));
            orchestrator.cursor_moved().await;
        }
        ReplayAction::EditLine { line, text } => {
            if editor.replace_line(line.saturating_sub(1), &text).await.is_ok() {
                orchestrator.text_changed().await;
            }
        }
    }
}

/// Let zero-delay guard releases and timers run before the next action
async fn settle() {
    tokio::time::sleep(Duration::from_millis(2)).await;
}
