//! Form view abstraction
//!
//! The side-panel form is an external collaborator; the engine drives it
//! through [`FormView`] and receives user edits as [`FormMessage`]s.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// One form row: ordered (column label, cell value) pairs
pub type FormRow = Vec<(String, String)>;

/// Outbound operations on the form panel
pub trait FormView: Send + Sync {
    /// Replace the column labels
    fn set_headers(&self, headers: &[String]);

    /// Fill the form with one row's cells
    ///
    /// `row_index` is relative to the header row (may be negative or -1 for
    /// "no single row"); `line_number` is the 1-based buffer line.
    fn select_row(&self, row: FormRow, row_index: i64, line_number: usize);

    /// Blank out every field
    fn clear_form(&self);

    /// Refresh the line statistics footer
    fn update_line_stats(&self, total_lines: usize, current_line: usize);

    /// Update only the current-row numeric field, without re-rendering
    fn update_current_row_field(&self, line_number: usize);
}

/// Inbound messages originating from the user in the form panel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FormMessage {
    /// A form field was edited
    #[serde(rename_all = "camelCase")]
    UpdateCell {
        /// 1-based buffer line the form is showing
        line_number: usize,
        /// Column label of the edited field
        column: String,
        value: String,
        /// Position of the field, used when labels are ambiguous
        column_index: usize,
    },
    /// Append a new row at the end of the buffer
    #[serde(rename_all = "camelCase")]
    AddRow {
        /// Values keyed by column label; missing columns become empty cells
        #[serde(default)]
        values: Option<std::collections::BTreeMap<String, String>>,
        /// Copy the cursor line instead of building from `values`
        #[serde(default)]
        copy_current_row: bool,
    },
    /// The header-row numeric field changed
    #[serde(rename_all = "camelCase")]
    HeaderRowChanged { row: usize },
    /// The current-row numeric field changed
    #[serde(rename_all = "camelCase")]
    CurrentRowChanged { row: usize },
}

/// A call recorded by [`RecordingFormView`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum FormCall {
    SetHeaders { headers: Vec<String> },
    SelectRow {
        row: FormRow,
        row_index: i64,
        line_number: usize,
    },
    ClearForm,
    UpdateLineStats { total_lines: usize, current_line: usize },
    UpdateCurrentRowField { line_number: usize },
}

/// Form view that records every call
///
/// Used by tests to assert on the exact call sequence and by the CLI
/// replay command to print a form trace.
#[derive(Default)]
pub struct RecordingFormView {
    calls: Mutex<Vec<FormCall>>,
}

impl RecordingFormView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded calls
    pub fn calls(&self) -> Vec<FormCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Drain the recorded calls
    pub fn take_calls(&self) -> Vec<FormCall> {
        std::mem::take(&mut self.calls.lock().unwrap())
    }

    fn record(&self, call: FormCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl FormView for RecordingFormView {
    fn set_headers(&self, headers: &[String]) {
        self.record(FormCall::SetHeaders { headers: headers.to_vec() });
    }

    fn select_row(&self, row: FormRow, row_index: i64, line_number: usize) {
        self.record(FormCall::SelectRow { row, row_index, line_number });
    }

    fn clear_form(&self) {
        self.record(FormCall::ClearForm);
    }

    fn update_line_stats(&self, total_lines: usize, current_line: usize) {
        self.record(FormCall::UpdateLineStats { total_lines, current_line });
    }

    fn update_current_row_field(&self, line_number: usize) {
        self.record(FormCall::UpdateCurrentRowField { line_number });
    }
}
