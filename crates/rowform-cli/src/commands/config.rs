//! Config command handlers

use anyhow::{bail, Context, Result};

use rowform_core::SyncConfig;

use crate::output::{Output, OutputFormat};

/// Show the current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = SyncConfig::load().context("Failed to load configuration")?;
    let path = SyncConfig::config_file_path();

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Quiet => {
            println!("{}", path.display());
        }
        OutputFormat::Human => {
            println!("Rowform Configuration");
            println!("=====================");
            println!();
            println!("Timing (ms):");
            println!("  debounce_ms:       {}", config.debounce_ms);
            println!("  field_debounce_ms: {}", config.field_debounce_ms);
            println!("  guard_hold_ms:     {}", config.guard_hold_ms);
            println!("  queue_poll_ms:     {}", config.queue_poll_ms);
            println!();
            println!("Handlers:");
            println!("  header_to_form:      {}", config.handlers.header_to_form);
            println!("  editor_to_form:      {}", config.handlers.editor_to_form);
            println!("  form_to_editor:      {}", config.handlers.form_to_editor);
            println!("  form_to_header:      {}", config.handlers.form_to_header);
            println!(
                "  cursor_to_row_field: {}",
                config.handlers.cursor_to_row_field
            );
            println!(
                "  row_field_to_cursor: {}",
                config.handlers.row_field_to_cursor
            );
            println!();
            println!("Config file: {}", path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = SyncConfig::load().context("Failed to load configuration")?;

    let parse_ms = |v: &str| -> Result<u64> {
        v.parse()
            .with_context(|| format!("Invalid millisecond value: '{}'", v))
    };
    let parse_bool = |v: &str| -> Result<bool> {
        v.parse()
            .with_context(|| format!("Invalid value: '{}'. Use 'true' or 'false'.", v))
    };

    match key.as_str() {
        "debounce_ms" => config.debounce_ms = parse_ms(&value)?,
        "field_debounce_ms" => config.field_debounce_ms = parse_ms(&value)?,
        "guard_hold_ms" => config.guard_hold_ms = parse_ms(&value)?,
        "queue_poll_ms" => config.queue_poll_ms = parse_ms(&value)?,
        "header_to_form" => config.handlers.header_to_form = parse_bool(&value)?,
        "editor_to_form" => config.handlers.editor_to_form = parse_bool(&value)?,
        "form_to_editor" => config.handlers.form_to_editor = parse_bool(&value)?,
        "form_to_header" => config.handlers.form_to_header = parse_bool(&value)?,
        "cursor_to_row_field" => config.handlers.cursor_to_row_field = parse_bool(&value)?,
        "row_field_to_cursor" => config.handlers.row_field_to_cursor = parse_bool(&value)?,
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: debounce_ms, field_debounce_ms, guard_hold_ms, queue_poll_ms,\n\
                 header_to_form, editor_to_form, form_to_editor, form_to_header,\n\
                 cursor_to_row_field, row_field_to_cursor",
                key
            );
        }
    }

    config.save().context("Failed to save configuration")?;
    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}
