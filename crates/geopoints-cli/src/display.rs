//! Display utilities for formatting CLI output.
//!
//! This module provides table row structures and formatting functions
//! for presenting table information in a human-readable format.

use tabled::{Table, Tabled};

use geopoints_core::formats::TableFormat;
use geopoints_core::types::TableInfo;

/// Table row representation for displaying field/column information.
#[derive(Tabled)]
pub struct FieldRow {
    /// Name of the field.
    #[tabled(rename = "Field")]
    pub name: String,
    /// Data type of the field.
    #[tabled(rename = "Type")]
    pub data_type: String,
    /// Whether the field can contain null values.
    #[tabled(rename = "Nullable")]
    pub nullable: String,
}

/// Table row representation for displaying format information.
#[derive(Tabled)]
pub struct FormatRow {
    /// Short identifier for the format (e.g., `Arrow`, `CSV`).
    #[tabled(rename = "Short Name")]
    pub short_name: String,
    /// Full descriptive name of the format.
    #[tabled(rename = "Long Name")]
    pub long_name: String,
    /// Extensions that select the format.
    #[tabled(rename = "Extensions")]
    pub extensions: String,
    /// Whether tables in this format can be read.
    #[tabled(rename = "Read")]
    pub read: String,
}

/// Display table information: source, format, row count and fields.
pub fn display_table_info(info: &TableInfo) {
    println!("\nSource: {}", info.source);
    println!("Format: {} ({})", info.format, info.format_long_name);
    println!("Rows: {}", info.rows);

    if info.fields.is_empty() {
        println!("\nNo fields found");
        return;
    }

    println!("\n=== Fields ===");
    let rows: Vec<FieldRow> = info
        .fields
        .iter()
        .map(|f| FieldRow {
            name: f.name.clone(),
            data_type: f.data_type.clone(),
            nullable: if f.nullable { "Yes" } else { "No" }.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));
}

/// Display the format registry.
pub fn display_formats(formats: &[TableFormat]) {
    println!("\nTable Formats ({} total):\n", formats.len());

    let rows: Vec<FormatRow> = formats
        .iter()
        .map(|f| FormatRow {
            short_name: f.short_name.to_string(),
            long_name: f.long_name.to_string(),
            extensions: f
                .extensions
                .iter()
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(" "),
            read: f.read.as_str().to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));
}
