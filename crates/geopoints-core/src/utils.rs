//! Helpers for describing tables to people.
//!
//! This module formats Arrow data types into short labels and builds the
//! [`TableInfo`] summary printed by `geopoints inspect`.

use arrow_schema::DataType;

use crate::formats::TableFormat;
use crate::table::SourceTable;
use crate::types::{FieldInfo, TableInfo};

/// Extension trait for formatting Arrow [`DataType`] into human-readable strings.
///
/// # Examples
///
/// ```
/// use arrow_schema::DataType;
/// use geopoints_core::utils::ArrowDataTypeExt;
///
/// assert_eq!(DataType::Float64.format(), "Float64");
/// assert_eq!(DataType::Utf8.format(), "String");
/// ```
pub trait ArrowDataTypeExt {
    /// Format the data type into a human-readable string.
    fn format(&self) -> String;
}

impl ArrowDataTypeExt for DataType {
    fn format(&self) -> String {
        match self {
            DataType::Boolean => "Boolean".to_string(),
            DataType::Int8 => "Int8".to_string(),
            DataType::Int16 => "Int16".to_string(),
            DataType::Int32 => "Int32".to_string(),
            DataType::Int64 => "Int64".to_string(),
            DataType::UInt8 => "UInt8".to_string(),
            DataType::UInt16 => "UInt16".to_string(),
            DataType::UInt32 => "UInt32".to_string(),
            DataType::UInt64 => "UInt64".to_string(),
            DataType::Float16 => "Float16".to_string(),
            DataType::Float32 => "Float32".to_string(),
            DataType::Float64 => "Float64".to_string(),
            DataType::Utf8 => "String".to_string(),
            DataType::LargeUtf8 => "LargeString".to_string(),
            DataType::Utf8View => "StringView".to_string(),
            DataType::Timestamp(unit, tz) => {
                let tz_str = tz.as_ref().map_or("", |t| t.as_ref());
                format!("Timestamp({unit:?}, {tz_str})")
            },
            DataType::Dictionary(_, value) => format!("Dictionary<{}>", value.format()),
            DataType::List(_) => "List".to_string(),
            DataType::Struct(_) => "Struct".to_string(),
            _ => format!("{self:?}"),
        }
    }
}

/// Summarizes a loaded table for display.
#[must_use]
pub fn describe_table(source: &str, format: &TableFormat, table: &SourceTable) -> TableInfo {
    let fields = table
        .schema()
        .fields()
        .iter()
        .map(|f| FieldInfo {
            name: f.name().clone(),
            data_type: f.data_type().format(),
            nullable: f.is_nullable(),
        })
        .collect();

    TableInfo {
        source: source.to_string(),
        format: format.short_name.to_string(),
        format_long_name: format.long_name.to_string(),
        rows: table.num_rows(),
        fields,
    }
}
