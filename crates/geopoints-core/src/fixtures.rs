//! Built-in tables.

use std::sync::Arc;

use arrow_array::{Float64Array, RecordBatch, StringArray};
use arrow_schema::{ArrowError, DataType, Field, Schema};

use crate::table::SourceTable;

/// The three-city demo table: London, Paris and Berlin, in that order.
///
/// Columns are `longitude`, `latitude` and `name`, matching
/// [`PointSchema::City`](crate::PointSchema::City).
///
/// # Errors
///
/// Returns an [`ArrowError`] if the record batch cannot be assembled.
pub fn builtin_cities() -> Result<SourceTable, ArrowError> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("longitude", DataType::Float64, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("name", DataType::Utf8, false),
    ]));
    let columns: Vec<arrow_array::ArrayRef> = vec![
        Arc::new(Float64Array::from(vec![-0.1276, 2.3522, 13.405])),
        Arc::new(Float64Array::from(vec![51.5072, 48.8566, 52.52])),
        Arc::new(StringArray::from(vec!["London", "Paris", "Berlin"])),
    ];

    let batch = RecordBatch::try_new(Arc::clone(&schema), columns)?;
    Ok(SourceTable::new(schema, vec![batch]))
}
