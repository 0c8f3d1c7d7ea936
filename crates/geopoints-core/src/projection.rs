//! Point projection: schema validation, column selection and row limiting.
//!
//! [`project_points`] is the whole pipeline. The table is first checked against a
//! [`PointSchema`], producing an explicit [`Validation`]; a valid table is then narrowed to
//! the required columns and truncated with `DataFusion`, and the surviving rows become
//! [`Point`]s in source order.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, Int64Type};
use arrow_array::{Array, ArrayRef, RecordBatch};
use arrow_schema::{ArrowError, DataType, Schema};
use datafusion::datasource::MemTable;
use datafusion::prelude::{SessionConfig, SessionContext};
use log::debug;

use crate::error::{QueryError, Result, SchemaError};
use crate::table::SourceTable;
use crate::types::{CityPoint, Point, PointSet, VesselPoint};
use crate::utils::ArrowDataTypeExt;

/// The target schema a table is projected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointSchema {
    /// `lat`, `lon` and an integer `MMSI` identifier.
    #[default]
    Vessel,
    /// `longitude`, `latitude` and a string `name`.
    City,
}

/// Outcome of checking a table against a [`PointSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Every required column is present.
    Valid,
    /// These required columns are absent, in schema order.
    MissingColumns(Vec<String>),
}

impl Validation {
    /// Returns `true` if every required column is present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    /// Converts the outcome into a result.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingColumns`] if any column is absent.
    pub fn into_result(self) -> Result<()> {
        match self {
            Validation::Valid => Ok(()),
            Validation::MissingColumns(missing) => {
                Err(SchemaError::MissingColumns { missing }.into())
            },
        }
    }
}

impl PointSchema {
    /// Column names the table must carry, in output order of the projection.
    #[must_use]
    pub const fn required_columns(self) -> &'static [&'static str] {
        match self {
            PointSchema::Vessel => &["lat", "lon", "MMSI"],
            PointSchema::City => &["longitude", "latitude", "name"],
        }
    }

    /// Checks that every required column is present. Names match exactly.
    ///
    /// # Examples
    ///
    /// ```
    /// use arrow_schema::{DataType, Field, Schema};
    /// use geopoints_core::{PointSchema, Validation};
    ///
    /// let schema = Schema::new(vec![
    ///     Field::new("lon", DataType::Float64, false),
    ///     Field::new("MMSI", DataType::Int64, false),
    /// ]);
    /// assert_eq!(
    ///     PointSchema::Vessel.validate(&schema),
    ///     Validation::MissingColumns(vec!["lat".to_string()])
    /// );
    /// ```
    #[must_use]
    pub fn validate(self, schema: &Schema) -> Validation {
        let missing: Vec<String> = self
            .required_columns()
            .iter()
            .filter(|name| schema.field_with_name(name).is_err())
            .map(|name| (*name).to_string())
            .collect();
        if missing.is_empty() {
            Validation::Valid
        } else {
            Validation::MissingColumns(missing)
        }
    }

    /// Returns the string representation of this schema.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            PointSchema::Vessel => "vessel",
            PointSchema::City => "city",
        }
    }
}

impl fmt::Display for PointSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointSchema {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vessel" => Ok(PointSchema::Vessel),
            "city" => Ok(PointSchema::City),
            other => Err(format!("unknown point schema '{other}' (expected vessel or city)")),
        }
    }
}

/// Projects `table` into a [`PointSet`].
///
/// # Arguments
///
/// * `table` - The loaded table
/// * `schema` - The target point schema
/// * `limit` - Keep at most this many rows, from the start of the table
///
/// # Errors
///
/// Returns a [`SchemaError`] if required columns are missing, cannot be cast to the
/// point field types, or hold nulls; a [`QueryError`] if `DataFusion` fails.
pub async fn project_points(
    table: &SourceTable,
    schema: PointSchema,
    limit: Option<usize>,
) -> Result<PointSet> {
    schema.validate(&table.schema()).into_result()?;

    let batches = select_rows(table, schema.required_columns(), limit).await?;
    let points = rows_to_points(&batches, schema)?;
    debug!(
        "Projected {} of {} row(s) into {schema} points",
        points.len(),
        table.num_rows()
    );
    Ok(PointSet { points })
}

async fn select_rows(
    table: &SourceTable,
    columns: &[&str],
    limit: Option<usize>,
) -> Result<Vec<RecordBatch>> {
    // One partition keeps the memory table scan, and therefore the output, in row order.
    let ctx = SessionContext::new_with_config(SessionConfig::new().with_target_partitions(1));
    let provider = MemTable::try_new(table.schema(), vec![table.batches().to_vec()])
        .map_err(QueryError::from)?;

    let mut df = ctx
        .read_table(Arc::new(provider))
        .map_err(QueryError::from)?
        .select_columns(columns)
        .map_err(QueryError::from)?;
    if let Some(n) = limit {
        df = df.limit(0, Some(n)).map_err(QueryError::from)?;
    }

    let batches = df.collect().await.map_err(QueryError::from)?;
    Ok(batches)
}

fn rows_to_points(batches: &[RecordBatch], schema: PointSchema) -> Result<Vec<Point>> {
    let mut points = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());
    let mut offset = 0;

    for batch in batches {
        match schema {
            PointSchema::Vessel => {
                let lat = typed_column(batch, "lat", &DataType::Float64, offset)?;
                let lon = typed_column(batch, "lon", &DataType::Float64, offset)?;
                let mmsi = typed_column(batch, "MMSI", &DataType::Int64, offset)?;
                let lat = lat.as_primitive::<Float64Type>();
                let lon = lon.as_primitive::<Float64Type>();
                let mmsi = mmsi.as_primitive::<Int64Type>();
                for i in 0..batch.num_rows() {
                    points.push(Point::Vessel(VesselPoint {
                        lon: lon.value(i),
                        lat: lat.value(i),
                        mmsi: mmsi.value(i),
                    }));
                }
            },
            PointSchema::City => {
                let longitude = typed_column(batch, "longitude", &DataType::Float64, offset)?;
                let latitude = typed_column(batch, "latitude", &DataType::Float64, offset)?;
                let name = typed_column(batch, "name", &DataType::Utf8, offset)?;
                let longitude = longitude.as_primitive::<Float64Type>();
                let latitude = latitude.as_primitive::<Float64Type>();
                let name = name.as_string::<i32>();
                for i in 0..batch.num_rows() {
                    points.push(Point::City(CityPoint {
                        longitude: longitude.value(i),
                        latitude: latitude.value(i),
                        name: name.value(i).to_string(),
                    }));
                }
            },
        }
        offset += batch.num_rows();
    }

    Ok(points)
}

/// Fetches a column cast to `to`, rejecting uncastable types and null values.
///
/// Values that fail to cast (e.g. `"abc"` as a float) become nulls and are rejected too,
/// as are non-finite floats and fractional values headed for an integer field.
fn typed_column(batch: &RecordBatch, name: &str, to: &DataType, offset: usize) -> Result<ArrayRef> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| SchemaError::MissingColumns {
            missing: vec![name.to_string()],
        })?;

    let mismatch = || SchemaError::TypeMismatch {
        field: name.to_string(),
        expected: to.format(),
        found: column.data_type().format(),
    };
    if !arrow_cast::can_cast_types(column.data_type(), to) {
        return Err(mismatch().into());
    }
    let cast = arrow_cast::cast(column, to).map_err(|_| mismatch())?;

    if let Some(row) = (0..cast.len()).find(|&i| cast.is_null(i)) {
        return Err(SchemaError::NullValue {
            field: name.to_string(),
            row: offset + row,
        }
        .into());
    }
    if let Some(row) = first_inexact_row(column, &cast).map_err(|_| mismatch())? {
        return Err(SchemaError::InvalidValue {
            field: name.to_string(),
            row: offset + row,
            expected: to.format(),
        }
        .into());
    }
    Ok(cast)
}

/// Finds the first row whose cast value does not stand for the source value.
///
/// Floats must be finite. Integers cast from floats or decimals must not have
/// dropped a fractional part.
fn first_inexact_row(
    column: &ArrayRef,
    cast: &ArrayRef,
) -> std::result::Result<Option<usize>, ArrowError> {
    let source_type = column.data_type();
    match cast.data_type() {
        DataType::Float64 => Ok(first_rejected(cast.as_primitive::<Float64Type>().values(), false)),
        DataType::Int64
            if source_type.is_floating()
                || matches!(source_type, DataType::Decimal128(..) | DataType::Decimal256(..)) =>
        {
            let source = arrow_cast::cast(column, &DataType::Float64)?;
            Ok(first_rejected(source.as_primitive::<Float64Type>().values(), true))
        },
        _ => Ok(None),
    }
}

fn first_rejected(values: &[f64], integral: bool) -> Option<usize> {
    values
        .iter()
        .position(|v| !v.is_finite() || (integral && v.fract() != 0.0))
}
