//! In-memory tables and the decoders that produce them.
//!
//! A [`SourceTable`] is an Arrow schema plus its record batches. Tables are built by
//! decoding a byte payload in one of the formats from [`crate::formats`]; a payload whose
//! name does not say which format it is gets sniffed.

use std::io::{BufReader, Cursor};
use std::sync::Arc;

use arrow::ipc::reader::{FileReader, StreamReader};
use arrow_array::RecordBatch;
use arrow_schema::{ArrowError, SchemaRef};
use bytes::Bytes;
use datafusion::parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use log::debug;

use crate::error::{FormatError, Result};
use crate::formats::{FormatKind, TableFormat, format_for_path, sniff_format};

/// Number of records read to infer a CSV or NDJSON schema.
const SCHEMA_INFER_MAX_RECORDS: usize = 1000;

/// An in-memory table with named, typed columns.
#[derive(Debug, Clone)]
pub struct SourceTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl SourceTable {
    /// Creates a table from a schema and batches sharing that schema.
    #[must_use]
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    /// Decodes `bytes` as a table.
    ///
    /// The format comes from the extension of `name` when it names a known format,
    /// otherwise from the leading bytes of the payload.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] when the payload is empty, matches no format, is in an
    /// unsupported format, or fails to decode.
    pub fn from_bytes(bytes: Bytes, name: Option<&str>) -> Result<Self> {
        let format = detect_format(&bytes, name)?;
        Self::decode(bytes, &format)
    }

    /// Decodes `bytes` as a table in the given format.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Unsupported`] for formats that cannot be read and
    /// [`FormatError::Parse`] when decoding fails.
    pub fn decode(bytes: Bytes, format: &TableFormat) -> Result<Self> {
        if bytes.is_empty() {
            return Err(FormatError::Empty.into());
        }

        let parse_err = |e: ArrowError| FormatError::Parse {
            format: format.short_name.to_string(),
            message: e.to_string(),
        };

        let (schema, batches) = match format.kind {
            FormatKind::ArrowFile => {
                let reader = FileReader::try_new(Cursor::new(&bytes[..]), None).map_err(parse_err)?;
                let schema = reader.schema();
                (schema, collect_batches(reader).map_err(parse_err)?)
            },
            FormatKind::ArrowStream => {
                let reader = StreamReader::try_new(&bytes[..], None).map_err(parse_err)?;
                let schema = reader.schema();
                (schema, collect_batches(reader).map_err(parse_err)?)
            },
            FormatKind::Parquet => {
                let builder = ParquetRecordBatchReaderBuilder::try_new(bytes.clone())
                    .map_err(|e| parse_err(ArrowError::ExternalError(Box::new(e))))?;
                let schema = Arc::clone(builder.schema());
                let reader = builder
                    .build()
                    .map_err(|e| parse_err(ArrowError::ExternalError(Box::new(e))))?;
                (schema, collect_batches(reader).map_err(parse_err)?)
            },
            FormatKind::Csv => {
                let (schema, _) = arrow_csv::reader::Format::default()
                    .with_header(true)
                    .infer_schema(&bytes[..], Some(SCHEMA_INFER_MAX_RECORDS))
                    .map_err(parse_err)?;
                let schema = Arc::new(schema);
                let reader = arrow_csv::ReaderBuilder::new(Arc::clone(&schema))
                    .with_header(true)
                    .build(&bytes[..])
                    .map_err(parse_err)?;
                (schema, collect_batches(reader).map_err(parse_err)?)
            },
            FormatKind::NdJson => {
                let (schema, _) = arrow_json::reader::infer_json_schema(
                    BufReader::new(&bytes[..]),
                    Some(SCHEMA_INFER_MAX_RECORDS),
                )
                .map_err(parse_err)?;
                let schema = Arc::new(schema);
                let reader = arrow_json::ReaderBuilder::new(Arc::clone(&schema))
                    .build(BufReader::new(&bytes[..]))
                    .map_err(parse_err)?;
                (schema, collect_batches(reader).map_err(parse_err)?)
            },
            FormatKind::Pickle => {
                return Err(FormatError::Unsupported {
                    format: format.short_name.to_string(),
                }
                .into());
            },
        };

        let table = Self::new(schema, batches);
        debug!(
            "Decoded {} table: {} column(s), {} row(s)",
            format.short_name,
            table.schema.fields().len(),
            table.num_rows()
        );
        Ok(table)
    }

    /// The table schema.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// The record batches, in row order.
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total number of rows across all batches.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }
}

/// Chooses the format for a payload, preferring the extension of `name`.
///
/// # Errors
///
/// Returns [`FormatError::Empty`] for an empty payload and [`FormatError::Unrecognized`]
/// when neither the name nor the bytes identify a format.
pub fn detect_format(bytes: &[u8], name: Option<&str>) -> Result<TableFormat> {
    if bytes.is_empty() {
        return Err(FormatError::Empty.into());
    }
    name.and_then(format_for_path)
        .or_else(|| sniff_format(bytes))
        .ok_or_else(|| FormatError::Unrecognized.into())
}

fn collect_batches<I>(reader: I) -> std::result::Result<Vec<RecordBatch>, ArrowError>
where
    I: Iterator<Item = std::result::Result<RecordBatch, ArrowError>>,
{
    reader.collect()
}
