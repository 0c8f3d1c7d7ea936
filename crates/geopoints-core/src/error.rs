//! Custom error types for `geopoints` operations.
//!
//! This module provides structured error handling using `thiserror`. Every error maps onto
//! one [`ErrorKind`], which is what the service layer uses to pick a response, while the
//! variants themselves keep the detail that ends up in the logs.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for `geopoints` operations.
///
/// It uses `#[error(transparent)]` to delegate display formatting to the
/// underlying error variants.
#[derive(Debug, Error)]
pub enum GeoPointsError {
    /// The configured table source could not be read
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Bytes could not be decoded as a table
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The table does not satisfy the point schema
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// `DataFusion` query execution errors
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// The coarse failure taxonomy callers make policy decisions on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file behind a path-based load is missing, unreadable or corrupt.
    SourceUnavailable,
    /// Uploaded bytes do not parse as a table.
    MalformedUpload,
    /// Required columns are absent, or their values cannot be used.
    SchemaInvalid,
    /// Anything else: query engine failures and the like.
    Internal,
}

/// Errors raised while reading a table source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File was not found
    #[error("File not found: '{path}'")]
    FileNotFound {
        /// The missing file path
        path: PathBuf,
    },

    /// Failed to read from a file
    #[error("Failed to read '{path}': {source}")]
    Read {
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file exists but its contents are not a readable table
    #[error("Failed to decode '{path}': {source}")]
    Corrupt {
        /// The file path
        path: PathBuf,
        /// The decoding failure
        #[source]
        source: FormatError,
    },
}

/// Table decoding errors.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Failed to parse a format
    #[error("Failed to parse {format}: {message}")]
    Parse {
        /// The format being parsed
        format: String,
        /// Description of the parse error
        message: String,
    },

    /// The payload is in a format that is recognized but cannot be read
    #[error("{format} tables are not supported")]
    Unsupported {
        /// The recognized format
        format: String,
    },

    /// The payload matches no known table format
    #[error("Unrecognized table format")]
    Unrecognized,

    /// The payload is empty
    #[error("Empty table payload")]
    Empty,
}

/// Schema validation errors.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Required columns are absent from the table
    #[error("Required columns not found: {}", .missing.join(", "))]
    MissingColumns {
        /// The absent columns, in schema order
        missing: Vec<String>,
    },

    /// Type mismatch in a field
    #[error("Field '{field}' has incompatible type: expected {expected}, found {found}")]
    TypeMismatch {
        /// The field name
        field: String,
        /// Expected type
        expected: String,
        /// Actual type found
        found: String,
    },

    /// A projected column holds a null (or a value that failed to cast)
    #[error("Field '{field}' has no usable value at row {row}")]
    NullValue {
        /// The field name
        field: String,
        /// Zero-based row index within the projected result
        row: usize,
    },

    /// A projected value has no faithful representation in the point field
    #[error("Field '{field}' at row {row} is not a valid {expected}")]
    InvalidValue {
        /// The field name
        field: String,
        /// Zero-based row index within the projected result
        row: usize,
        /// The point field type
        expected: String,
    },
}

/// DataFusion-specific errors.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Query execution failed
    #[error("Query execution failed: {0}")]
    Execution(#[from] datafusion::error::DataFusionError),
}

/// Type alias for Results using `GeoPointsError`.
pub type Result<T> = std::result::Result<T, GeoPointsError>;

impl GeoPointsError {
    /// Classify this error into the failure taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Source(_) => ErrorKind::SourceUnavailable,
            Self::Format(_) => ErrorKind::MalformedUpload,
            Self::Schema(_) => ErrorKind::SchemaInvalid,
            Self::Query(_) => ErrorKind::Internal,
        }
    }

    /// Get a message that is safe to hand to an HTTP client.
    ///
    /// Missing column names are included; parser and I/O internals are not.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Source(_) => "Point data is currently unavailable".to_string(),
            Self::Format(FormatError::Unsupported { format }) => {
                format!("{format} tables are not supported; upload Arrow, Parquet, CSV or NDJSON")
            },
            Self::Format(_) => "Uploaded file could not be read as a table".to_string(),
            Self::Schema(e) => e.user_message(),
            Self::Query(_) => "Failed to process point data".to_string(),
        }
    }
}

impl SchemaError {
    fn user_message(&self) -> String {
        match self {
            Self::MissingColumns { missing } => {
                format!("Required columns not found: {}", missing.join(", "))
            },
            Self::TypeMismatch { field, expected, .. } => {
                format!("Column '{field}' must be {expected}")
            },
            Self::NullValue { field, .. } => format!("Column '{field}' contains empty values"),
            Self::InvalidValue { field, expected, .. } => {
                format!("Column '{field}' contains values that are not {expected}")
            },
        }
    }
}

/// Extension trait for adding path context to I/O errors.
pub trait IoErrorExt<T> {
    /// Add read context to an error.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::FileNotFound`] when the underlying error is `NotFound`,
    /// [`SourceError::Read`] otherwise.
    fn with_read_context(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn with_read_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            let path = path.into();
            let err = if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::FileNotFound { path }
            } else {
                SourceError::Read { path, source: e }
            };
            GeoPointsError::Source(err)
        })
    }
}
