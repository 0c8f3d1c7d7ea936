//! Table sources the point service can be built on.
//!
//! A [`TableSource`] is handed to the service at construction. The file source rereads
//! its file on every load; the in-memory source hands out the same immutable table
//! every time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;

use crate::error::{GeoPointsError, IoErrorExt, Result, SourceError};
use crate::formats::TableFormat;
use crate::table::{SourceTable, detect_format};

/// Somewhere a [`SourceTable`] can be loaded from.
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Human-readable description used in logs.
    fn describe(&self) -> String;

    /// Loads the table.
    ///
    /// # Errors
    ///
    /// Implementations return a [`SourceError`] when the table cannot be produced.
    async fn load(&self) -> Result<Arc<SourceTable>>;
}

/// Reads a serialized table from a file on every load.
#[derive(Debug, Clone)]
pub struct FileTableSource {
    path: PathBuf,
}

impl FileTableSource {
    /// Creates a source for the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decodes the file, also returning the format it was read as.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::FileNotFound`] or [`SourceError::Read`] when the file
    /// cannot be read and [`SourceError::Corrupt`] when it does not decode.
    pub async fn read(&self) -> Result<(TableFormat, SourceTable)> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_read_context(&self.path)?;
        let bytes = Bytes::from(bytes);

        let name = self.path.to_str();
        let decoded = detect_format(&bytes, name)
            .and_then(|format| SourceTable::decode(bytes, &format).map(|t| (format, t)));
        match decoded {
            Ok((format, table)) => {
                debug!(
                    "Loaded {} row(s) from {} ({})",
                    table.num_rows(),
                    self.path.display(),
                    format.short_name
                );
                Ok((format, table))
            },
            Err(GeoPointsError::Format(source)) => Err(SourceError::Corrupt {
                path: self.path.clone(),
                source,
            }
            .into()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl TableSource for FileTableSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn load(&self) -> Result<Arc<SourceTable>> {
        let (_, table) = self.read().await?;
        Ok(Arc::new(table))
    }
}

/// Serves one table held in memory, regardless of any file state.
#[derive(Debug, Clone)]
pub struct InMemoryTableSource {
    name: String,
    table: Arc<SourceTable>,
}

impl InMemoryTableSource {
    /// Wraps `table` under a descriptive `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, table: SourceTable) -> Self {
        Self {
            name: name.into(),
            table: Arc::new(table),
        }
    }
}

#[async_trait]
impl TableSource for InMemoryTableSource {
    fn describe(&self) -> String {
        format!("in-memory table '{}'", self.name)
    }

    async fn load(&self) -> Result<Arc<SourceTable>> {
        Ok(Arc::clone(&self.table))
    }
}
