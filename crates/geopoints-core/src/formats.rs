//! Registry of serialized table formats and their read support.
//!
//! Every format the loader can meet is listed here, including ones it recognizes only to
//! reject (Python pickles). Lookups are by short name or by file extension, and
//! [`sniff_format`] picks a format for a byte payload when the name gives no hint.
//!
//! # Examples
//!
//! ```
//! use geopoints_core::formats::{find_format, get_supported_formats};
//!
//! let arrow = find_format("arrow").expect("Arrow format should exist");
//! assert!(arrow.read.is_supported());
//!
//! for format in get_supported_formats() {
//!     println!("{}: {}", format.short_name, format.long_name);
//! }
//! ```

use std::path::Path;

/// Whether the loader can read a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStatus {
    /// The format is decoded into a table.
    Supported,
    /// The format is recognized but rejected.
    NotSupported,
}

impl SupportStatus {
    /// Returns `true` if the format is decoded into a table.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, SupportStatus::Supported)
    }

    /// Returns the string representation of this support status.
    ///
    /// # Examples
    ///
    /// ```
    /// use geopoints_core::formats::SupportStatus;
    ///
    /// assert_eq!(SupportStatus::Supported.as_str(), "Supported");
    /// assert_eq!(SupportStatus::NotSupported.as_str(), "Not Supported");
    /// ```
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SupportStatus::Supported => "Supported",
            SupportStatus::NotSupported => "Not Supported",
        }
    }
}

/// Identifies the decoder used for a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// Arrow IPC random-access file (`ARROW1` framed).
    ArrowFile,
    /// Arrow IPC streaming format.
    ArrowStream,
    /// Apache Parquet.
    Parquet,
    /// Comma separated values with a header row.
    Csv,
    /// Newline-delimited JSON objects.
    NdJson,
    /// Python pickle, as written by `pandas.DataFrame.to_pickle`.
    Pickle,
}

/// A serialized table format.
#[derive(Debug, Clone)]
pub struct TableFormat {
    /// Which decoder handles this format.
    pub kind: FormatKind,
    /// Short name used in the CLI and in logs (e.g., `"Arrow"`).
    pub short_name: &'static str,
    /// Long descriptive name for display purposes.
    pub long_name: &'static str,
    /// File extensions, without the leading dot, that select this format.
    pub extensions: &'static [&'static str],
    /// Whether tables in this format can be read.
    pub read: SupportStatus,
}

impl TableFormat {
    /// Creates a new format definition.
    #[must_use]
    pub const fn new(
        kind: FormatKind,
        short_name: &'static str,
        long_name: &'static str,
        extensions: &'static [&'static str],
        read: SupportStatus,
    ) -> Self {
        Self {
            kind,
            short_name,
            long_name,
            extensions,
            read,
        }
    }
}

impl FormatKind {
    /// Every decoder kind, in registry order.
    pub const ALL: [FormatKind; 6] = [
        FormatKind::ArrowFile,
        FormatKind::ArrowStream,
        FormatKind::Parquet,
        FormatKind::Csv,
        FormatKind::NdJson,
        FormatKind::Pickle,
    ];

    /// Returns the registry entry for this kind.
    #[must_use]
    pub const fn format(self) -> TableFormat {
        use SupportStatus::{NotSupported, Supported};

        match self {
            FormatKind::ArrowFile => TableFormat::new(
                self,
                "Arrow",
                "Arrow IPC File Format",
                &["arrow", "feather", "ipc"],
                Supported,
            ),
            FormatKind::ArrowStream => TableFormat::new(
                self,
                "ArrowStream",
                "Arrow IPC Streaming Format",
                &["arrows"],
                Supported,
            ),
            FormatKind::Parquet => TableFormat::new(
                self,
                "Parquet",
                "Apache Parquet",
                &["parquet", "pq"],
                Supported,
            ),
            FormatKind::Csv => TableFormat::new(
                self,
                "CSV",
                "Comma Separated Value (.csv)",
                &["csv"],
                Supported,
            ),
            FormatKind::NdJson => TableFormat::new(
                self,
                "NDJSON",
                "Newline Delimited JSON",
                &["ndjson", "jsonl", "json"],
                Supported,
            ),
            FormatKind::Pickle => TableFormat::new(
                self,
                "Pickle",
                "Python pickle (pandas DataFrame)",
                &["pkl", "pickle"],
                NotSupported,
            ),
        }
    }
}

/// Returns the complete registry of known table formats.
#[must_use]
pub fn get_formats() -> Vec<TableFormat> {
    FormatKind::ALL.iter().map(|k| k.format()).collect()
}

/// Returns the formats that can be read.
#[must_use]
pub fn get_supported_formats() -> Vec<TableFormat> {
    get_formats()
        .into_iter()
        .filter(|f| f.read.is_supported())
        .collect()
}

/// Finds a format by its short name (case-insensitive).
///
/// # Examples
///
/// ```
/// use geopoints_core::formats::find_format;
///
/// let format = find_format("parquet").expect("Parquet should exist");
/// assert_eq!(format.short_name, "Parquet");
///
/// assert!(find_format("shapefile").is_none());
/// ```
#[must_use]
pub fn find_format(name: &str) -> Option<TableFormat> {
    get_formats()
        .into_iter()
        .find(|f| f.short_name.eq_ignore_ascii_case(name))
}

/// Finds a format from the extension of a file name or path (case-insensitive).
#[must_use]
pub fn format_for_path(path: impl AsRef<Path>) -> Option<TableFormat> {
    let ext = path.as_ref().extension()?.to_str()?;
    get_formats()
        .into_iter()
        .find(|f| f.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Picks a format for a payload from its leading bytes.
///
/// Returns `None` for an empty payload, or for bytes that are neither a known binary
/// format nor UTF-8 text.
#[must_use]
pub fn sniff_format(bytes: &[u8]) -> Option<TableFormat> {
    const ARROW_MAGIC: &[u8] = b"ARROW1";
    const PARQUET_MAGIC: &[u8] = b"PAR1";
    const IPC_CONTINUATION: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF];
    const PICKLE_PROTO: u8 = 0x80;

    let kind = if bytes.is_empty() {
        return None;
    } else if bytes.starts_with(ARROW_MAGIC) {
        FormatKind::ArrowFile
    } else if bytes.starts_with(IPC_CONTINUATION) {
        FormatKind::ArrowStream
    } else if bytes.starts_with(PARQUET_MAGIC) {
        FormatKind::Parquet
    } else if bytes[0] == PICKLE_PROTO && bytes.get(1).is_some_and(|p| (2..=5).contains(p)) {
        FormatKind::Pickle
    } else {
        let text = std::str::from_utf8(&bytes[..bytes.len().min(4096)])
            .or_else(|e| std::str::from_utf8(&bytes[..e.valid_up_to()]))
            .ok()
            .filter(|t| !t.is_empty())?;
        if text.trim_start().starts_with('{') {
            FormatKind::NdJson
        } else {
            FormatKind::Csv
        }
    };
    Some(kind.format())
}
