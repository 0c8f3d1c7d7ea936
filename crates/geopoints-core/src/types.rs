//! Data types for point responses and table descriptions.
//!
//! This module defines the point records returned over HTTP and the structures used to
//! describe a loaded table.

use serde::Serialize;

/// A vessel position keyed by its MMSI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VesselPoint {
    /// Longitude in degrees
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
    /// Maritime Mobile Service Identity
    #[serde(rename = "MMSI")]
    pub mmsi: i64,
}

/// A named city location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityPoint {
    /// Longitude in degrees
    pub longitude: f64,
    /// Latitude in degrees
    pub latitude: f64,
    /// City name
    pub name: String,
}

/// A single geo-located record.
///
/// Serialized without a tag, so each variant renders as its own flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Point {
    /// A vessel position
    Vessel(VesselPoint),
    /// A city location
    City(CityPoint),
}

/// Response envelope: points in source-table row order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointSet {
    /// The projected points
    pub points: Vec<Point>,
}

impl PointSet {
    /// An empty point set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if there are no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Information about a loaded table.
#[derive(Debug, Clone)]
pub struct TableInfo {
    /// Where the table came from
    pub source: String,
    /// Format short name
    pub format: String,
    /// Format long name
    pub format_long_name: String,
    /// Total row count
    pub rows: usize,
    /// Schema fields
    pub fields: Vec<FieldInfo>,
}

/// Information about a field/column.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Field name
    pub name: String,
    /// Data type
    pub data_type: String,
    /// Whether the field is nullable
    pub nullable: bool,
}
