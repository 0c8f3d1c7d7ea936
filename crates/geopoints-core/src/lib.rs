//! `geopoints-core` is the core library for the `geopoints` service, turning serialized
//! tables into geographic point sets.
//!
//! This crate includes:
//! - **Format Registry**: A static registry of the table formats the loader understands.
//! - **Table Loader**: Decoding of uploaded bytes and files into an in-memory [`SourceTable`],
//!   plus the [`TableSource`] trait used to inject a data source into the service.
//! - **Point Projector**: Schema validation, column projection and row limiting that turn a
//!   table into a [`PointSet`].
//!
//! The `fixtures` module holds the built-in city table served by the demo configuration.

pub mod error;
pub mod fixtures;
pub mod formats;
pub mod projection;
pub mod source;
pub mod table;
pub mod types;
pub mod utils;

pub use error::{ErrorKind, GeoPointsError, Result};
pub use projection::{PointSchema, Validation, project_points};
pub use source::{FileTableSource, InMemoryTableSource, TableSource};
pub use table::SourceTable;
pub use types::{CityPoint, Point, PointSet, VesselPoint};
