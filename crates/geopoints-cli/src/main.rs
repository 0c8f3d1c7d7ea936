//! Command-line interface for `geopoints`, a small HTTP service that serves geographic
//! points from tabular data.
//!
//! # Architecture
//!
//! The CLI is built using [`clap`] for argument parsing and [`tracing`] for structured logging.
//! It parses arguments, configures logging and delegates to [`geopoints_server`] for serving
//! and to [`geopoints_core`] for table inspection.
//!
//! # Available Commands
//!
//! - `serve` - Run the point API
//! - `inspect` - Display a table's format, row count and fields, and check it against a schema
//! - `formats` - List the table formats the loader understands

mod display;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing::{Level, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use geopoints_core::fixtures::builtin_cities;
use geopoints_core::formats::{get_formats, get_supported_formats};
use geopoints_core::utils::describe_table;
use geopoints_core::{FileTableSource, InMemoryTableSource, PointSchema, TableSource, Validation};
use geopoints_server::config::{DEFAULT_CORS_ORIGINS, DEFAULT_DATA_PATH, DEFAULT_POINTS_ROW_LIMIT};
use geopoints_server::{FailurePolicy, ServiceConfig};

#[derive(Parser)]
#[command(
    name = "geopoints",
    version,
    about = "Serve geographic points from tabular data over HTTP"
)]
/// Command-line arguments and options for the `geopoints` CLI.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the `geopoints` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Runs the HTTP point service.
    Serve(ServeArgs),

    /// Displays information about a table file and checks it against a point schema.
    Inspect {
        /// Path to the table file.
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// The point schema the table must satisfy (vessel or city).
        #[arg(long, default_value = "vessel")]
        schema: PointSchema,
    },

    /// Lists the table formats and whether they can be read.
    Formats {
        /// Only list the formats that can be read.
        #[arg(long)]
        supported: bool,
    },
}

/// Options for the `serve` subcommand.
#[derive(Args)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "GEOPOINTS_BIND", default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Table file served by `GET /api/points`.
    #[arg(long, env = "GEOPOINTS_DATA", default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,

    /// Point schema (vessel or city).
    #[arg(long, env = "GEOPOINTS_SCHEMA", default_value = "vessel")]
    schema: PointSchema,

    /// Maximum rows returned by `GET /api/points`.
    #[arg(long, env = "GEOPOINTS_ROW_LIMIT", default_value_t = DEFAULT_POINTS_ROW_LIMIT)]
    row_limit: usize,

    /// Return every row from `GET /api/points`.
    #[arg(long, conflicts_with = "row_limit")]
    no_row_limit: bool,

    /// Maximum rows returned for an upload (default: unlimited).
    #[arg(long, env = "GEOPOINTS_UPLOAD_ROW_LIMIT")]
    upload_row_limit: Option<usize>,

    /// Failure policy for `GET /api/points` (soft or loud).
    #[arg(long, env = "GEOPOINTS_POINTS_ON_ERROR", default_value = "soft")]
    points_on_error: FailurePolicy,

    /// Failure policy for uploads (soft or loud).
    #[arg(long, env = "GEOPOINTS_UPLOAD_ON_ERROR", default_value = "loud")]
    upload_on_error: FailurePolicy,

    /// Allowed CORS origin; repeat for several, `*` allows any.
    #[arg(
        long = "cors-origin",
        env = "GEOPOINTS_CORS_ORIGINS",
        value_delimiter = ',',
        default_values_t = DEFAULT_CORS_ORIGINS.map(String::from)
    )]
    cors_origins: Vec<String>,

    /// Reject uploads larger than this many bytes (default: unbounded).
    #[arg(long, env = "GEOPOINTS_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// Serve the built-in London/Paris/Berlin table with the city schema.
    #[arg(long)]
    builtin_cities: bool,
}

/// Entry point for the `geopoints` command-line interface.
///
/// # Errors
///
/// Returns an error if command execution fails or if the logging system cannot be initialized.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args).await?,
        Commands::Inspect { input, schema } => {
            info!("Inspecting {}", input.display());
            handle_inspect(input, schema).await?;
        },
        Commands::Formats { supported } => handle_formats(supported),
    }

    Ok(())
}

async fn handle_serve(args: ServeArgs) -> Result<()> {
    let (source, schema) = build_source(&args)?;
    let config = build_config(&args, schema);
    geopoints_server::serve(source, config).await
}

fn build_source(args: &ServeArgs) -> Result<(Arc<dyn TableSource>, PointSchema)> {
    if args.builtin_cities {
        info!("Serving the built-in city table; --data and --schema are ignored");
        let source = InMemoryTableSource::new("builtin cities", builtin_cities()?);
        Ok((Arc::new(source), PointSchema::City))
    } else {
        Ok((Arc::new(FileTableSource::new(&args.data)), args.schema))
    }
}

fn build_config(args: &ServeArgs, schema: PointSchema) -> ServiceConfig {
    let row_limit = (!args.no_row_limit).then_some(args.row_limit);

    ServiceConfig::new()
        .with_bind(args.bind)
        .with_schema(schema)
        .with_points_row_limit(row_limit)
        .with_upload_row_limit(args.upload_row_limit)
        .with_points_policy(args.points_on_error)
        .with_upload_policy(args.upload_on_error)
        .with_cors_origins(args.cors_origins.iter().cloned())
        .with_max_upload_bytes(args.max_upload_bytes)
}

async fn handle_inspect(input: PathBuf, schema: PointSchema) -> Result<()> {
    let source = FileTableSource::new(&input);
    let (format, table) = source.read().await?;

    let info = describe_table(&input.display().to_string(), &format, &table);
    display::display_table_info(&info);

    match schema.validate(&table.schema()) {
        Validation::Valid => {
            println!("\nSchema '{schema}': OK");
            Ok(())
        },
        Validation::MissingColumns(missing) => Err(anyhow!(
            "Table does not satisfy the '{schema}' schema; missing columns: {}",
            missing.join(", ")
        )),
    }
}

fn handle_formats(supported: bool) {
    let formats = if supported {
        get_supported_formats()
    } else {
        get_formats()
    };
    display::display_formats(&formats);
}
