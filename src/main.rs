//! Star-schema warehouse builder for the food-delivery order database.
//!
//! Generates the six dimension tables and the order fact table as
//! partition files, then loads them into the MySQL warehouse:
//! - create-dimensions / create-fact / process-all generate partitions
//! - export-to-mysql creates the schema and loads partitions
//! - run-complete-etl does both
//! - generate-schema prints the warehouse tables

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use etl_core::Table;
use mysql_store::{MySqlClient, MySqlConfig, MySqlSource, MySqlWarehouse};
use telemetry::{health, init_tracing_from_env, log_snapshot, metrics};
use worker::{Command, EtlConfig, PipelineOrchestrator};

#[derive(Parser)]
#[command(
    name = "star-etl",
    version,
    about = "Builds the food-delivery star-schema warehouse"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Configuration file (defaults to config/default.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Generate all six dimension tables
    CreateDimensions,
    /// Generate the order fact table
    CreateFact,
    /// Generate dimensions, then the fact table
    ProcessAll,
    /// Create the warehouse schema and load generated partitions
    ExportToMysql,
    /// Generate everything and load it into the warehouse
    RunCompleteEtl,
    /// Print the warehouse tables, columns, and foreign keys
    GenerateSchema,
}

impl Commands {
    fn pipeline(self) -> Option<Command> {
        match self {
            Self::CreateDimensions => Some(Command::Dimensions),
            Self::CreateFact => Some(Command::Fact),
            Self::ProcessAll => Some(Command::Full),
            Self::ExportToMysql => Some(Command::Export),
            Self::RunCompleteEtl => Some(Command::Complete),
            Self::GenerateSchema => None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            // Unknown or missing commands exit 1, not clap's usage code.
            _ => {
                let _ = e.print();
                return ExitCode::from(1);
            }
        },
    };

    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env(&cli.log_level);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let Some(command) = cli.command.pipeline() else {
        print_schema();
        return Ok(ExitCode::SUCCESS);
    };

    info!("Starting star-etl v{} ({})", env!("CARGO_PKG_VERSION"), command);

    let config = load_config(cli.config.as_deref())?;
    config.check().context("Invalid configuration")?;

    let source = MySqlClient::new(config.source.clone()).context("Failed to create source client")?;
    let warehouse =
        MySqlClient::new(config.warehouse.clone()).context("Failed to create warehouse client")?;

    check_health(command, &source, &warehouse).await;

    let orchestrator = PipelineOrchestrator::new(
        &config,
        Arc::new(MySqlSource::new(source.clone())),
        Arc::new(MySqlWarehouse::new(warehouse.clone())),
    );

    let report = orchestrator.run(command).await;
    log_snapshot(&metrics().snapshot());

    if let Some(failed) = &report.failure {
        eprintln!(
            "{} failed at step {} ({}): {}",
            command, failed.position, failed.name, failed.error
        );
    } else {
        println!(
            "{} completed {} step(s) in {:.1}s",
            command,
            report.completed.len(),
            report.elapsed.as_secs_f64()
        );
    }

    drop(orchestrator);
    for client in [source, warehouse] {
        if let Err(e) = client.disconnect().await {
            warn!("Failed to close connection pool: {}", e);
        }
    }

    Ok(ExitCode::from(report.exit_code() as u8))
}

/// Load configuration from files and environment.
fn load_config(path: Option<&Path>) -> Result<EtlConfig> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config/default")
            .required(false)
            .format(config::FileFormat::Toml),
    };

    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&EtlConfig::default())?)
        .add_source(file)
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("STAR_ETL")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: EtlConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Flat overrides for the connection settings
    apply_connection_env(&mut config.source, "STAR_ETL_SOURCE");
    apply_connection_env(&mut config.warehouse, "STAR_ETL_WAREHOUSE");
    if let Ok(base_path) = std::env::var("STAR_ETL_STORAGE_BASE_PATH") {
        config.storage.base_path = base_path;
    }

    Ok(config)
}

fn apply_connection_env(config: &mut MySqlConfig, prefix: &str) {
    if let Ok(url) = std::env::var(format!("{}_URL", prefix)) {
        config.url = url;
    }
    if let Ok(database) = std::env::var(format!("{}_DATABASE", prefix)) {
        config.database = database;
    }
    if let Ok(username) = std::env::var(format!("{}_USERNAME", prefix)) {
        config.username = Some(username);
    }
    if let Ok(password) = std::env::var(format!("{}_PASSWORD", prefix)) {
        config.password = Some(password);
    }
}

/// Check the stores a command needs and record the result.
async fn check_health(command: Command, source: &MySqlClient, warehouse: &MySqlClient) {
    if command.needs_source() {
        if mysql_store::health::check_connection(source).await {
            health().source.set_healthy();
            info!("Source database: healthy");
        } else {
            health().source.set_unhealthy("Connection failed");
            error!("Source database: unhealthy");
        }
    }

    if command.needs_warehouse() {
        if mysql_store::health::check_connection(warehouse).await {
            health().warehouse.set_healthy();
            info!("Warehouse: healthy");
        } else {
            health().warehouse.set_unhealthy("Connection failed");
            error!("Warehouse: unhealthy");
        }
    }

    // A down store fails its first step with a connection error.
    let report = health().report();
    if !report.status.is_healthy() {
        warn!(
            status = ?report.status,
            unhealthy = ?report.unhealthy(),
            "Continuing with unhealthy stores"
        );
    }
}

fn print_schema() {
    for table in Table::ALL {
        println!("{}", table);
        for column in table.columns() {
            if *column == table.key_column() {
                println!("  {} (primary key)", column);
            } else {
                println!("  {}", column);
            }
        }
        for fk in table.foreign_keys() {
            println!(
                "  foreign key {} -> {}({})",
                fk.column,
                fk.references,
                fk.references.key_column()
            );
        }
        println!();
    }
}
