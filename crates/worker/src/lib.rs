//! Generators, exporter, and orchestrator for the star-schema ETL.
//!
//! - Job runner (partitioned map-only execution)
//! - Dimension generators (customer, restaurant, date, location, time slot, delivery person)
//! - Fact generator (order facts with resolved dimension keys)
//! - Warehouse exporter (schema creation and chunked loading)
//! - Orchestrator (command plans, first-failure halting)

pub mod config;
pub mod exporter;
pub mod fact;
pub mod generators;
pub mod job;
pub mod orchestrator;


pub use config::*;
pub use exporter::{ExportReport, WarehouseExporter};
pub use fact::FactGenerator;
pub use generators::*;
pub use job::{Generator, JobReport, JobRunner, MapContext, SourceAccess};
pub use orchestrator::*;
