//! Pipeline configuration.
//!
//! One explicit value object built by the binary and handed to the
//! orchestrator; nothing reads configuration from globals.

use chrono::NaiveDate;
use etl_core::{Error, Result, StorageLayout};
use mysql_store::MySqlConfig;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Map-only job settings shared by every generator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JobConfig {
    /// Parallel map tasks per generator
    #[serde(default = "default_map_tasks")]
    #[validate(range(min = 1, max = 1024))]
    pub map_tasks: usize,
    /// Seed for reproducible synthesis; each task uses `seed + task index`
    #[serde(default)]
    pub seed: Option<u64>,
    /// Remove existing output directories before a run
    #[serde(default = "default_overwrite_output")]
    pub overwrite_output: bool,
    /// Overrides "today" for date ranges and synthesized dates
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

fn default_map_tasks() -> usize {
    4
}

fn default_overwrite_output() -> bool {
    true
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            map_tasks: default_map_tasks(),
            seed: None,
            overwrite_output: default_overwrite_output(),
            reference_date: None,
        }
    }
}

impl JobConfig {
    /// The configured reference date, or the local calendar date.
    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Warehouse export settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExportConfig {
    /// Rows committed per transaction
    #[serde(default = "default_rows_per_transaction")]
    #[validate(range(min = 1))]
    pub rows_per_transaction: usize,
}

fn default_rows_per_transaction() -> usize {
    500
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            rows_per_transaction: default_rows_per_transaction(),
        }
    }
}

/// Where partition files live.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StorageConfig {
    #[serde(default = "default_base_path")]
    #[validate(length(min = 1))]
    pub base_path: String,
}

fn default_base_path() -> String {
    "/warehouse/fooddelivery".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
        }
    }
}

impl StorageConfig {
    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.base_path)
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EtlConfig {
    #[serde(default = "MySqlConfig::source_default")]
    #[validate(nested)]
    pub source: MySqlConfig,

    #[serde(default = "MySqlConfig::warehouse_default")]
    #[validate(nested)]
    pub warehouse: MySqlConfig,

    #[serde(default)]
    #[validate(nested)]
    pub storage: StorageConfig,

    #[serde(default)]
    #[validate(nested)]
    pub job: JobConfig,

    #[serde(default)]
    #[validate(nested)]
    pub export: ExportConfig,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            source: MySqlConfig::source_default(),
            warehouse: MySqlConfig::warehouse_default(),
            storage: StorageConfig::default(),
            job: JobConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl EtlConfig {
    /// Validates every section, reporting failures as configuration errors.
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| Error::configuration(format!("invalid configuration: {}", e)))
    }
}
