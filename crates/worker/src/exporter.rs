//! Warehouse exporter.
//!
//! Creates every table in foreign-key-safe order, then loads each table's
//! partition files in name order. Rows keep their file line order and are
//! committed in chunks of `rows_per_transaction`; a failed row rolls back
//! only its open chunk, so earlier chunks stay loaded.

use etl_core::{Error, RecordCodec, Result, StorageLayout, Table};
use mysql_store::WarehouseStore;
use std::path::Path;
use std::sync::Arc;
use telemetry::metrics;
use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::job::list_partitions;

/// Outcome of an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Rows loaded per table, in load order.
    pub loaded: Vec<(Table, u64)>,
    /// Tables with no partition files.
    pub skipped: Vec<Table>,
}

impl ExportReport {
    pub fn rows_for(&self, table: Table) -> Option<u64> {
        self.loaded
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, rows)| *rows)
    }

    pub fn total_rows(&self) -> u64 {
        self.loaded.iter().map(|(_, rows)| rows).sum()
    }
}

/// Loads generated partitions into the warehouse.
#[derive(Clone)]
pub struct WarehouseExporter {
    warehouse: Arc<dyn WarehouseStore>,
    layout: StorageLayout,
    config: ExportConfig,
}

impl WarehouseExporter {
    pub fn new(
        warehouse: Arc<dyn WarehouseStore>,
        layout: StorageLayout,
        config: ExportConfig,
    ) -> Self {
        Self {
            warehouse,
            layout,
            config,
        }
    }

    /// Creates all seven tables, dimensions first. Safe to repeat.
    pub async fn create_schema(&self) -> Result<()> {
        for table in Table::ALL {
            self.warehouse.create_table(table).await?;
        }
        info!(tables = Table::ALL.len(), "Warehouse schema ready");
        Ok(())
    }

    /// Creates the schema and loads every table.
    pub async fn export(&self) -> Result<ExportReport> {
        self.create_schema().await?;

        let mut report = ExportReport::default();
        for table in Table::ALL {
            match self.load_table(table).await? {
                Some(rows) => report.loaded.push((table, rows)),
                None => report.skipped.push(table),
            }
        }

        info!(
            rows = report.total_rows(),
            skipped = report.skipped.len(),
            "Export complete"
        );
        Ok(report)
    }

    /// Loads one table. Returns `None` when it has no partition files.
    pub async fn load_table(&self, table: Table) -> Result<Option<u64>> {
        let dir = self.layout.table_dir(table);
        let files = list_partitions(&dir).await?;
        if files.is_empty() {
            metrics().tables_skipped.inc();
            warn!(table = %table, path = %dir.display(), "No partition files, skipping table");
            return Ok(None);
        }

        let mut rows = 0u64;
        for file in &files {
            rows += self.load_file(table, file).await?;
        }

        info!(table = %table, rows = rows, files = files.len(), "Loaded table");
        Ok(Some(rows))
    }

    async fn load_file(&self, table: Table, file: &Path) -> Result<u64> {
        let contents = tokio::fs::read_to_string(file).await?;
        let expected = table.column_count();
        let chunk_size = self.config.rows_per_transaction.max(1);

        let mut chunk = Vec::with_capacity(chunk_size);
        let mut loaded = 0u64;
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let fields = RecordCodec::decode_nullable(line);
            if fields.len() != expected {
                metrics().load_errors.inc();
                return Err(Error::load(
                    table.name(),
                    format!(
                        "{}:{}: expected {} fields, found {}",
                        file.display(),
                        line_no + 1,
                        expected,
                        fields.len()
                    ),
                ));
            }

            chunk.push(fields);
            if chunk.len() == chunk_size {
                loaded += self.warehouse.insert_rows(table, &chunk).await?;
                chunk.clear();
            }
        }

        if !chunk.is_empty() {
            loaded += self.warehouse.insert_rows(table, &chunk).await?;
        }

        debug!(table = %table, file = %file.display(), rows = loaded, "Loaded partition");
        Ok(loaded)
    }
}
