//! Warehouse loading.

use crate::client::{classify, MySqlClient};
use crate::schema::{ddl_for, insert_sql};
use crate::store::WarehouseStore;
use async_trait::async_trait;
use etl_core::{Error, Result, Table};
use mysql_async::prelude::*;
use mysql_async::{Params, TxOpts, Value};
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, info};

/// Warehouse store backed by MySQL.
#[derive(Clone)]
pub struct MySqlWarehouse {
    client: MySqlClient,
}

impl MySqlWarehouse {
    pub fn new(client: MySqlClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &MySqlClient {
        &self.client
    }
}

fn to_params(row: &[Option<String>]) -> Params {
    Params::Positional(
        row.iter()
            .map(|field| match field {
                Some(v) => Value::Bytes(v.as_bytes().to_vec()),
                None => Value::NULL,
            })
            .collect(),
    )
}

#[async_trait]
impl WarehouseStore for MySqlWarehouse {
    async fn create_table(&self, table: Table) -> Result<()> {
        let mut conn = self.client.conn().await?;
        conn.query_drop(ddl_for(table)).await.map_err(|e| {
            classify(e, |msg| {
                Error::load(table.name(), format!("failed to create table: {}", msg))
            })
        })?;

        metrics().tables_created.inc();
        info!(table = %table, "Ensured warehouse table");
        Ok(())
    }

    async fn insert_rows(&self, table: Table, rows: &[Vec<Option<String>>]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let start = Instant::now();
        let sql = insert_sql(table);
        let load_err = |msg: String| Error::load(table.name(), msg);

        let mut conn = self.client.conn().await?;
        let mut tx = conn
            .start_transaction(TxOpts::default())
            .await
            .map_err(|e| classify(e, load_err))?;

        for (i, row) in rows.iter().enumerate() {
            if let Err(e) = tx.exec_drop(sql.as_str(), to_params(row)).await {
                metrics().load_errors.inc();
                let _ = tx.rollback().await;
                return Err(classify(e, |msg| {
                    Error::load(table.name(), format!("row {} of batch: {}", i + 1, msg))
                }));
            }
        }

        tx.commit().await.map_err(|e| classify(e, load_err))?;

        let inserted = rows.len() as u64;
        metrics().rows_loaded.inc_by(inserted);
        metrics()
            .insert_latency_ms
            .observe(start.elapsed().as_millis() as u64);
        debug!(table = %table, rows = inserted, "Committed batch");
        Ok(inserted)
    }
}
