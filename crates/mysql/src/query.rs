//! Query functions for reading the warehouse back (used in tests and admin).

use crate::client::{classify, MySqlClient};
use etl_core::{Error, Result, Table};
use mysql_async::prelude::*;

/// Read-back failures that are not connection losses.
fn read_back_error(target: &'static str) -> impl FnOnce(String) -> Error {
    move |msg| Error::extraction(format!("reading {}: {}", target, msg))
}

/// Count rows in a warehouse table.
pub async fn count_rows(client: &MySqlClient, table: Table) -> Result<u64> {
    let mut conn = client.conn().await?;
    let count: Option<u64> = conn
        .query_first(format!("SELECT COUNT(*) FROM {}", table.name()))
        .await
        .map_err(|e| classify(e, read_back_error(table.name())))?;
    Ok(count.unwrap_or(0))
}

/// Fetch every row of a table as text, ordered by its key.
pub async fn fetch_rows(client: &MySqlClient, table: Table) -> Result<Vec<Vec<Option<String>>>> {
    let mut conn = client.conn().await?;
    let rows: Vec<mysql_async::Row> = conn
        .query(format!(
            "SELECT * FROM {} ORDER BY {}",
            table.name(),
            table.key_column()
        ))
        .await
        .map_err(|e| classify(e, read_back_error(table.name())))?;

    Ok(rows
        .into_iter()
        .map(|row| {
            (0..row.len())
                .map(|i| row.get_opt::<Option<String>, usize>(i).and_then(|v| v.ok()).flatten())
                .collect()
        })
        .collect())
}

/// Names of the tables present in the connected database.
pub async fn list_tables(client: &MySqlClient) -> Result<Vec<String>> {
    let mut conn = client.conn().await?;
    conn.query("SHOW TABLES")
        .await
        .map_err(|e| classify(e, read_back_error("SHOW TABLES")))
}
