//! In-memory stores for testing.
//!
//! These implement the same `SourceStore` and `WarehouseStore` traits as
//! the MySQL stores, so the orchestrator, job runner, and exporter run
//! their production code paths without a database.

use async_trait::async_trait;
use etl_core::{Error, Result, SourceDay, SourceOrder, SourceRestaurant, Table};
use mysql_store::{SourceConnection, SourceStore, WarehouseStore};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::fixtures::SourceFixture;

/// A source query that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceQuery {
    CustomerIds,
    Restaurants,
    AverageRating,
    Days,
    Orders,
}

#[derive(Default)]
struct SourceState {
    connects: usize,
    open: usize,
    fail_connect: bool,
    failing: HashSet<SourceQuery>,
}

/// Mock source serving fixture rows.
#[derive(Clone)]
pub struct MockSource {
    data: Arc<SourceFixture>,
    state: Arc<Mutex<SourceState>>,
}

impl MockSource {
    pub fn new(data: SourceFixture) -> Self {
        Self {
            data: Arc::new(data),
            state: Arc::new(Mutex::new(SourceState::default())),
        }
    }

    /// Number of connections opened so far.
    pub fn connect_count(&self) -> usize {
        self.state.lock().connects
    }

    /// Connections not yet dropped.
    pub fn open_connections(&self) -> usize {
        self.state.lock().open
    }

    /// Refuse new connections.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().fail_connect = unreachable;
    }

    /// Make one query fail after connecting.
    pub fn fail_query(&self, query: SourceQuery) {
        self.state.lock().failing.insert(query);
    }
}

#[async_trait]
impl SourceStore for MockSource {
    async fn connect(&self) -> Result<Box<dyn SourceConnection>> {
        let mut state = self.state.lock();
        if state.fail_connect {
            return Err(Error::connection("mock source unreachable"));
        }
        state.connects += 1;
        state.open += 1;
        Ok(Box::new(MockConnection {
            data: self.data.clone(),
            state: self.state.clone(),
        }))
    }
}

struct MockConnection {
    data: Arc<SourceFixture>,
    state: Arc<Mutex<SourceState>>,
}

impl MockConnection {
    fn check(&self, query: SourceQuery) -> Result<()> {
        if self.state.lock().failing.contains(&query) {
            return Err(Error::extraction(format!("mock {:?} query failed", query)));
        }
        Ok(())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.state.lock().open -= 1;
    }
}

#[async_trait]
impl SourceConnection for MockConnection {
    async fn customer_ids(&mut self) -> Result<Vec<i64>> {
        self.check(SourceQuery::CustomerIds)?;
        Ok(self.data.customer_ids.clone())
    }

    async fn restaurants(&mut self) -> Result<Vec<SourceRestaurant>> {
        self.check(SourceQuery::Restaurants)?;
        Ok(self.data.restaurants.clone())
    }

    async fn average_rating(&mut self, restaurant_id: i64) -> Result<Option<f64>> {
        self.check(SourceQuery::AverageRating)?;
        Ok(self
            .data
            .ratings
            .get(&restaurant_id)
            .filter(|r| !r.is_empty())
            .map(|r| r.iter().sum::<i64>() as f64 / r.len() as f64))
    }

    async fn days(&mut self) -> Result<Vec<SourceDay>> {
        self.check(SourceQuery::Days)?;
        Ok(self.data.days.clone())
    }

    async fn orders(&mut self) -> Result<Vec<SourceOrder>> {
        self.check(SourceQuery::Orders)?;
        Ok(self.data.orders.clone())
    }
}

type Row = Vec<Option<String>>;

#[derive(Default)]
struct WarehouseState {
    created: Vec<Table>,
    tables: BTreeMap<&'static str, Vec<Row>>,
    commits: usize,
    should_fail: bool,
}

impl WarehouseState {
    fn has_key(&self, table: Table, key: &str) -> bool {
        self.tables
            .get(table.name())
            .map(|rows| rows.iter().any(|r| r[0].as_deref() == Some(key)))
            .unwrap_or(false)
    }

    fn check_row(&self, table: Table, row: &Row, staged: &[Row]) -> Result<()> {
        if row.len() != table.column_count() {
            return Err(Error::load(
                table.name(),
                format!("column count doesn't match: {}", row.len()),
            ));
        }

        let key = row[0]
            .as_deref()
            .ok_or_else(|| Error::load(table.name(), "primary key cannot be NULL"))?;
        if self.has_key(table, key) || staged.iter().any(|r| r[0].as_deref() == Some(key)) {
            return Err(Error::load(table.name(), format!("duplicate entry '{}'", key)));
        }

        for fk in table.foreign_keys() {
            let Some(index) = table.column_index(fk.column) else {
                continue;
            };
            if let Some(value) = row[index].as_deref() {
                if !self.has_key(fk.references, value) {
                    return Err(Error::load(
                        table.name(),
                        format!(
                            "foreign key constraint fails: {} = {} not in {}",
                            fk.column, value, fk.references
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Mock warehouse enforcing primary and foreign keys.
///
/// A batch is all-or-nothing, like a rolled-back transaction.
#[derive(Clone, Default)]
pub struct MockWarehouse {
    state: Arc<Mutex<WarehouseState>>,
}

impl MockWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables in the order they were created (repeats included).
    pub fn created(&self) -> Vec<Table> {
        self.state.lock().created.clone()
    }

    /// Distinct tables that exist.
    pub fn table_count(&self) -> usize {
        self.state.lock().tables.len()
    }

    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.state
            .lock()
            .tables
            .get(table.name())
            .cloned()
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: Table) -> usize {
        self.rows(table).len()
    }

    pub fn commits(&self) -> usize {
        self.state.lock().commits
    }

    /// Set failure mode for testing error handling.
    pub fn set_should_fail(&self, fail: bool) {
        self.state.lock().should_fail = fail;
    }
}

#[async_trait]
impl WarehouseStore for MockWarehouse {
    async fn create_table(&self, table: Table) -> Result<()> {
        let mut state = self.state.lock();
        if state.should_fail {
            return Err(Error::connection("mock warehouse unreachable"));
        }
        for fk in table.foreign_keys() {
            if !state.tables.contains_key(fk.references.name()) {
                return Err(Error::load(
                    table.name(),
                    format!("referenced table {} does not exist", fk.references),
                ));
            }
        }
        state.created.push(table);
        state.tables.entry(table.name()).or_default();
        Ok(())
    }

    async fn insert_rows(&self, table: Table, rows: &[Vec<Option<String>>]) -> Result<u64> {
        let mut state = self.state.lock();
        if state.should_fail {
            return Err(Error::connection("mock warehouse unreachable"));
        }
        if !state.tables.contains_key(table.name()) {
            return Err(Error::load(table.name(), "table doesn't exist"));
        }

        let mut staged: Vec<Row> = Vec::with_capacity(rows.len());
        for row in rows {
            state.check_row(table, row, &staged)?;
            staged.push(row.clone());
        }

        let count = staged.len() as u64;
        state.tables.entry(table.name()).or_default().extend(staged);
        state.commits += 1;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Row {
        values
            .iter()
            .map(|v| if *v == "NULL" { None } else { Some(v.to_string()) })
            .collect()
    }

    #[tokio::test]
    async fn test_mock_warehouse_rejects_duplicate_keys_atomically() {
        let warehouse = MockWarehouse::new();
        warehouse.create_table(Table::Customer).await.unwrap();

        let batch = vec![
            row(&["1", "Customer 1", "Basic", "2023-01-01"]),
            row(&["1", "Customer 1", "Basic", "2023-01-01"]),
        ];
        assert!(warehouse.insert_rows(Table::Customer, &batch).await.is_err());
        assert_eq!(warehouse.row_count(Table::Customer), 0);
    }

    #[tokio::test]
    async fn test_mock_warehouse_enforces_foreign_keys() {
        let warehouse = MockWarehouse::new();
        assert!(warehouse.create_table(Table::FactOrders).await.is_err());

        for table in Table::ALL {
            warehouse.create_table(table).await.unwrap();
        }
        let fact = row(&[
            "1", "7", "2", "3", "2", "4", "7", "2024-03-06", "13:05:09", "12.50", "NULL", "10",
            "20", "30",
        ]);
        let result = warehouse.insert_rows(Table::FactOrders, &[fact]).await;
        assert!(matches!(result, Err(Error::Load { .. })));
    }

    #[tokio::test]
    async fn test_mock_source_failure_modes() {
        let source = MockSource::new(SourceFixture::default());
        source.fail_query(SourceQuery::Days);

        let mut conn = source.connect().await.unwrap();
        assert!(conn.customer_ids().await.is_ok());
        assert!(matches!(conn.days().await, Err(Error::Extraction(_))));
        assert_eq!(source.open_connections(), 1);
        drop(conn);
        assert_eq!(source.open_connections(), 0);

        source.set_unreachable(true);
        assert!(matches!(source.connect().await, Err(Error::Connection(_))));
    }
}
