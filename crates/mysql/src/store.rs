//! Store seams used by the generators and the exporter.
//!
//! The MySQL types implement these for production; tests substitute
//! in-memory stores.

use async_trait::async_trait;
use etl_core::{Result, SourceDay, SourceOrder, SourceRestaurant, Table};

/// Opens connections to the source orders database.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Opens a connection owned by a single map task. Dropping the
    /// connection releases it on every exit path.
    async fn connect(&self) -> Result<Box<dyn SourceConnection>>;
}

/// One open connection to the source orders database.
#[async_trait]
pub trait SourceConnection: Send {
    /// Distinct customer ids, ascending.
    async fn customer_ids(&mut self) -> Result<Vec<i64>>;

    /// Every restaurant with its name and cuisine.
    async fn restaurants(&mut self) -> Result<Vec<SourceRestaurant>>;

    /// Mean rating of a restaurant's rated orders, `None` when no order
    /// carries a rating.
    async fn average_rating(&mut self, restaurant_id: i64) -> Result<Option<f64>>;

    /// The weekday lookup table.
    async fn days(&mut self) -> Result<Vec<SourceDay>>;

    /// Every order joined with its weekday name.
    async fn orders(&mut self) -> Result<Vec<SourceOrder>>;
}

/// The warehouse the star schema is loaded into.
#[async_trait]
pub trait WarehouseStore: Send + Sync {
    /// Creates the table if it does not already exist.
    async fn create_table(&self, table: Table) -> Result<()>;

    /// Inserts rows positionally, in order, inside one transaction.
    /// `None` fields become SQL NULL. Returns the rows inserted.
    async fn insert_rows(&self, table: Table, rows: &[Vec<Option<String>>]) -> Result<u64>;
}
