//! Source orders database access.

use crate::client::{classify, MySqlClient};
use crate::store::{SourceConnection, SourceStore};
use async_trait::async_trait;
use etl_core::{Error, Result, SourceDay, SourceOrder, SourceRestaurant, NULL_TOKEN};
use mysql_async::prelude::*;
use mysql_async::{from_row_opt, Conn, Row};
use telemetry::metrics;
use tracing::debug;

const CUSTOMER_IDS: &str = "SELECT DISTINCT customer_id FROM customers ORDER BY customer_id";

const RESTAURANTS: &str =
    "SELECT restaurant_id, restaurant_name, cuisine_type FROM restaurants ORDER BY restaurant_id";

const AVERAGE_RATING: &str =
    "SELECT AVG(rating) AS avg_rating FROM orders WHERE restaurant_id = ? AND rating IS NOT NULL";

const DAYS: &str = "SELECT day_id, day_name FROM days ORDER BY day_id";

const ORDERS: &str = r#"
SELECT o.order_id, o.customer_id, o.restaurant_id, o.day_id,
       o.cost_of_the_order, o.rating, o.food_preparation_time,
       o.delivery_time, d.day_name
FROM orders o
JOIN days d ON o.day_id = d.day_id
ORDER BY o.order_id
"#;

// Every non-key source column is nullable.
type RestaurantColumns = (i64, Option<String>, Option<String>);
type DayColumns = (i64, Option<String>);
type OrderColumns = (
    i64,
    i64,
    i64,
    i64,
    Option<f64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<String>,
);

/// A NULL name is kept as the `NULL` token so it loads back as NULL.
fn restaurant_from_columns(columns: RestaurantColumns) -> SourceRestaurant {
    let (restaurant_id, restaurant_name, cuisine_type) = columns;
    SourceRestaurant {
        restaurant_id,
        restaurant_name: restaurant_name.unwrap_or_else(|| NULL_TOKEN.to_string()),
        cuisine_type: cuisine_type.unwrap_or_else(|| NULL_TOKEN.to_string()),
    }
}

/// A NULL day name becomes empty, which no weekday matches.
fn day_from_columns(columns: DayColumns) -> SourceDay {
    let (day_id, day_name) = columns;
    SourceDay {
        day_id,
        day_name: day_name.unwrap_or_default(),
    }
}

/// NULL measures read as zero.
fn order_from_columns(columns: OrderColumns) -> SourceOrder {
    let (
        order_id,
        customer_id,
        restaurant_id,
        day_id,
        cost,
        rating,
        prep_time,
        delivery_time,
        day_name,
    ) = columns;
    SourceOrder {
        order_id,
        customer_id,
        restaurant_id,
        day_id,
        cost: cost.unwrap_or(0.0),
        rating,
        prep_time: prep_time.unwrap_or(0),
        delivery_time: delivery_time.unwrap_or(0),
        day_name: day_name.unwrap_or_default(),
    }
}

/// Converts raw rows, failing on a value that does not fit its column type.
fn decode_rows<T: FromRow>(rows: Vec<Row>, query: &'static str) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            from_row_opt::<T>(row).map_err(|e| {
                metrics().source_errors.inc();
                Error::extraction(format!("{}: cannot decode {:?}", query.trim(), e.0))
            })
        })
        .collect()
}

/// Source store backed by the MySQL orders database.
#[derive(Clone)]
pub struct MySqlSource {
    client: MySqlClient,
}

impl MySqlSource {
    pub fn new(client: MySqlClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &MySqlClient {
        &self.client
    }
}

#[async_trait]
impl SourceStore for MySqlSource {
    async fn connect(&self) -> Result<Box<dyn SourceConnection>> {
        let conn = self.client.conn().await.inspect_err(|_| {
            metrics().source_errors.inc();
        })?;
        Ok(Box::new(MySqlSourceConnection { conn }))
    }
}

/// A pooled connection to the orders database, returned to the pool on drop.
pub struct MySqlSourceConnection {
    conn: Conn,
}

fn extraction_error(query: &'static str) -> impl FnOnce(String) -> Error {
    move |msg| Error::extraction(format!("{}: {}", query.trim(), msg))
}

fn record<T>(result: std::result::Result<T, mysql_async::Error>, query: &'static str) -> Result<T> {
    metrics().source_queries.inc();
    result.map_err(|e| {
        metrics().source_errors.inc();
        classify(e, extraction_error(query))
    })
}

#[async_trait]
impl SourceConnection for MySqlSourceConnection {
    async fn customer_ids(&mut self) -> Result<Vec<i64>> {
        let rows: Vec<Row> = record(self.conn.query(CUSTOMER_IDS).await, CUSTOMER_IDS)?;
        let ids: Vec<i64> = decode_rows::<(i64,)>(rows, CUSTOMER_IDS)?
            .into_iter()
            .map(|(id,)| id)
            .collect();
        debug!(count = ids.len(), "Read customer ids");
        Ok(ids)
    }

    async fn restaurants(&mut self) -> Result<Vec<SourceRestaurant>> {
        let rows: Vec<Row> = record(self.conn.query(RESTAURANTS).await, RESTAURANTS)?;
        let restaurants: Vec<SourceRestaurant> = decode_rows::<RestaurantColumns>(rows, RESTAURANTS)?
            .into_iter()
            .map(restaurant_from_columns)
            .collect();
        debug!(count = restaurants.len(), "Read restaurants");
        Ok(restaurants)
    }

    async fn average_rating(&mut self, restaurant_id: i64) -> Result<Option<f64>> {
        let avg: Option<Option<f64>> = record(
            self.conn.exec_first(AVERAGE_RATING, (restaurant_id,)).await,
            AVERAGE_RATING,
        )?;
        Ok(avg.flatten())
    }

    async fn days(&mut self) -> Result<Vec<SourceDay>> {
        let rows: Vec<Row> = record(self.conn.query(DAYS).await, DAYS)?;
        Ok(decode_rows::<DayColumns>(rows, DAYS)?
            .into_iter()
            .map(day_from_columns)
            .collect())
    }

    async fn orders(&mut self) -> Result<Vec<SourceOrder>> {
        let rows: Vec<Row> = record(self.conn.query(ORDERS).await, ORDERS)?;
        let orders: Vec<SourceOrder> = decode_rows::<OrderColumns>(rows, ORDERS)?
            .into_iter()
            .map(order_from_columns)
            .collect();
        debug!(count = orders.len(), "Read orders");
        Ok(orders)
    }
}
