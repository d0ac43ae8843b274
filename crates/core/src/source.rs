//! Rows read from the operational orders database.

use serde::{Deserialize, Serialize};

/// A restaurant as stored in the `restaurants` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRestaurant {
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub cuisine_type: String,
}

/// An entry of the `days` lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDay {
    pub day_id: i64,
    pub day_name: String,
}

/// An order joined with its day name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOrder {
    pub order_id: i64,
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub day_id: i64,
    pub cost: f64,
    /// `None` when the customer did not rate the order.
    pub rating: Option<i64>,
    pub prep_time: i64,
    pub delivery_time: i64,
    pub day_name: String,
}
