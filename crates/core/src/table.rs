//! Warehouse table catalogue.
//!
//! The fact table references every dimension, so dimensions are always
//! created and loaded first. `Table::ALL` is that order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A warehouse table produced by one generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Customer,
    Restaurant,
    Date,
    Location,
    TimeSlot,
    DeliveryPerson,
    FactOrders,
}

/// A foreign key from a fact column to a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references: Table,
}

impl Table {
    /// Every table in foreign-key-safe creation order.
    pub const ALL: [Table; 7] = [
        Table::Customer,
        Table::Restaurant,
        Table::Date,
        Table::Location,
        Table::TimeSlot,
        Table::DeliveryPerson,
        Table::FactOrders,
    ];

    /// Warehouse table name, also the storage directory name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Customer => "dim_customer",
            Self::Restaurant => "dim_restaurant",
            Self::Date => "dim_date",
            Self::Location => "dim_location",
            Self::TimeSlot => "dim_timeslot",
            Self::DeliveryPerson => "dim_deliveryperson",
            Self::FactOrders => "fact_orders",
        }
    }

    /// Column names in positional insert order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Customer => &["customer_id", "customer_name", "segment", "registration_date"],
            Self::Restaurant => &["restaurant_id", "restaurant_name", "cuisine_type", "rating_avg"],
            Self::Date => &[
                "date_id",
                "full_date",
                "day_of_week",
                "month_name",
                "quarter",
                "year",
            ],
            Self::Location => &["location_id", "neighborhood", "postal_code", "city", "region"],
            Self::TimeSlot => &["time_slot_id", "slot_name", "start_time", "end_time"],
            Self::DeliveryPerson => &[
                "delivery_person_id",
                "delivery_person_name",
                "operation_zone",
                "tenure_months",
            ],
            Self::FactOrders => &[
                "order_id",
                "customer_id",
                "restaurant_id",
                "delivery_person_id",
                "date_id",
                "location_id",
                "time_slot_id",
                "order_date",
                "order_time",
                "order_cost",
                "rating",
                "food_preparation_time",
                "delivery_time",
                "total_time",
            ],
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns().len()
    }

    /// Primary key column (always the first column).
    pub fn key_column(&self) -> &'static str {
        self.columns()[0]
    }

    /// Foreign keys declared by this table.
    pub fn foreign_keys(&self) -> &'static [ForeignKey] {
        const FACT_KEYS: [ForeignKey; 6] = [
            ForeignKey { column: "customer_id", references: Table::Customer },
            ForeignKey { column: "restaurant_id", references: Table::Restaurant },
            ForeignKey { column: "delivery_person_id", references: Table::DeliveryPerson },
            ForeignKey { column: "date_id", references: Table::Date },
            ForeignKey { column: "location_id", references: Table::Location },
            ForeignKey { column: "time_slot_id", references: Table::TimeSlot },
        ];
        match self {
            Self::FactOrders => &FACT_KEYS,
            _ => &[],
        }
    }

    /// Position of a column, if the table has it.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns().iter().position(|c| *c == column)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static path table: one storage directory per table under a base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    base: PathBuf,
}

impl StorageLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Directory holding a table's partition files.
    pub fn table_dir(&self, table: Table) -> PathBuf {
        self.base.join(table.name())
    }
}
