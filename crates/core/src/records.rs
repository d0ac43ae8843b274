//! Typed warehouse records.
//!
//! Each record knows its table and renders its fields in column order;
//! `RecordCodec` turns those fields into a partition line.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::codec::RecordCodec;
use crate::table::Table;

/// Date format used in every partition file.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time format used in every partition file.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// A row destined for one warehouse table.
pub trait WarehouseRecord {
    const TABLE: Table;

    /// Field values in the table's column order.
    fn fields(&self) -> Vec<String>;

    /// The encoded partition line.
    fn encode(&self) -> String {
        RecordCodec::encode(&self.fields())
    }
}

/// Customer segment, derived from the customer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    Basic,
    Regular,
    Premium,
}

impl Segment {
    /// Multiples of 3 are Premium, other even ids Regular, the rest Basic.
    pub fn for_customer(customer_id: i64) -> Self {
        if customer_id % 3 == 0 {
            Self::Premium
        } else if customer_id % 2 == 0 {
            Self::Regular
        } else {
            Self::Basic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Regular => "Regular",
            Self::Premium => "Premium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDim {
    pub customer_id: i64,
    pub name: String,
    pub segment: Segment,
    pub registration_date: NaiveDate,
}

impl WarehouseRecord for CustomerDim {
    const TABLE: Table = Table::Customer;

    fn fields(&self) -> Vec<String> {
        vec![
            self.customer_id.to_string(),
            self.name.clone(),
            self.segment.as_str().to_string(),
            self.registration_date.format(DATE_FORMAT).to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantDim {
    pub restaurant_id: i64,
    pub name: String,
    pub cuisine_type: String,
    /// Mean of rated orders, 0.0 when none are rated.
    pub avg_rating: f64,
}

impl WarehouseRecord for RestaurantDim {
    const TABLE: Table = Table::Restaurant;

    fn fields(&self) -> Vec<String> {
        vec![
            self.restaurant_id.to_string(),
            self.name.clone(),
            self.cuisine_type.clone(),
            format!("{:.2}", self.avg_rating),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateDim {
    pub date_id: u32,
    pub calendar_date: NaiveDate,
    pub day_of_week: String,
    pub month_name: String,
    pub quarter: u32,
    pub year: i32,
}

impl WarehouseRecord for DateDim {
    const TABLE: Table = Table::Date;

    fn fields(&self) -> Vec<String> {
        vec![
            self.date_id.to_string(),
            self.calendar_date.format(DATE_FORMAT).to_string(),
            self.day_of_week.clone(),
            self.month_name.clone(),
            self.quarter.to_string(),
            self.year.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDim {
    pub location_id: u32,
    pub neighborhood: String,
    pub postal_code: String,
    pub city: String,
    pub region: String,
}

impl WarehouseRecord for LocationDim {
    const TABLE: Table = Table::Location;

    fn fields(&self) -> Vec<String> {
        vec![
            self.location_id.to_string(),
            self.neighborhood.clone(),
            self.postal_code.clone(),
            self.city.clone(),
            self.region.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotDim {
    pub time_slot_id: u32,
    pub slot_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl WarehouseRecord for TimeSlotDim {
    const TABLE: Table = Table::TimeSlot;

    fn fields(&self) -> Vec<String> {
        vec![
            self.time_slot_id.to_string(),
            self.slot_name.clone(),
            self.start_time.format(TIME_FORMAT).to_string(),
            self.end_time.format(TIME_FORMAT).to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPersonDim {
    pub delivery_person_id: u32,
    pub name: String,
    pub operation_zone: String,
    pub tenure_months: u32,
}

impl WarehouseRecord for DeliveryPersonDim {
    const TABLE: Table = Table::DeliveryPerson;

    fn fields(&self) -> Vec<String> {
        vec![
            self.delivery_person_id.to_string(),
            self.name.clone(),
            self.operation_zone.clone(),
            self.tenure_months.to_string(),
        ]
    }
}

/// One delivered order with every dimension key resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactOrder {
    pub order_id: i64,
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub delivery_person_id: u32,
    pub date_id: u32,
    pub location_id: u32,
    pub time_slot_id: u32,
    pub order_date: NaiveDate,
    pub order_time: NaiveTime,
    pub order_cost: f64,
    pub rating: Option<i64>,
    pub prep_time: i64,
    pub delivery_time: i64,
}

impl FactOrder {
    /// Always derived, never sourced.
    pub fn total_time(&self) -> i64 {
        self.prep_time + self.delivery_time
    }
}

impl WarehouseRecord for FactOrder {
    const TABLE: Table = Table::FactOrders;

    fn fields(&self) -> Vec<String> {
        vec![
            self.order_id.to_string(),
            self.customer_id.to_string(),
            self.restaurant_id.to_string(),
            self.delivery_person_id.to_string(),
            self.date_id.to_string(),
            self.location_id.to_string(),
            self.time_slot_id.to_string(),
            self.order_date.format(DATE_FORMAT).to_string(),
            self.order_time.format(TIME_FORMAT).to_string(),
            format!("{:.2}", self.order_cost),
            RecordCodec::nullable(self.rating),
            self.prep_time.to_string(),
            self.delivery_time.to_string(),
            self.total_time().to_string(),
        ]
    }
}
