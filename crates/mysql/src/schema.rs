//! Warehouse table schemas.
//!
//! Every statement is `IF NOT EXISTS`, so creating the schema on a
//! warehouse that already has it is a no-op. The fact table declares a
//! foreign key to each dimension and must be created last.

use etl_core::Table;

/// SQL for creating the customer dimension.
pub const CREATE_DIM_CUSTOMER: &str = r#"
CREATE TABLE IF NOT EXISTS dim_customer (
    customer_id INT PRIMARY KEY,
    customer_name VARCHAR(255),
    segment VARCHAR(50),
    registration_date DATE
)
"#;

/// SQL for creating the restaurant dimension.
pub const CREATE_DIM_RESTAURANT: &str = r#"
CREATE TABLE IF NOT EXISTS dim_restaurant (
    restaurant_id INT PRIMARY KEY,
    restaurant_name VARCHAR(255),
    cuisine_type VARCHAR(100),
    rating_avg DECIMAL(3,2)
)
"#;

/// SQL for creating the calendar dimension.
pub const CREATE_DIM_DATE: &str = r#"
CREATE TABLE IF NOT EXISTS dim_date (
    date_id INT PRIMARY KEY,
    full_date DATE,
    day_of_week VARCHAR(20),
    month_name VARCHAR(20),
    quarter INT,
    year INT
)
"#;

/// SQL for creating the location dimension.
pub const CREATE_DIM_LOCATION: &str = r#"
CREATE TABLE IF NOT EXISTS dim_location (
    location_id INT PRIMARY KEY,
    neighborhood VARCHAR(100),
    postal_code VARCHAR(20),
    city VARCHAR(100),
    region VARCHAR(100)
)
"#;

/// SQL for creating the half-hour time slot dimension.
pub const CREATE_DIM_TIMESLOT: &str = r#"
CREATE TABLE IF NOT EXISTS dim_timeslot (
    time_slot_id INT PRIMARY KEY,
    slot_name VARCHAR(50),
    start_time TIME,
    end_time TIME
)
"#;

/// SQL for creating the delivery person dimension.
pub const CREATE_DIM_DELIVERYPERSON: &str = r#"
CREATE TABLE IF NOT EXISTS dim_deliveryperson (
    delivery_person_id INT PRIMARY KEY,
    delivery_person_name VARCHAR(255),
    operation_zone VARCHAR(100),
    tenure_months INT
)
"#;

/// SQL for creating the order fact table.
pub const CREATE_FACT_ORDERS: &str = r#"
CREATE TABLE IF NOT EXISTS fact_orders (
    order_id INT,
    customer_id INT,
    restaurant_id INT,
    delivery_person_id INT,
    date_id INT,
    location_id INT,
    time_slot_id INT,
    order_date DATE,
    order_time TIME,
    order_cost DECIMAL(10,2),
    rating INT,
    food_preparation_time INT,
    delivery_time INT,
    total_time INT,
    PRIMARY KEY (order_id),
    FOREIGN KEY (customer_id) REFERENCES dim_customer(customer_id),
    FOREIGN KEY (restaurant_id) REFERENCES dim_restaurant(restaurant_id),
    FOREIGN KEY (delivery_person_id) REFERENCES dim_deliveryperson(delivery_person_id),
    FOREIGN KEY (date_id) REFERENCES dim_date(date_id),
    FOREIGN KEY (location_id) REFERENCES dim_location(location_id),
    FOREIGN KEY (time_slot_id) REFERENCES dim_timeslot(time_slot_id)
)
"#;

/// DDL for one table.
pub fn ddl_for(table: Table) -> &'static str {
    match table {
        Table::Customer => CREATE_DIM_CUSTOMER,
        Table::Restaurant => CREATE_DIM_RESTAURANT,
        Table::Date => CREATE_DIM_DATE,
        Table::Location => CREATE_DIM_LOCATION,
        Table::TimeSlot => CREATE_DIM_TIMESLOT,
        Table::DeliveryPerson => CREATE_DIM_DELIVERYPERSON,
        Table::FactOrders => CREATE_FACT_ORDERS,
    }
}

/// All DDL statements in creation order.
pub fn all_tables() -> Vec<&'static str> {
    Table::ALL.into_iter().map(ddl_for).collect()
}

/// Positional insert with one placeholder per column.
pub fn insert_sql(table: Table) -> String {
    let placeholders = vec!["?"; table.column_count()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        table.columns().join(", "),
        placeholders
    )
}
