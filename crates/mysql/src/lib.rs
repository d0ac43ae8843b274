//! MySQL source and warehouse stores for the star-schema ETL.

pub mod client;
pub mod config;
pub mod health;
pub mod query;
pub mod schema;
pub mod source;
pub mod store;
pub mod warehouse;

pub use client::*;
pub use config::*;
pub use source::MySqlSource;
pub use store::*;
pub use warehouse::MySqlWarehouse;
