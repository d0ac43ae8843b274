//! Location dimension (synthetic).

use async_trait::async_trait;
use etl_core::{LocationDim, Result};
use rand::Rng;

use super::pick;
use crate::job::{Generator, MapContext, SourceAccess};

/// Number of synthesized locations; fact rows draw ids from `1..=LOCATION_COUNT`.
pub const LOCATION_COUNT: u32 = 50;

pub const NEIGHBORHOODS: [&str; 10] = [
    "Downtown",
    "Uptown",
    "West End",
    "East Side",
    "North Hills",
    "South Park",
    "Riverside",
    "Central District",
    "Harbor View",
    "Lake City",
];

pub const CITIES: [&str; 10] = [
    "New York",
    "Los Angeles",
    "Chicago",
    "Houston",
    "Phoenix",
    "Philadelphia",
    "San Antonio",
    "San Diego",
    "Dallas",
    "San Jose",
];

pub const REGIONS: [&str; 5] = ["Northeast", "Southeast", "Midwest", "Southwest", "West"];

#[derive(Debug, Clone, Copy, Default)]
pub struct LocationGenerator;

#[async_trait]
impl Generator for LocationGenerator {
    type Input = u32;
    type Record = LocationDim;

    fn name(&self) -> &'static str {
        "dim_location"
    }

    fn source_access(&self) -> SourceAccess {
        SourceAccess::None
    }

    async fn read_input(&self, _ctx: &mut MapContext) -> Result<Vec<u32>> {
        Ok((1..=LOCATION_COUNT).collect())
    }

    async fn map(&self, location_id: u32, ctx: &mut MapContext) -> Result<Vec<LocationDim>> {
        let rng = ctx.rng();
        let neighborhood = pick(rng, &NEIGHBORHOODS).to_string();
        let postal_code = format!("{:05}", 10000 + rng.random_range(0..90000u32));
        let city = pick(rng, &CITIES).to_string();
        let region = pick(rng, &REGIONS).to_string();

        Ok(vec![LocationDim {
            location_id,
            neighborhood,
            postal_code,
            city,
            region,
        }])
    }
}
