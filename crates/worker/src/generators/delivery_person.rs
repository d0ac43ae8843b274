//! Delivery person dimension (synthetic).

use async_trait::async_trait;
use etl_core::{DeliveryPersonDim, Result};
use rand::Rng;

use super::pick;
use crate::job::{Generator, MapContext, SourceAccess};

/// Number of synthesized couriers; fact rows draw ids from `1..=DELIVERY_PERSON_COUNT`.
pub const DELIVERY_PERSON_COUNT: u32 = 30;

pub const FIRST_NAMES: [&str; 16] = [
    "James", "Mary", "John", "Patricia", "Robert", "Jennifer", "Michael", "Linda", "William",
    "Elizabeth", "David", "Barbara", "Richard", "Susan", "Joseph", "Jessica",
];

pub const LAST_NAMES: [&str; 16] = [
    "Smith", "Johnson", "Williams", "Jones", "Brown", "Davis", "Miller", "Wilson", "Moore",
    "Taylor", "Anderson", "Thomas", "Jackson", "White", "Harris", "Martin",
];

pub const OPERATION_ZONES: [&str; 10] = [
    "North Zone",
    "South Zone",
    "East Zone",
    "West Zone",
    "Central Zone",
    "Northwest",
    "Northeast",
    "Southwest",
    "Southeast",
    "Downtown",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DeliveryPersonGenerator;

#[async_trait]
impl Generator for DeliveryPersonGenerator {
    type Input = u32;
    type Record = DeliveryPersonDim;

    fn name(&self) -> &'static str {
        "dim_deliveryperson"
    }

    fn source_access(&self) -> SourceAccess {
        SourceAccess::None
    }

    async fn read_input(&self, _ctx: &mut MapContext) -> Result<Vec<u32>> {
        Ok((1..=DELIVERY_PERSON_COUNT).collect())
    }

    async fn map(
        &self,
        delivery_person_id: u32,
        ctx: &mut MapContext,
    ) -> Result<Vec<DeliveryPersonDim>> {
        let rng = ctx.rng();
        let name = format!("{} {}", pick(rng, &FIRST_NAMES), pick(rng, &LAST_NAMES));
        let operation_zone = pick(rng, &OPERATION_ZONES).to_string();
        let tenure_months = rng.random_range(1..=60);

        Ok(vec![DeliveryPersonDim {
            delivery_person_id,
            name,
            operation_zone,
            tenure_months,
        }])
    }
}
