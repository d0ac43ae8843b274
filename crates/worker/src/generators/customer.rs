//! Customer dimension.

use async_trait::async_trait;
use chrono::Days;
use etl_core::{CustomerDim, Error, Result, Segment};
use rand::Rng;

use crate::job::{Generator, MapContext, SourceAccess};

/// Registration dates fall within this many days before today.
pub const REGISTRATION_WINDOW_DAYS: u64 = 730;

/// One row per distinct source customer. The segment is derived from the
/// id; the registration date is random.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerGenerator;

#[async_trait]
impl Generator for CustomerGenerator {
    type Input = i64;
    type Record = CustomerDim;

    fn name(&self) -> &'static str {
        "dim_customer"
    }

    fn source_access(&self) -> SourceAccess {
        SourceAccess::Input
    }

    async fn read_input(&self, ctx: &mut MapContext) -> Result<Vec<i64>> {
        ctx.source()?.customer_ids().await
    }

    async fn map(&self, customer_id: i64, ctx: &mut MapContext) -> Result<Vec<CustomerDim>> {
        let offset = ctx.rng().random_range(0..=REGISTRATION_WINDOW_DAYS);
        let registration_date = ctx
            .today()
            .checked_sub_days(Days::new(offset))
            .ok_or_else(|| Error::internal("registration date out of range"))?;

        Ok(vec![CustomerDim {
            customer_id,
            name: format!("Customer {}", customer_id),
            segment: Segment::for_customer(customer_id),
            registration_date,
        }])
    }
}
