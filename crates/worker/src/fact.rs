//! Order fact generator.
//!
//! Customer and restaurant ids pass through from the source order. The
//! location and delivery person keys are drawn at random from the id
//! ranges the synthetic dimensions emit, so they are guaranteed in range
//! but do not identify a particular dimension row. `date_id` is derived
//! from the order id rather than looked up in the calendar dimension.

use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use etl_core::{Error, FactOrder, Result, SourceOrder};
use rand::Rng;
use tracing::warn;

use crate::generators::delivery_person::DELIVERY_PERSON_COUNT;
use crate::generators::location::LOCATION_COUNT;
use crate::generators::weekday_from_name;
use crate::job::{Generator, MapContext, SourceAccess};

/// Orders are dated up to this many days back, before weekday alignment.
pub const ORDER_WINDOW_DAYS: u64 = 60;

/// Days cycled through by the derived `date_id`.
pub const DATE_ID_CYCLE: i64 = 365;

/// First and last order hour (inclusive).
pub const FIRST_ORDER_HOUR: u32 = 10;
pub const LAST_ORDER_HOUR: u32 = 21;

/// Derived date key: `order_id mod 365 + 1`.
pub fn date_id_for(order_id: i64) -> u32 {
    (order_id.rem_euclid(DATE_ID_CYCLE) + 1) as u32
}

/// Time slot key for an order hour.
pub fn time_slot_for(hour: u32) -> u32 {
    hour / 2 + 1
}

/// Steps back from `start` until the weekday matches.
pub fn align_to_weekday(start: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let back = u64::from(
        (start.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7,
    );
    start.checked_sub_days(Days::new(back))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FactGenerator;

#[async_trait]
impl Generator for FactGenerator {
    type Input = SourceOrder;
    type Record = FactOrder;

    fn name(&self) -> &'static str {
        "fact_orders"
    }

    fn source_access(&self) -> SourceAccess {
        SourceAccess::Input
    }

    async fn read_input(&self, ctx: &mut MapContext) -> Result<Vec<SourceOrder>> {
        ctx.source()?.orders().await
    }

    async fn map(&self, order: SourceOrder, ctx: &mut MapContext) -> Result<Vec<FactOrder>> {
        let weekday = match weekday_from_name(&order.day_name) {
            Some(day) => day,
            None => {
                if ctx.first_sighting(&order.day_name) {
                    warn!(
                        task = ctx.task_id(),
                        day_name = %order.day_name,
                        "Unknown day name, dating orders on Monday"
                    );
                }
                Weekday::Mon
            }
        };

        let today = ctx.today();
        let rng = ctx.rng();

        let location_id = rng.random_range(1..=LOCATION_COUNT);
        let delivery_person_id = rng.random_range(1..=DELIVERY_PERSON_COUNT);

        let order_date = today
            .checked_sub_days(Days::new(rng.random_range(0..ORDER_WINDOW_DAYS)))
            .and_then(|day| align_to_weekday(day, weekday))
            .ok_or_else(|| Error::internal("order date out of range"))?;

        let hour = rng.random_range(FIRST_ORDER_HOUR..=LAST_ORDER_HOUR);
        let order_time = NaiveTime::from_hms_opt(hour, rng.random_range(0..60), rng.random_range(0..60))
            .ok_or_else(|| Error::internal("order time out of range"))?;

        Ok(vec![FactOrder {
            order_id: order.order_id,
            customer_id: order.customer_id,
            restaurant_id: order.restaurant_id,
            delivery_person_id,
            date_id: date_id_for(order.order_id),
            location_id,
            time_slot_id: time_slot_for(hour),
            order_date,
            order_time,
            order_cost: order.cost,
            rating: order.rating,
            prep_time: order.prep_time,
            delivery_time: order.delivery_time,
        }])
    }
}
