//! Calendar dimension.
//!
//! One row per day in `[today - 6 months, today + 6 months)`, ids from 1
//! in day order. The range is 365 or 366 days depending on leap years.

use async_trait::async_trait;
use chrono::{Datelike, Months, NaiveDate};
use etl_core::{DateDim, Error, Result};
use tracing::{debug, warn};

use super::weekday_from_name;
use crate::job::{Generator, MapContext, SourceAccess};

const HALF_RANGE: Months = Months::new(6);

#[derive(Debug, Clone, Copy, Default)]
pub struct DateGenerator;

/// The calendar range centered on `today`, numbered from 1.
pub fn calendar_range(today: NaiveDate) -> Result<Vec<(u32, NaiveDate)>> {
    let start = today
        .checked_sub_months(HALF_RANGE)
        .ok_or_else(|| Error::internal("date range start out of bounds"))?;
    let end = today
        .checked_add_months(HALF_RANGE)
        .ok_or_else(|| Error::internal("date range end out of bounds"))?;

    Ok(start
        .iter_days()
        .take_while(|day| *day < end)
        .zip(1u32..)
        .map(|(day, id)| (id, day))
        .collect())
}

/// Calendar quarter of a month in 1..=12.
pub fn quarter_of(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

#[async_trait]
impl Generator for DateGenerator {
    type Input = (u32, NaiveDate);
    type Record = DateDim;

    fn name(&self) -> &'static str {
        "dim_date"
    }

    fn source_access(&self) -> SourceAccess {
        SourceAccess::Input
    }

    async fn read_input(&self, ctx: &mut MapContext) -> Result<Vec<(u32, NaiveDate)>> {
        // The lookup is only checked; the calendar does not depend on it.
        let days = ctx.source()?.days().await?;
        for day in &days {
            if weekday_from_name(&day.day_name).is_none() {
                warn!(day_id = day.day_id, day_name = %day.day_name, "Unrecognised day name in lookup");
            }
        }
        debug!(lookup = days.len(), "Read day lookup");

        calendar_range(ctx.today())
    }

    async fn map(&self, input: (u32, NaiveDate), _ctx: &mut MapContext) -> Result<Vec<DateDim>> {
        let (date_id, day) = input;
        Ok(vec![DateDim {
            date_id,
            calendar_date: day,
            day_of_week: day.format("%A").to_string(),
            month_name: day.format("%B").to_string(),
            quarter: quarter_of(day.month()),
            year: day.year(),
        }])
    }
}
