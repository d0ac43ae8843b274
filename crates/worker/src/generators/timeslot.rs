//! Half-hour time slot dimension (synthetic).

use async_trait::async_trait;
use chrono::{Duration, NaiveTime, Timelike};
use etl_core::{Error, Result, TimeSlotDim};

use crate::job::{Generator, MapContext, SourceAccess};

/// Slots per day.
pub const SLOT_COUNT: u32 = 48;

/// Slot name for a starting hour.
pub fn slot_name(hour: u32) -> &'static str {
    match hour {
        0..=5 => "Early Morning",
        6..=10 => "Morning",
        11..=13 => "Lunch",
        14..=16 => "Afternoon",
        17..=19 => "Evening",
        _ => "Night",
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSlotGenerator;

#[async_trait]
impl Generator for TimeSlotGenerator {
    type Input = u32;
    type Record = TimeSlotDim;

    fn name(&self) -> &'static str {
        "dim_timeslot"
    }

    fn source_access(&self) -> SourceAccess {
        SourceAccess::None
    }

    async fn read_input(&self, _ctx: &mut MapContext) -> Result<Vec<u32>> {
        Ok((1..=SLOT_COUNT).collect())
    }

    async fn map(&self, time_slot_id: u32, _ctx: &mut MapContext) -> Result<Vec<TimeSlotDim>> {
        let index = time_slot_id - 1;
        let start_time = NaiveTime::from_hms_opt(index / 2, (index % 2) * 30, 0)
            .ok_or_else(|| Error::internal(format!("time slot {} out of range", time_slot_id)))?;
        // Wraps to 00:00:00 after the last slot.
        let end_time = start_time + Duration::minutes(30);

        Ok(vec![TimeSlotDim {
            time_slot_id,
            slot_name: slot_name(start_time.hour()).to_string(),
            start_time,
            end_time,
        }])
    }
}
