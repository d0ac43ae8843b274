//! Dimension generators.
//!
//! Each generator owns one dimension table. Customer, Restaurant, and Date
//! read from the source database; Location, TimeSlot, and DeliveryPerson
//! are purely synthetic.

pub mod customer;
pub mod date;
pub mod delivery_person;
pub mod location;
pub mod restaurant;
pub mod timeslot;

pub use customer::CustomerGenerator;
pub use date::DateGenerator;
pub use delivery_person::DeliveryPersonGenerator;
pub use location::LocationGenerator;
pub use restaurant::RestaurantGenerator;
pub use timeslot::TimeSlotGenerator;

use chrono::Weekday;
use rand::rngs::SmallRng;
use rand::Rng;

/// Parses an English weekday name, ignoring case.
pub fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name.trim().to_ascii_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Uniform pick from a non-empty pool.
pub(crate) fn pick<'a>(rng: &mut SmallRng, pool: &[&'a str]) -> &'a str {
    pool[rng.random_range(0..pool.len())]
}
