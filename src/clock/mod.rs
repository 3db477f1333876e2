//! The attendance time-computation engine: time-of-day arithmetic, the
//! duration/overtime calculator, schedule resolution, and the per-day
//! record manager the clock handlers drive.

pub mod day_record;
pub mod durations;
pub mod resolver;
pub mod time_of_day;
